// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color state of a light and the pure conversions on it.
//!
//! [`ColorState`] is the abstract state a fixture is asked to show. It is a
//! plain value: every change produces a new state. Before encoding, a state
//! is turned into a [`NormalizedState`], either strictly through
//! [`normalize`] or leniently through [`ColorState::clamped`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Hue wraps at this many degrees.
pub const HUE_DEGREES: f64 = 360.0;

/// Abstract color state of a light.
///
/// - `brightness` in [0, 1]
/// - `hue` in degrees, [0, 360)
/// - `saturation` in [0, 1]
/// - `color_temp_kelvin` positive
/// - `is_on`
///
/// Turning a light off keeps its color fields so that it can resume the
/// same color when turned back on. Only the encoder maps an off state to a
/// zero brightness channel.
///
/// # Examples
///
/// ```
/// use dmx_fader::ColorState;
///
/// let amber = ColorState::on(0.7, 40.0, 0.79, 5500);
/// assert!(amber.is_on());
///
/// let off = amber.turned_off();
/// assert_eq!(off.hue(), 40.0);
/// assert_eq!(off.visible_brightness(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorState {
    brightness: f64,
    hue: f64,
    saturation: f64,
    color_temp_kelvin: u32,
    is_on: bool,
}

impl ColorState {
    /// Creates a state from raw field values.
    ///
    /// Values are stored as given; use [`normalize`] to check them.
    #[must_use]
    pub const fn new(
        brightness: f64,
        hue: f64,
        saturation: f64,
        color_temp_kelvin: u32,
        is_on: bool,
    ) -> Self {
        Self {
            brightness,
            hue,
            saturation,
            color_temp_kelvin,
            is_on,
        }
    }

    /// Creates a lit state.
    #[must_use]
    pub const fn on(brightness: f64, hue: f64, saturation: f64, color_temp_kelvin: u32) -> Self {
        Self::new(brightness, hue, saturation, color_temp_kelvin, true)
    }

    /// Creates a dark, unsaturated state at the given color temperature.
    #[must_use]
    pub const fn off(color_temp_kelvin: u32) -> Self {
        Self::new(0.0, 0.0, 0.0, color_temp_kelvin, false)
    }

    /// Returns the stored brightness (0-1), regardless of `is_on`.
    #[must_use]
    pub const fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Returns the hue in degrees.
    #[must_use]
    pub const fn hue(&self) -> f64 {
        self.hue
    }

    /// Returns the saturation (0-1).
    #[must_use]
    pub const fn saturation(&self) -> f64 {
        self.saturation
    }

    /// Returns the color temperature in kelvin.
    #[must_use]
    pub const fn color_temp_kelvin(&self) -> u32 {
        self.color_temp_kelvin
    }

    /// Returns whether the light is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns the brightness actually shown: zero while off.
    #[must_use]
    pub fn visible_brightness(&self) -> f64 {
        if self.is_on { self.brightness } else { 0.0 }
    }

    /// Returns a copy with a different brightness.
    #[must_use]
    pub const fn with_brightness(self, brightness: f64) -> Self {
        Self { brightness, ..self }
    }

    /// Returns a copy with a different hue.
    #[must_use]
    pub const fn with_hue(self, hue: f64) -> Self {
        Self { hue, ..self }
    }

    /// Returns a copy with a different saturation.
    #[must_use]
    pub const fn with_saturation(self, saturation: f64) -> Self {
        Self { saturation, ..self }
    }

    /// Returns a copy with a different color temperature.
    #[must_use]
    pub const fn with_color_temp_kelvin(self, color_temp_kelvin: u32) -> Self {
        Self {
            color_temp_kelvin,
            ..self
        }
    }

    /// Returns a copy with a different on/off flag.
    #[must_use]
    pub const fn with_on(self, is_on: bool) -> Self {
        Self { is_on, ..self }
    }

    /// Returns a copy that is off but remembers every color field.
    #[must_use]
    pub const fn turned_off(self) -> Self {
        self.with_on(false)
    }

    /// Returns this state with brightness replaced by the visible brightness.
    ///
    /// Fades run between visible states so that an off light fades up from
    /// black instead of from its remembered brightness.
    #[must_use]
    pub fn visible(self) -> Self {
        self.with_brightness(self.visible_brightness())
    }

    /// Normalizes the state, clamping every field into its domain.
    ///
    /// This never fails. `NaN` fields become 0, hue wraps into [0, 360) and
    /// a zero color temperature becomes 1 K.
    #[must_use]
    pub fn clamped(&self) -> NormalizedState {
        NormalizedState {
            brightness: clamp_unit(self.brightness),
            hue: wrap_hue(self.hue),
            saturation: clamp_unit(self.saturation),
            color_temp_kelvin: self.color_temp_kelvin.max(1),
            is_on: self.is_on,
        }
    }
}

impl Default for ColorState {
    fn default() -> Self {
        Self::off(crate::config::DEFAULT_COLOR_TEMP_KELVIN)
    }
}

impl fmt::Display for ColorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bright={:.3} hue={:.1} sat={:.3} ct={}K",
            if self.is_on { "on" } else { "off" },
            self.brightness,
            self.hue,
            self.saturation,
            self.color_temp_kelvin
        )
    }
}

/// A [`ColorState`] whose fields are known to lie inside their domains.
///
/// Hue is always in [0, 360), brightness and saturation in [0, 1], and the
/// color temperature is positive. This is the only input the encoder accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedState {
    brightness: f64,
    hue: f64,
    saturation: f64,
    color_temp_kelvin: u32,
    is_on: bool,
}

impl NormalizedState {
    /// Returns the stored brightness (0-1).
    #[must_use]
    pub const fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Returns the brightness to put on the wire: zero while off.
    #[must_use]
    pub fn output_brightness(&self) -> f64 {
        if self.is_on { self.brightness } else { 0.0 }
    }

    /// Returns the hue in degrees, in [0, 360).
    #[must_use]
    pub const fn hue(&self) -> f64 {
        self.hue
    }

    /// Returns the saturation (0-1).
    #[must_use]
    pub const fn saturation(&self) -> f64 {
        self.saturation
    }

    /// Returns the color temperature in kelvin.
    #[must_use]
    pub const fn color_temp_kelvin(&self) -> u32 {
        self.color_temp_kelvin
    }

    /// Returns whether the light is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.is_on
    }
}

impl From<NormalizedState> for ColorState {
    fn from(state: NormalizedState) -> Self {
        Self::new(
            state.brightness,
            state.hue,
            state.saturation,
            state.color_temp_kelvin,
            state.is_on,
        )
    }
}

/// Validates a state and returns its normalized form.
///
/// A hue of exactly 360 is accepted and wraps to 0.
///
/// # Errors
///
/// Returns a [`ValidationError`] if hue is outside [0, 360], saturation or
/// brightness outside [0, 1] (including `NaN`), or the color temperature is 0.
pub fn normalize(state: &ColorState) -> Result<NormalizedState, ValidationError> {
    if !(0.0..=HUE_DEGREES).contains(&state.hue) {
        return Err(ValidationError::InvalidHue(state.hue));
    }
    if !(0.0..=1.0).contains(&state.saturation) {
        return Err(ValidationError::InvalidSaturation(state.saturation));
    }
    if !(0.0..=1.0).contains(&state.brightness) {
        return Err(ValidationError::InvalidBrightness(state.brightness));
    }
    if state.color_temp_kelvin == 0 {
        return Err(ValidationError::InvalidColorTemp(state.color_temp_kelvin));
    }
    Ok(state.clamped())
}

/// Linearly interpolates between two states.
///
/// `t` is clamped to [0, 1]. At `t = 0` the result is `a` and at `t = 1` it
/// is `b`, bit for bit. In between, every numeric field moves linearly, hue
/// along the shorter arc, and the light counts as on if either end is on.
///
/// # Examples
///
/// ```
/// use dmx_fader::{ColorState, interpolate};
///
/// let a = ColorState::on(1.0, 350.0, 1.0, 4000);
/// let b = ColorState::on(1.0, 10.0, 1.0, 4000);
/// assert_eq!(interpolate(&a, &b, 0.5).hue(), 0.0);
/// ```
#[must_use]
pub fn interpolate(a: &ColorState, b: &ColorState, t: f64) -> ColorState {
    if t.is_nan() || t <= 0.0 {
        return *a;
    }
    if t >= 1.0 {
        return *b;
    }

    ColorState {
        brightness: lerp(a.brightness, b.brightness, t),
        hue: lerp_hue(a.hue, b.hue, t),
        saturation: lerp(a.saturation, b.saturation, t),
        color_temp_kelvin: lerp_kelvin(a.color_temp_kelvin, b.color_temp_kelvin, t),
        is_on: a.is_on || b.is_on,
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

fn lerp_hue(from: f64, to: f64, t: f64) -> f64 {
    let mut delta = to - from;
    if delta > HUE_DEGREES / 2.0 {
        delta -= HUE_DEGREES;
    } else if delta < -HUE_DEGREES / 2.0 {
        delta += HUE_DEGREES;
    }
    wrap_hue(from + delta * t)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp_kelvin(from: u32, to: u32, t: f64) -> u32 {
    lerp(f64::from(from), f64::from(to), t).round().max(0.0) as u32
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub(crate) fn wrap_hue(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(HUE_DEGREES);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= HUE_DEGREES { 0.0 } else { wrapped }
}
