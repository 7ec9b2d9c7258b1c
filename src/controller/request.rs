// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light requests and how they resolve into a target state.

use crate::config::Tunables;
use crate::types::ColorState;

/// Fields of a turn-on request. Every field is optional.
///
/// # Examples
///
/// ```
/// use dmx_fader::TurnOn;
///
/// let request = TurnOn::new()
///     .brightness(0.6)
///     .hs_color(40.0, 0.79)
///     .transition(2.0);
/// assert!(!request.is_bare());
/// assert!(TurnOn::new().transition(1.0).is_bare());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnOn {
    brightness: Option<f64>,
    hs_color: Option<(f64, f64)>,
    color_temp_kelvin: Option<u32>,
    white: bool,
    transition: Option<f64>,
}

impl TurnOn {
    /// Creates an empty request.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            brightness: None,
            hs_color: None,
            color_temp_kelvin: None,
            white: false,
            transition: None,
        }
    }

    /// Sets the brightness, in [0, 1].
    #[must_use]
    pub const fn brightness(mut self, brightness: f64) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets hue in degrees and saturation in [0, 1].
    #[must_use]
    pub const fn hs_color(mut self, hue: f64, saturation: f64) -> Self {
        self.hs_color = Some((hue, saturation));
        self
    }

    /// Sets the color temperature.
    #[must_use]
    pub const fn color_temp_kelvin(mut self, kelvin: u32) -> Self {
        self.color_temp_kelvin = Some(kelvin);
        self
    }

    /// Switches to white, dropping saturation to 0.
    #[must_use]
    pub const fn white(mut self) -> Self {
        self.white = true;
        self
    }

    /// Sets the transition duration in seconds.
    #[must_use]
    pub const fn transition(mut self, secs: f64) -> Self {
        self.transition = Some(secs);
        self
    }

    /// Returns true if the request names no color field.
    ///
    /// A transition alone still counts as bare.
    #[must_use]
    pub const fn is_bare(&self) -> bool {
        self.brightness.is_none()
            && self.hs_color.is_none()
            && self.color_temp_kelvin.is_none()
            && !self.white
    }
}

/// A request addressed to one fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightRequest {
    /// Turn the light on, optionally changing its color.
    TurnOn(TurnOn),
    /// Turn the light off, keeping its color for the next turn-on.
    TurnOff {
        /// Transition in seconds; the default transition when `None`.
        transition: Option<f64>,
    },
    /// Fade to an explicit state.
    Set {
        /// The state to reach.
        target: ColorState,
        /// Transition in seconds; the default transition when `None`.
        transition: Option<f64>,
    },
}

impl From<TurnOn> for LightRequest {
    fn from(request: TurnOn) -> Self {
        Self::TurnOn(request)
    }
}

/// Target state and transition a request resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    /// The state to fade to.
    pub target: ColorState,
    /// The transition in seconds.
    pub transition_secs: f64,
}

/// Resolves `request` against the state the light currently shows.
#[must_use]
pub fn resolve_request(
    request: &LightRequest,
    current: &ColorState,
    tunables: &Tunables,
) -> Resolved {
    match request {
        LightRequest::TurnOn(turn_on) => Resolved {
            target: resolve_turn_on(turn_on, current, tunables),
            transition_secs: turn_on.transition.unwrap_or(tunables.default_transition_secs),
        },
        LightRequest::TurnOff { transition } => Resolved {
            target: current.turned_off(),
            transition_secs: transition.unwrap_or(tunables.default_transition_secs),
        },
        LightRequest::Set { target, transition } => Resolved {
            target: *target,
            transition_secs: transition.unwrap_or(tunables.default_transition_secs),
        },
    }
}

fn resolve_turn_on(request: &TurnOn, current: &ColorState, tunables: &Tunables) -> ColorState {
    let was_off = current.visible_brightness() <= 0.0;

    if request.is_bare() {
        // resume the stored color
        let target = current.with_on(true);
        return if target.brightness() <= 0.0 {
            target.with_brightness(1.0)
        } else {
            target
        };
    }

    let mut target = current.with_on(true);

    target = match request.brightness {
        Some(brightness) => target.with_brightness(brightness),
        None if was_off => target.with_brightness(1.0),
        None => target,
    };

    if request.white {
        target = target.with_saturation(0.0);
    } else if let Some((hue, saturation)) = request.hs_color {
        target = target.with_hue(hue).with_saturation(saturation);
    }

    target = match request.color_temp_kelvin {
        Some(kelvin) => target.with_color_temp_kelvin(kelvin),
        None if was_off => target.with_color_temp_kelvin(tunables.default_color_temp_kelvin),
        None => target,
    };

    // some fixtures show the hue change even at zero saturation
    if target.saturation() <= 0.0 {
        target = target.with_hue(current.hue());
    }

    target
}
