// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel encoding.
//!
//! Turns a [`NormalizedState`] into the raw bytes of one fixture, channel by
//! channel in wire order. Every stage clamps, so encoding cannot fail and
//! always yields exactly [`FixtureTypeDef::footprint`] bytes.
//!
//! For each non-constant channel:
//!
//! 1. the source scalar is read from the state as a fraction in [0, 1]
//!    (brightness is 0 while the light is off, kelvin is taken relative to
//!    the type's range);
//! 2. the correction polynomial, if any, is applied and the result clamped
//!    back into [0, 1];
//! 3. the fraction is scaled over `[0, max - offset]`, rounded half to even,
//!    and the offset added. Hue scales over one extra step and wraps, since
//!    360 degrees is 0 degrees;
//! 4. the raw value is written as one or two bytes.
//!
//! Constant channels write their value directly.

use crate::fixture::{ByteWidth, ChannelDef, ChannelKind, CorrectionDomain, FixtureTypeDef};
use crate::types::{HUE_DEGREES, NormalizedState};

/// Raw value of one channel, before it is split into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelValue {
    raw: u16,
    width: ByteWidth,
}

impl ChannelValue {
    /// Returns the raw value.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.raw
    }

    /// Returns the channel width.
    #[must_use]
    pub const fn width(&self) -> ByteWidth {
        self.width
    }

    /// Appends the value's bytes to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.width.write(self.raw, out);
    }
}

/// Encodes a state into one [`ChannelValue`] per channel descriptor.
#[must_use]
pub fn encode_values(state: &NormalizedState, fixture_type: &FixtureTypeDef) -> Vec<ChannelValue> {
    fixture_type
        .channels()
        .iter()
        .map(|channel| ChannelValue {
            raw: encode_channel(channel, state, fixture_type),
            width: channel.width(),
        })
        .collect()
}

/// Encodes a state into the fixture's raw bytes, in wire order.
///
/// # Examples
///
/// ```
/// use dmx_fader::{ColorState, encode};
/// use dmx_fader::fixture::{ChannelDef, ChannelKind, Endianness, FixtureTypeDef};
///
/// let fixture_type = FixtureTypeDef::new(
///     "dimmer",
///     2000,
///     6500,
///     vec![
///         ChannelDef::new(ChannelKind::Brightness).two_bytes(Endianness::Big),
///         ChannelDef::constant(9),
///     ],
/// )
/// .unwrap();
///
/// let state = ColorState::on(0.7, 0.0, 0.0, 4000).clamped();
/// assert_eq!(encode(&state, &fixture_type), vec![179, 50, 9]);
/// ```
#[must_use]
pub fn encode(state: &NormalizedState, fixture_type: &FixtureTypeDef) -> Vec<u8> {
    let mut out = Vec::with_capacity(fixture_type.footprint());
    encode_into(state, fixture_type, &mut out);
    out
}

/// Appends the fixture's raw bytes to `out`.
pub fn encode_into(state: &NormalizedState, fixture_type: &FixtureTypeDef, out: &mut Vec<u8>) {
    for value in encode_values(state, fixture_type) {
        value.write(out);
    }
}

/// Source scalar of a channel: the fraction in [0, 1], plus the value and
/// bounds in the channel's natural unit for native corrections.
struct Source {
    fraction: f64,
    native: f64,
    native_min: f64,
    native_max: f64,
}

impl Source {
    fn percent(fraction: f64) -> Self {
        Self {
            fraction,
            native: fraction * 100.0,
            native_min: 0.0,
            native_max: 100.0,
        }
    }
}

fn encode_channel(channel: &ChannelDef, state: &NormalizedState, fixture_type: &FixtureTypeDef) -> u16 {
    let source = match channel.kind() {
        ChannelKind::Constant(value) => return value,
        ChannelKind::Brightness if !state.is_on() => {
            // off is black whatever the correction curve says
            return scale(0.0, channel, false);
        }
        ChannelKind::Brightness => Source::percent(state.output_brightness()),
        ChannelKind::Saturation => Source::percent(state.saturation()),
        ChannelKind::Hue => Source {
            fraction: state.hue() / HUE_DEGREES,
            native: state.hue(),
            native_min: 0.0,
            native_max: HUE_DEGREES,
        },
        ChannelKind::ColorTempKelvin => {
            let kelvin = fixture_type.clamp_kelvin(state.color_temp_kelvin());
            Source {
                fraction: fixture_type.kelvin_fraction(kelvin),
                native: f64::from(kelvin),
                native_min: f64::from(fixture_type.min_color_temp_kelvin()),
                native_max: f64::from(fixture_type.max_color_temp_kelvin()),
            }
        }
    };

    let fraction = match channel.correction() {
        None => clamp_unit(source.fraction),
        Some(polynomial) => match polynomial.domain() {
            CorrectionDomain::Normalized => clamp_unit(polynomial.evaluate(clamp_unit(source.fraction))),
            CorrectionDomain::Native => {
                let corrected = polynomial
                    .evaluate(source.native)
                    .clamp(source.native_min, source.native_max);
                clamp_unit((corrected - source.native_min) / (source.native_max - source.native_min))
            }
        },
    };

    scale(fraction, channel, matches!(channel.kind(), ChannelKind::Hue))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(fraction: f64, channel: &ChannelDef, wraps: bool) -> u16 {
    let max = f64::from(channel.width().max_raw());
    let offset = f64::from(channel.offset());
    let span = if wraps { max - offset + 1.0 } else { max - offset };

    let raw = (fraction * span).round_ties_even() + offset;
    if wraps && raw > max {
        return channel.offset();
    }
    raw.clamp(0.0, max) as u16
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
