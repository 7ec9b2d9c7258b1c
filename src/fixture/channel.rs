// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel descriptors.
//!
//! A [`ChannelDef`] describes how one color attribute maps onto one or two
//! consecutive DMX bytes. Channel descriptors are only ever built through a
//! [`FixtureTypeDef`](super::FixtureTypeDef), which validates them as a set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a channel carries.
///
/// The set is closed: configuration entries naming anything else fail to
/// load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Light output, 0 while the light is off.
    Brightness,
    /// Hue, mapped so that 360 degrees wraps back to the first raw value.
    Hue,
    /// Saturation.
    Saturation,
    /// White color temperature, scaled over the fixture type's kelvin range.
    ColorTempKelvin,
    /// A fixed raw value, written as is.
    Constant(u16),
}

impl ChannelKind {
    /// Returns the configuration name of this kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::ColorTempKelvin => "color_temp_kelvin",
            Self::Constant(_) => "constant",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of a two byte channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    /// Most significant byte first (coarse, then fine).
    Big,
    /// Least significant byte first.
    Little,
}

/// Number of DMX bytes a channel occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteWidth {
    /// One byte, raw range 0-255.
    One,
    /// Two bytes in the given order, raw range 0-65535.
    Two(Endianness),
}

impl ByteWidth {
    /// Returns the number of bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::One => 1,
            Self::Two(_) => 2,
        }
    }

    /// Returns the largest raw value, `2^(8 * len) - 1`.
    #[must_use]
    pub const fn max_raw(&self) -> u16 {
        match self {
            Self::One => u8::MAX as u16,
            Self::Two(_) => u16::MAX,
        }
    }

    /// Writes a raw value to `out` in this width's layout.
    ///
    /// Values above [`max_raw`](Self::max_raw) are clamped.
    pub fn write(&self, raw: u16, out: &mut Vec<u8>) {
        match self {
            #[allow(clippy::cast_possible_truncation)]
            Self::One => out.push(raw.min(self.max_raw()) as u8),
            Self::Two(Endianness::Big) => out.extend_from_slice(&raw.to_be_bytes()),
            Self::Two(Endianness::Little) => out.extend_from_slice(&raw.to_le_bytes()),
        }
    }
}

/// Units the correction polynomial is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionDomain {
    /// The normalized scalar in [0, 1]; kelvin as a fraction of the type's range.
    #[default]
    Normalized,
    /// The channel's natural unit: percent for brightness and saturation,
    /// degrees for hue, kelvin for color temperature.
    Native,
}

/// Polynomial `c0 + c1*x + c2*x^2 + ...` applied to a scalar before scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionPolynomial {
    coefficients: Vec<f64>,
    domain: CorrectionDomain,
}

impl CorrectionPolynomial {
    /// Creates a polynomial evaluated over normalized input.
    #[must_use]
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self::with_domain(coefficients, CorrectionDomain::Normalized)
    }

    /// Creates a polynomial evaluated over the given domain.
    #[must_use]
    pub fn with_domain(coefficients: Vec<f64>, domain: CorrectionDomain) -> Self {
        Self {
            coefficients,
            domain,
        }
    }

    /// Returns the coefficients, lowest order first.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Returns the evaluation domain.
    #[must_use]
    pub const fn domain(&self) -> CorrectionDomain {
        self.domain
    }

    /// Evaluates the polynomial at `x`. An empty polynomial evaluates to 0.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * x + coefficient)
    }
}

/// Describes one channel of a fixture type.
///
/// # Examples
///
/// ```
/// use dmx_fader::fixture::{ChannelDef, ChannelKind, Endianness};
///
/// let dimmer = ChannelDef::new(ChannelKind::Brightness).two_bytes(Endianness::Big);
/// assert_eq!(dimmer.width().len(), 2);
///
/// let mode = ChannelDef::constant(50);
/// assert_eq!(mode.kind(), ChannelKind::Constant(50));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDef {
    kind: ChannelKind,
    width: ByteWidth,
    offset: u16,
    correction: Option<CorrectionPolynomial>,
}

impl ChannelDef {
    /// Creates a one byte channel with no offset and no correction.
    #[must_use]
    pub const fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            width: ByteWidth::One,
            offset: 0,
            correction: None,
        }
    }

    /// Creates a one byte constant channel.
    #[must_use]
    pub const fn constant(value: u16) -> Self {
        Self::new(ChannelKind::Constant(value))
    }

    /// Makes the channel two bytes wide.
    #[must_use]
    pub const fn two_bytes(mut self, endianness: Endianness) -> Self {
        self.width = ByteWidth::Two(endianness);
        self
    }

    /// Sets the raw value corresponding to the bottom of the domain.
    #[must_use]
    pub const fn with_offset(mut self, offset: u16) -> Self {
        self.offset = offset;
        self
    }

    /// Sets a correction polynomial.
    #[must_use]
    pub fn with_correction(mut self, correction: CorrectionPolynomial) -> Self {
        self.correction = Some(correction);
        self
    }

    /// Returns the channel kind.
    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Returns the byte width.
    #[must_use]
    pub const fn width(&self) -> ByteWidth {
        self.width
    }

    /// Returns the offset.
    #[must_use]
    pub const fn offset(&self) -> u16 {
        self.offset
    }

    /// Returns the correction polynomial, if any.
    #[must_use]
    pub const fn correction(&self) -> Option<&CorrectionPolynomial> {
        self.correction.as_ref()
    }
}
