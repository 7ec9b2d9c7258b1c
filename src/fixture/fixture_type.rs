// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixture type definitions and their configuration form.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::channel::{ByteWidth, ChannelDef, ChannelKind, CorrectionDomain, CorrectionPolynomial, Endianness};

/// A validated fixture type: a named, ordered list of channel descriptors.
///
/// Channel order is wire order. The type is immutable once built.
///
/// # Examples
///
/// ```
/// use dmx_fader::fixture::{ChannelDef, ChannelKind, Endianness, FixtureTypeDef};
///
/// let par = FixtureTypeDef::new(
///     "par",
///     2000,
///     10000,
///     vec![
///         ChannelDef::new(ChannelKind::Brightness).two_bytes(Endianness::Big),
///         ChannelDef::new(ChannelKind::ColorTempKelvin),
///         ChannelDef::constant(0),
///     ],
/// )
/// .unwrap();
/// assert_eq!(par.footprint(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureTypeDef {
    name: String,
    min_color_temp_kelvin: u32,
    max_color_temp_kelvin: u32,
    channels: Vec<ChannelDef>,
}

impl FixtureTypeDef {
    /// Builds and validates a fixture type.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the channel list is empty, the kelvin
    /// range is empty or starts at 0, a color attribute is mapped twice, or
    /// an offset or constant does not fit its channel width.
    pub fn new(
        name: impl Into<String>,
        min_color_temp_kelvin: u32,
        max_color_temp_kelvin: u32,
        channels: Vec<ChannelDef>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();

        if min_color_temp_kelvin == 0 || min_color_temp_kelvin >= max_color_temp_kelvin {
            return Err(ConfigError::InvalidColorTempRange {
                fixture_type: name,
                min: min_color_temp_kelvin,
                max: max_color_temp_kelvin,
            });
        }
        if channels.is_empty() {
            return Err(ConfigError::EmptyChannels(name));
        }

        let mut seen = HashSet::new();
        for (index, channel) in channels.iter().enumerate() {
            let max = channel.width().max_raw();
            if channel.offset() > max {
                return Err(ConfigError::OffsetOutOfRange {
                    fixture_type: name,
                    index,
                    offset: u32::from(channel.offset()),
                    max,
                });
            }
            match channel.kind() {
                ChannelKind::Constant(value) => {
                    if value > max {
                        return Err(ConfigError::ConstantOutOfRange {
                            fixture_type: name,
                            index,
                            value: u32::from(value),
                            max,
                        });
                    }
                }
                kind => {
                    if !seen.insert(kind) {
                        return Err(ConfigError::DuplicateChannel {
                            fixture_type: name,
                            kind: kind.to_string(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            name,
            min_color_temp_kelvin,
            max_color_temp_kelvin,
            channels,
        })
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lowest supported color temperature.
    #[must_use]
    pub const fn min_color_temp_kelvin(&self) -> u32 {
        self.min_color_temp_kelvin
    }

    /// Returns the highest supported color temperature.
    #[must_use]
    pub const fn max_color_temp_kelvin(&self) -> u32 {
        self.max_color_temp_kelvin
    }

    /// Returns the channel descriptors in wire order.
    #[must_use]
    pub fn channels(&self) -> &[ChannelDef] {
        &self.channels
    }

    /// Returns the number of DMX bytes one fixture of this type occupies.
    #[must_use]
    pub fn footprint(&self) -> usize {
        self.channels.iter().map(|c| c.width().len()).sum()
    }

    /// Clamps a color temperature into this type's range.
    #[must_use]
    pub fn clamp_kelvin(&self, kelvin: u32) -> u32 {
        kelvin.clamp(self.min_color_temp_kelvin, self.max_color_temp_kelvin)
    }

    /// Returns a color temperature as a fraction of this type's range.
    #[must_use]
    pub fn kelvin_fraction(&self, kelvin: u32) -> f64 {
        let kelvin = f64::from(self.clamp_kelvin(kelvin));
        let min = f64::from(self.min_color_temp_kelvin);
        let max = f64::from(self.max_color_temp_kelvin);
        (kelvin - min) / (max - min)
    }
}

/// Configuration form of a channel, as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel kind name.
    #[serde(rename = "type")]
    pub kind: ChannelKindName,
    /// Byte width, 1 or 2.
    #[serde(default = "default_bytes")]
    pub bytes: u32,
    /// Byte order, required when `bytes` is 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endianness: Option<Endianness>,
    /// Raw value of the bottom of the domain.
    #[serde(default)]
    pub offset: u32,
    /// Raw value of a constant channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    /// Correction coefficients, lowest order first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_polynomial: Option<Vec<f64>>,
    /// Units the correction polynomial is evaluated in.
    #[serde(default)]
    pub correction_domain: CorrectionDomain,
}

fn default_bytes() -> u32 {
    1
}

/// Channel kind names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKindName {
    /// See [`ChannelKind::Brightness`].
    Brightness,
    /// See [`ChannelKind::Hue`].
    Hue,
    /// See [`ChannelKind::Saturation`].
    Saturation,
    /// See [`ChannelKind::ColorTempKelvin`].
    ColorTempKelvin,
    /// See [`ChannelKind::Constant`].
    Constant,
}

impl ChannelConfig {
    /// Converts this entry into a channel descriptor.
    ///
    /// `fixture_type` and `index` only label errors.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a byte width other than 1 or 2, a two
    /// byte channel without endianness, a constant without value, or a
    /// value or offset too large for the channel.
    pub fn to_channel_def(&self, fixture_type: &str, index: usize) -> Result<ChannelDef, ConfigError> {
        let width = match (self.bytes, self.endianness) {
            (1, _) => ByteWidth::One,
            (2, Some(endianness)) => ByteWidth::Two(endianness),
            (2, None) => {
                return Err(ConfigError::MissingEndianness {
                    fixture_type: fixture_type.to_string(),
                    index,
                });
            }
            (bytes, _) => {
                return Err(ConfigError::InvalidByteWidth {
                    fixture_type: fixture_type.to_string(),
                    index,
                    bytes,
                });
            }
        };
        let max = width.max_raw();

        let kind = match self.kind {
            ChannelKindName::Brightness => ChannelKind::Brightness,
            ChannelKindName::Hue => ChannelKind::Hue,
            ChannelKindName::Saturation => ChannelKind::Saturation,
            ChannelKindName::ColorTempKelvin => ChannelKind::ColorTempKelvin,
            ChannelKindName::Constant => {
                let value = self.value.ok_or_else(|| ConfigError::MissingConstantValue {
                    fixture_type: fixture_type.to_string(),
                    index,
                })?;
                let value = u16::try_from(value)
                    .ok()
                    .filter(|v| *v <= max)
                    .ok_or_else(|| ConfigError::ConstantOutOfRange {
                        fixture_type: fixture_type.to_string(),
                        index,
                        value,
                        max,
                    })?;
                ChannelKind::Constant(value)
            }
        };

        let offset = u16::try_from(self.offset)
            .ok()
            .filter(|o| *o <= max)
            .ok_or_else(|| ConfigError::OffsetOutOfRange {
                fixture_type: fixture_type.to_string(),
                index,
                offset: self.offset,
                max,
            })?;

        let mut def = ChannelDef::new(kind).with_offset(offset);
        if let ByteWidth::Two(endianness) = width {
            def = def.two_bytes(endianness);
        }
        if let Some(coefficients) = &self.correction_polynomial {
            def = def.with_correction(CorrectionPolynomial::with_domain(
                coefficients.clone(),
                self.correction_domain,
            ));
        }
        Ok(def)
    }
}

/// Configuration form of a fixture type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureTypeConfig {
    /// Type name referenced by fixtures.
    pub name: String,
    /// Lowest supported color temperature.
    pub min_color_temp_kelvin: u32,
    /// Highest supported color temperature.
    pub max_color_temp_kelvin: u32,
    /// Channels in wire order.
    pub channels: Vec<ChannelConfig>,
}

impl TryFrom<&FixtureTypeConfig> for FixtureTypeDef {
    type Error = ConfigError;

    fn try_from(config: &FixtureTypeConfig) -> Result<Self, Self::Error> {
        let channels = config
            .channels
            .iter()
            .enumerate()
            .map(|(index, channel)| channel.to_channel_def(&config.name, index))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(
            config.name.clone(),
            config.min_color_temp_kelvin,
            config.max_color_temp_kelvin,
            channels,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(json: &str) -> ChannelConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn channel_defaults() {
        let config = channel(r#"{"type": "saturation"}"#);
        assert_eq!(config.bytes, 1);
        assert_eq!(config.offset, 0);
        assert_eq!(config.correction_domain, CorrectionDomain::Normalized);

        let def = config.to_channel_def("t", 0).unwrap();
        assert_eq!(def.kind(), ChannelKind::Saturation);
        assert_eq!(def.width(), ByteWidth::One);
        assert!(def.correction().is_none());
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        let result = serde_json::from_str::<ChannelConfig>(r#"{"type": "strobe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_byte_width() {
        let err = channel(r#"{"type": "hue", "bytes": 3}"#)
            .to_channel_def("t", 1)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidByteWidth { bytes: 3, index: 1, .. }));
    }

    #[test]
    fn wide_byte_width_gets_dedicated_error() {
        let err = channel(r#"{"type": "brightness", "bytes": 300}"#)
            .to_channel_def("t", 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidByteWidth { bytes: 300, .. }));

        let err = channel(r#"{"type": "brightness", "bytes": 0}"#)
            .to_channel_def("t", 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidByteWidth { bytes: 0, .. }));
    }

    #[test]
    fn two_bytes_need_endianness() {
        let err = channel(r#"{"type": "hue", "bytes": 2}"#)
            .to_channel_def("t", 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEndianness { .. }));

        let def = channel(r#"{"type": "hue", "bytes": 2, "endianness": "little"}"#)
            .to_channel_def("t", 0)
            .unwrap();
        assert_eq!(def.width(), ByteWidth::Two(Endianness::Little));
    }

    #[test]
    fn constant_needs_value() {
        let err = channel(r#"{"type": "constant"}"#)
            .to_channel_def("t", 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingConstantValue { .. }));

        let err = channel(r#"{"type": "constant", "value": 256}"#)
            .to_channel_def("t", 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConstantOutOfRange { value: 256, max: 255, .. }));
    }

    #[test]
    fn offset_must_fit() {
        let err = channel(r#"{"type": "brightness", "offset": 300}"#)
            .to_channel_def("t", 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::OffsetOutOfRange { offset: 300, .. }));
    }

    #[test]
    fn correction_is_carried_over() {
        let def = channel(
            r#"{"type": "saturation", "correction_polynomial": [0, 1], "correction_domain": "native"}"#,
        )
        .to_channel_def("t", 0)
        .unwrap();
        let correction = def.correction().unwrap();
        assert_eq!(correction.coefficients(), &[0.0, 1.0]);
        assert_eq!(correction.domain(), CorrectionDomain::Native);
    }

    #[test]
    fn duplicate_kind_rejected() {
        let err = FixtureTypeDef::new(
            "t",
            2000,
            6000,
            vec![
                ChannelDef::new(ChannelKind::Hue),
                ChannelDef::constant(1),
                ChannelDef::constant(1),
                ChannelDef::new(ChannelKind::Hue),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateChannel { .. }));
    }

    #[test]
    fn kelvin_range_validated() {
        let channels = vec![ChannelDef::new(ChannelKind::Brightness)];
        assert!(matches!(
            FixtureTypeDef::new("t", 5000, 5000, channels.clone()),
            Err(ConfigError::InvalidColorTempRange { .. })
        ));
        assert!(matches!(
            FixtureTypeDef::new("t", 0, 5000, channels),
            Err(ConfigError::InvalidColorTempRange { .. })
        ));
        assert!(matches!(
            FixtureTypeDef::new("t", 2000, 5000, Vec::new()),
            Err(ConfigError::EmptyChannels(_))
        ));
    }

    #[test]
    fn kelvin_fraction_clamps() {
        let def =
            FixtureTypeDef::new("t", 2000, 10000, vec![ChannelDef::new(ChannelKind::ColorTempKelvin)])
                .unwrap();
        assert_eq!(def.kelvin_fraction(1000), 0.0);
        assert_eq!(def.kelvin_fraction(4000), 0.25);
        assert_eq!(def.kelvin_fraction(20000), 1.0);
    }

    #[test]
    fn type_from_config() {
        let config: FixtureTypeConfig = serde_json::from_str(
            r#"{
                "name": "aputure",
                "min_color_temp_kelvin": 2300,
                "max_color_temp_kelvin": 10000,
                "channels": [
                    {"type": "brightness"},
                    {"type": "hue"},
                    {"type": "saturation", "bytes": 2, "endianness": "big"},
                    {"type": "color_temp_kelvin"},
                    {"type": "constant", "value": 0}
                ]
            }"#,
        )
        .unwrap();
        let def = FixtureTypeDef::try_from(&config).unwrap();
        assert_eq!(def.name(), "aputure");
        assert_eq!(def.channels().len(), 5);
        assert_eq!(def.footprint(), 6);
    }
}
