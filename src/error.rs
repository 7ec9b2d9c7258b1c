// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `dmx_fader` library.
//!
//! Configuration problems are fatal and surface once, when a [`Rig`](crate::Rig)
//! is started. Validation problems on light requests are never fatal: the
//! offending values are clamped and a warning is logged. The encoding path
//! itself has no error type at all.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A color value was outside its declared domain.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The transport collaborator rejected a frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No fixture with that name is managed by the rig.
    #[error("fixture not found: {0}")]
    FixtureNotFound(String),

    /// The controller task of a fixture has stopped.
    #[error("controller for fixture {0} is no longer running")]
    ControllerClosed(String),
}

/// Errors raised while loading fixture types, fixtures and tunables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON or has the wrong shape.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),

    /// A channel declared a byte width other than 1 or 2.
    #[error("fixture type {fixture_type}: channel {index} has byte width {bytes}, expected 1 or 2")]
    InvalidByteWidth {
        /// Name of the fixture type.
        fixture_type: String,
        /// Position of the channel in the type's channel list.
        index: usize,
        /// The declared width.
        bytes: u32,
    },

    /// A two byte channel did not declare its byte order.
    #[error("fixture type {fixture_type}: channel {index} is 2 bytes wide but has no endianness")]
    MissingEndianness {
        /// Name of the fixture type.
        fixture_type: String,
        /// Position of the channel in the type's channel list.
        index: usize,
    },

    /// A constant channel did not declare its value.
    #[error("fixture type {fixture_type}: constant channel {index} has no value")]
    MissingConstantValue {
        /// Name of the fixture type.
        fixture_type: String,
        /// Position of the channel in the type's channel list.
        index: usize,
    },

    /// A constant value does not fit in the channel's byte width.
    #[error("fixture type {fixture_type}: constant channel {index} value {value} exceeds {max}")]
    ConstantOutOfRange {
        /// Name of the fixture type.
        fixture_type: String,
        /// Position of the channel in the type's channel list.
        index: usize,
        /// The declared value.
        value: u32,
        /// Largest raw value for the channel width.
        max: u16,
    },

    /// An offset is larger than the channel's raw maximum.
    #[error("fixture type {fixture_type}: channel {index} offset {offset} exceeds {max}")]
    OffsetOutOfRange {
        /// Name of the fixture type.
        fixture_type: String,
        /// Position of the channel in the type's channel list.
        index: usize,
        /// The declared offset.
        offset: u32,
        /// Largest raw value for the channel width.
        max: u16,
    },

    /// The same color attribute is mapped by more than one channel.
    #[error("fixture type {fixture_type}: more than one {kind} channel")]
    DuplicateChannel {
        /// Name of the fixture type.
        fixture_type: String,
        /// The repeated channel kind.
        kind: String,
    },

    /// A fixture type declares no channels.
    #[error("fixture type {0} has no channels")]
    EmptyChannels(String),

    /// The color temperature bounds of a fixture type are unusable.
    #[error("fixture type {fixture_type}: color temperature range [{min}, {max}] K is invalid")]
    InvalidColorTempRange {
        /// Name of the fixture type.
        fixture_type: String,
        /// Declared minimum in kelvin.
        min: u32,
        /// Declared maximum in kelvin.
        max: u32,
    },

    /// A tunable that must be strictly positive is not, or the period it
    /// gives rounds to zero or overflows.
    #[error("tunable {name} must be positive and give a usable period, got {value}")]
    NonPositiveTunable {
        /// Name of the tunable.
        name: &'static str,
        /// The configured value.
        value: f64,
    },

    /// A tunable that may be zero is negative.
    #[error("tunable {name} must not be negative, got {value}")]
    NegativeTunable {
        /// Name of the tunable.
        name: &'static str,
        /// The configured value.
        value: f64,
    },

    /// A fixture references a type missing from the catalog.
    #[error("fixture {fixture} references unknown type {fixture_type}")]
    UnknownFixtureType {
        /// Name of the fixture.
        fixture: String,
        /// The referenced type name.
        fixture_type: String,
    },

    /// Two fixtures or two fixture types share a name.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A fixture does not fit inside its universe.
    #[error("fixture {fixture} occupies channels {start}..={end}, outside 1..=512")]
    AddressOutOfRange {
        /// Name of the fixture.
        fixture: String,
        /// First DMX channel.
        start: u16,
        /// Last DMX channel.
        end: u32,
    },
}

/// Errors raised when a color value lies outside its declared domain.
///
/// Light requests never fail with these; they are reported through logging
/// after the value has been clamped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A hue value is outside [0, 360].
    #[error("hue value {0} is out of range [0, 360]")]
    InvalidHue(f64),

    /// A saturation value is outside [0, 1].
    #[error("saturation value {0} is out of range [0, 1]")]
    InvalidSaturation(f64),

    /// A brightness value is outside [0, 1].
    #[error("brightness value {0} is out of range [0, 1]")]
    InvalidBrightness(f64),

    /// A color temperature is not positive.
    #[error("color temperature {0} K is not positive")]
    InvalidColorTemp(u32),
}

/// Errors reported by transport collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The receiving side of a queued transport has gone away.
    #[error("transport channel closed")]
    Closed,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::InvalidSaturation(1.5);
        assert_eq!(err.to_string(), "saturation value 1.5 is out of range [0, 1]");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::EmptyChannels("par".to_string()).into();
        assert!(matches!(err, Error::Config(ConfigError::EmptyChannels(_))));
        assert_eq!(err.to_string(), "config error: fixture type par has no channels");
    }

    #[test]
    fn byte_width_error_display() {
        let err = ConfigError::InvalidByteWidth {
            fixture_type: "astera".to_string(),
            index: 2,
            bytes: 3,
        };
        assert_eq!(
            err.to_string(),
            "fixture type astera: channel 2 has byte width 3, expected 1 or 2"
        );
    }

    #[test]
    fn unknown_type_display() {
        let err = ConfigError::UnknownFixtureType {
            fixture: "Desk".to_string(),
            fixture_type: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "fixture Desk references unknown type nope");
    }
}
