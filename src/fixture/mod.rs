// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixture types, channel descriptors and patched fixtures.
//!
//! A [`FixtureTypeDef`] is the channel layout shared by every fixture of one
//! model. A [`Fixture`] is one physical light: a name, a universe and a start
//! address, pointing at its type.

mod channel;
mod fixture_type;

use std::sync::Arc;

pub use channel::{
    ByteWidth, ChannelDef, ChannelKind, CorrectionDomain, CorrectionPolynomial, Endianness,
};
pub use fixture_type::{ChannelConfig, ChannelKindName, FixtureTypeConfig, FixtureTypeDef};

use crate::error::ConfigError;

/// Number of channels in one DMX universe.
pub const UNIVERSE_SIZE: u16 = 512;

/// A fixture patched at a DMX address.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    name: Arc<str>,
    universe: u16,
    start_channel: u16,
    fixture_type: Arc<FixtureTypeDef>,
}

impl Fixture {
    /// Patches a fixture at `start_channel` (1-based) of `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressOutOfRange`] if the fixture's channels do
    /// not all fall within 1..=512.
    pub fn new(
        name: impl Into<Arc<str>>,
        universe: u16,
        start_channel: u16,
        fixture_type: Arc<FixtureTypeDef>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        #[allow(clippy::cast_possible_truncation)]
        let end = u32::from(start_channel) + fixture_type.footprint() as u32 - 1;
        if start_channel == 0 || end > u32::from(UNIVERSE_SIZE) {
            return Err(ConfigError::AddressOutOfRange {
                fixture: name.to_string(),
                start: start_channel,
                end,
            });
        }
        Ok(Self {
            name,
            universe,
            start_channel,
            fixture_type,
        })
    }

    /// Returns the fixture name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a shared handle on the fixture name.
    #[must_use]
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Returns the universe the fixture is patched in.
    #[must_use]
    pub const fn universe(&self) -> u16 {
        self.universe
    }

    /// Returns the first DMX channel (1-based).
    #[must_use]
    pub const fn start_channel(&self) -> u16 {
        self.start_channel
    }

    /// Returns the fixture type.
    #[must_use]
    pub fn fixture_type(&self) -> &FixtureTypeDef {
        &self.fixture_type
    }
}
