// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rig configuration.
//!
//! A [`Config`] is the raw document: global tunables, a fixture type
//! catalog and the fixture list. It is loaded once, either from JSON with
//! [`Config::from_json_str`] or with the builder methods, and turned into a
//! [`ResolvedConfig`] by [`Config::resolve`]. Nothing changes after that.
//!
//! # Examples
//!
//! ```
//! use dmx_fader::config::Config;
//!
//! let config = Config::from_json_str(r#"{
//!     "universe": 1,
//!     "intended_fade_fps": 60,
//!     "check_fps": 240,
//!     "resend_universe_every_secs": 1,
//!     "home_assistant_state_update_frequency_secs": 0.5,
//!     "default_color_temp_kelvin": 3000,
//!     "types": [{
//!         "name": "par",
//!         "min_color_temp_kelvin": 2000,
//!         "max_color_temp_kelvin": 6500,
//!         "channels": [
//!             {"type": "brightness", "bytes": 2, "endianness": "big"},
//!             {"type": "color_temp_kelvin"}
//!         ]
//!     }],
//!     "entities": [
//!         {"name": "Desk", "channel": 1, "type": "par"},
//!         {"name": "Shelf", "channel": 4, "type": "par"}
//!     ]
//! }"#).unwrap();
//!
//! let resolved = config.resolve().unwrap();
//! assert_eq!(resolved.fixtures().len(), 2);
//! assert_eq!(resolved.fixtures()[1].universe(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fade::{
    DEFAULT_CHECK_FPS, DEFAULT_FADE_FPS, FadeTiming, period_from_secs, require_positive,
};
use crate::fixture::{Fixture, FixtureTypeConfig, FixtureTypeDef};

/// Color temperature a light turns on at when none is requested.
pub const DEFAULT_COLOR_TEMP_KELVIN: u32 = 4000;

/// Default period between universe refreshes, in seconds.
pub const DEFAULT_RESEND_SECS: f64 = 1.0;

/// Default period between host state updates during a fade, in seconds.
pub const DEFAULT_STATE_UPDATE_SECS: f64 = 0.5;

/// Global tunables shared by every fixture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tunables {
    /// Samples per second emitted during a fade.
    #[serde(default = "default_fade_fps")]
    pub intended_fade_fps: f64,

    /// Ticks per second of the internal check loop.
    #[serde(default = "default_check_fps")]
    pub check_fps: f64,

    /// Period of the unconditional refresh. Zero or negative disables it.
    #[serde(default = "default_resend_secs")]
    pub resend_universe_every_secs: f64,

    /// Minimum time between two state updates sent to the host while a
    /// fade runs.
    #[serde(
        rename = "home_assistant_state_update_frequency_secs",
        default = "default_state_update_secs"
    )]
    pub state_update_frequency_secs: f64,

    /// Color temperature used when turning on without one.
    #[serde(default = "default_color_temp_kelvin")]
    pub default_color_temp_kelvin: u32,

    /// Transition used when a request does not name one.
    #[serde(default)]
    pub default_transition_secs: f64,
}

fn default_fade_fps() -> f64 {
    DEFAULT_FADE_FPS
}

fn default_check_fps() -> f64 {
    DEFAULT_CHECK_FPS
}

fn default_resend_secs() -> f64 {
    DEFAULT_RESEND_SECS
}

fn default_state_update_secs() -> f64 {
    DEFAULT_STATE_UPDATE_SECS
}

fn default_color_temp_kelvin() -> u32 {
    DEFAULT_COLOR_TEMP_KELVIN
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            intended_fade_fps: DEFAULT_FADE_FPS,
            check_fps: DEFAULT_CHECK_FPS,
            resend_universe_every_secs: DEFAULT_RESEND_SECS,
            state_update_frequency_secs: DEFAULT_STATE_UPDATE_SECS,
            default_color_temp_kelvin: DEFAULT_COLOR_TEMP_KELVIN,
            default_transition_secs: 0.0,
        }
    }
}

impl Tunables {
    /// Sets the emission rate.
    #[must_use]
    pub const fn with_intended_fade_fps(mut self, fps: f64) -> Self {
        self.intended_fade_fps = fps;
        self
    }

    /// Sets the check rate.
    #[must_use]
    pub const fn with_check_fps(mut self, fps: f64) -> Self {
        self.check_fps = fps;
        self
    }

    /// Sets the refresh period. Zero or negative disables refreshes.
    #[must_use]
    pub const fn with_resend_every_secs(mut self, secs: f64) -> Self {
        self.resend_universe_every_secs = secs;
        self
    }

    /// Sets the host state update period.
    #[must_use]
    pub const fn with_state_update_frequency_secs(mut self, secs: f64) -> Self {
        self.state_update_frequency_secs = secs;
        self
    }

    /// Sets the color temperature used when turning on without one.
    #[must_use]
    pub const fn with_default_color_temp_kelvin(mut self, kelvin: u32) -> Self {
        self.default_color_temp_kelvin = kelvin;
        self
    }

    /// Sets the transition used when a request does not name one.
    #[must_use]
    pub const fn with_default_transition_secs(mut self, secs: f64) -> Self {
        self.default_transition_secs = secs;
        self
    }

    /// Checks every tunable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveTunable`] if a rate, the state
    /// update period or the default color temperature is not positive, or if
    /// a rate or an enabled refresh period does not give a usable
    /// [`Duration`]. Returns [`ConfigError::NegativeTunable`] if the default
    /// transition is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fade_timing()?;
        require_positive(
            "home_assistant_state_update_frequency_secs",
            self.state_update_frequency_secs,
        )?;
        require_positive(
            "default_color_temp_kelvin",
            f64::from(self.default_color_temp_kelvin),
        )?;
        if !(self.default_transition_secs.is_finite() && self.default_transition_secs >= 0.0) {
            return Err(ConfigError::NegativeTunable {
                name: "default_transition_secs",
                value: self.default_transition_secs,
            });
        }
        if self.resend_universe_every_secs.is_nan() {
            return Err(ConfigError::NonPositiveTunable {
                name: "resend_universe_every_secs",
                value: self.resend_universe_every_secs,
            });
        }
        if self.resend_universe_every_secs > 0.0 {
            period_from_secs("resend_universe_every_secs", self.resend_universe_every_secs)?;
        }
        Ok(())
    }

    /// Returns the fade cadences.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveTunable`] if either rate is not
    /// positive.
    pub fn fade_timing(&self) -> Result<FadeTiming, ConfigError> {
        FadeTiming::new(self.check_fps, self.intended_fade_fps)
    }

    /// Returns the refresh period, or `None` when refreshes are disabled.
    #[must_use]
    pub fn resend_interval(&self) -> Option<Duration> {
        if self.resend_universe_every_secs > 0.0 {
            period_from_secs("resend_universe_every_secs", self.resend_universe_every_secs).ok()
        } else {
            None
        }
    }

    /// Returns the minimum time between host state updates during a fade.
    #[must_use]
    pub fn state_update_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.state_update_frequency_secs).unwrap_or(Duration::ZERO)
    }
}

/// One fixture entry of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// Unique fixture name.
    pub name: String,
    /// DMX start address, 1-based.
    pub channel: u16,
    /// Name of the fixture type.
    #[serde(rename = "type")]
    pub fixture_type: String,
    /// Universe override. The document's universe is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<u16>,
}

impl FixtureConfig {
    /// Creates an entry patched at `channel` of the default universe.
    #[must_use]
    pub fn new(name: impl Into<String>, fixture_type: impl Into<String>, channel: u16) -> Self {
        Self {
            name: name.into(),
            channel,
            fixture_type: fixture_type.into(),
            universe: None,
        }
    }

    /// Patches the fixture on another universe.
    #[must_use]
    pub const fn on_universe(mut self, universe: u16) -> Self {
        self.universe = Some(universe);
        self
    }
}

/// The raw configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Universe fixtures are patched on unless they name one.
    #[serde(default)]
    pub universe: u16,

    /// Global tunables.
    #[serde(flatten)]
    pub tunables: Tunables,

    /// Fixture type catalog.
    #[serde(default)]
    pub types: Vec<FixtureTypeConfig>,

    /// Fixture list.
    #[serde(default, alias = "entities")]
    pub fixtures: Vec<FixtureConfig>,
}

impl Config {
    /// Creates an empty configuration for `universe` with default tunables.
    #[must_use]
    pub fn new(universe: u16) -> Self {
        Self {
            universe,
            ..Self::default()
        }
    }

    /// Parses a JSON document.
    ///
    /// Only the shape is checked here; see [`Config::resolve`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document does not parse.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replaces the tunables.
    #[must_use]
    pub const fn with_tunables(mut self, tunables: Tunables) -> Self {
        self.tunables = tunables;
        self
    }

    /// Adds a fixture type to the catalog.
    #[must_use]
    pub fn with_type(mut self, fixture_type: FixtureTypeConfig) -> Self {
        self.types.push(fixture_type);
        self
    }

    /// Adds a fixture.
    #[must_use]
    pub fn with_fixture(mut self, fixture: FixtureConfig) -> Self {
        self.fixtures.push(fixture);
        self
    }

    /// Validates the document and resolves every fixture against its type.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: an invalid tunable, an
    /// invalid fixture type, two types or two fixtures with the same name, a
    /// fixture naming an unknown type, or a fixture that does not fit in its
    /// universe.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        self.tunables.validate()?;
        let timing = self.tunables.fade_timing()?;

        let mut types: HashMap<&str, Arc<FixtureTypeDef>> = HashMap::with_capacity(self.types.len());
        for config in &self.types {
            let def = FixtureTypeDef::try_from(config)?;
            if types.insert(config.name.as_str(), Arc::new(def)).is_some() {
                return Err(ConfigError::DuplicateName(config.name.clone()));
            }
        }

        let mut names = std::collections::HashSet::with_capacity(self.fixtures.len());
        let mut fixtures = Vec::with_capacity(self.fixtures.len());
        for entry in &self.fixtures {
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName(entry.name.clone()));
            }
            let fixture_type = types.get(entry.fixture_type.as_str()).ok_or_else(|| {
                ConfigError::UnknownFixtureType {
                    fixture: entry.name.clone(),
                    fixture_type: entry.fixture_type.clone(),
                }
            })?;
            fixtures.push(Fixture::new(
                entry.name.as_str(),
                entry.universe.unwrap_or(self.universe),
                entry.channel,
                Arc::clone(fixture_type),
            )?);
        }

        tracing::debug!(
            types = types.len(),
            fixtures = fixtures.len(),
            "Configuration resolved"
        );

        Ok(ResolvedConfig {
            tunables: self.tunables,
            timing,
            fixtures,
        })
    }
}

/// A validated configuration, ready to start a rig from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    tunables: Tunables,
    timing: FadeTiming,
    fixtures: Vec<Fixture>,
}

impl ResolvedConfig {
    /// Returns the validated tunables.
    #[must_use]
    pub const fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Returns the fade cadences.
    #[must_use]
    pub const fn timing(&self) -> FadeTiming {
        self.timing
    }

    /// Returns the patched fixtures in configuration order.
    #[must_use]
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }
}
