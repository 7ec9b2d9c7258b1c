// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `dmx_fader` - drift-free fades and channel encoding for DMX color lights.
//!
//! The library sits between a home automation host and an Art-Net/DMX
//! sender. It turns abstract color states into per-channel bytes for each
//! fixture, and runs timed fades between states that keep their duration no
//! matter how irregularly the runtime wakes the fade loop up.
//!
//! # Building blocks
//!
//! - [`ColorState`] - brightness, hue, saturation, color temperature, on/off
//! - [`encode`] - a normalized state to the raw bytes of one fixture type
//! - [`FadePlan`] and [`FadeScheduler`] - time-based fades, throttled to an
//!   emission rate and always ending on the exact target
//! - [`Rig`] - one controller task per configured fixture, fed through
//!   [`FixtureHandle`]s, writing to a [`DmxTransport`](transport::DmxTransport)
//!
//! # Quick Start
//!
//! ```no_run
//! use dmx_fader::{Rig, TurnOn};
//! use dmx_fader::config::{Config, FixtureConfig};
//! use dmx_fader::fixture::{ChannelConfig, ChannelKindName, CorrectionDomain, FixtureTypeConfig};
//! use dmx_fader::transport::ChannelTransport;
//!
//! #[tokio::main]
//! async fn main() -> dmx_fader::Result<()> {
//!     let dimmer = FixtureTypeConfig {
//!         name: "dimmer".to_string(),
//!         min_color_temp_kelvin: 2700,
//!         max_color_temp_kelvin: 6500,
//!         channels: vec![ChannelConfig {
//!             kind: ChannelKindName::Brightness,
//!             bytes: 1,
//!             endianness: None,
//!             offset: 0,
//!             value: None,
//!             correction_polynomial: None,
//!             correction_domain: CorrectionDomain::Normalized,
//!         }],
//!     };
//!     let config = Config::new(0)
//!         .with_type(dimmer)
//!         .with_fixture(FixtureConfig::new("Porch", "dimmer", 1));
//!
//!     let (transport, _frames) = ChannelTransport::unbounded();
//!     let rig = Rig::start(&config, transport)?;
//!
//!     rig.fixture("Porch")?
//!         .turn_on(TurnOn::new().brightness(0.8).transition(3.0))
//!         .await?;
//!
//!     rig.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Pure encoding
//!
//! ```
//! use dmx_fader::{ColorState, encode, normalize};
//! use dmx_fader::fixture::{ChannelDef, ChannelKind, FixtureTypeDef};
//!
//! let fixture_type = FixtureTypeDef::new(
//!     "hs",
//!     2000,
//!     10000,
//!     vec![
//!         ChannelDef::new(ChannelKind::Brightness),
//!         ChannelDef::new(ChannelKind::Hue),
//!         ChannelDef::new(ChannelKind::Saturation),
//!     ],
//! )?;
//!
//! let state = normalize(&ColorState::on(0.5, 40.0, 1.0, 4000))?;
//! assert_eq!(encode(&state, &fixture_type), vec![128, 28, 255]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
mod controller;
pub mod encoder;
pub mod error;
pub mod event;
pub mod fade;
pub mod fixture;
mod rig;
pub mod transport;
pub mod types;

pub use controller::{FixtureHandle, LightRequest, Resolved, TurnOn, resolve_request};
pub use encoder::{encode, encode_into};
pub use error::{ConfigError, Error, Result, TransportError, ValidationError};
pub use fade::{FadeKind, FadePlan, FadeSample, FadeScheduler, FadeTiming};
pub use rig::Rig;
pub use types::{ColorState, NormalizedState, interpolate, normalize};
