// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events for the host integration layer.
//!
//! Fixture controllers publish [`FixtureEvent`]s on a shared [`EventBus`].
//! State updates are throttled so that a long fade does not flood the host;
//! the live, unthrottled state is available from
//! [`FixtureHandle::state`](crate::FixtureHandle::state).
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use dmx_fader::ColorState;
//! use dmx_fader::event::{EventBus, FixtureEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(FixtureEvent::state_updated(Arc::from("Desk"), ColorState::off(3000)));
//! assert_eq!(rx.try_recv().unwrap().fixture(), "Desk");
//! ```

mod event_bus;
mod fixture_event;

pub use event_bus::EventBus;
pub use fixture_event::FixtureEvent;
