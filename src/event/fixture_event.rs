// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixture event types.

use std::sync::Arc;
use std::time::Duration;

use crate::fade::FadeKind;
use crate::types::ColorState;

/// Events emitted by fixture controllers.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureEvent {
    /// The state to report to the host changed.
    ///
    /// Sent at most once per state update period while a fade runs, and
    /// always when a fade completes or a state is applied immediately.
    StateUpdated {
        /// Name of the fixture.
        fixture: Arc<str>,
        /// The state currently shown.
        state: ColorState,
    },

    /// A fade started.
    FadeStarted {
        /// Name of the fixture.
        fixture: Arc<str>,
        /// Shape of the fade.
        kind: FadeKind,
        /// The state the fade ends at.
        target: ColorState,
        /// The fade duration.
        duration: Duration,
    },

    /// A fade reached its target.
    FadeCompleted {
        /// Name of the fixture.
        fixture: Arc<str>,
        /// Number of samples sent to the transport, including the last.
        samples: u32,
    },
}

impl FixtureEvent {
    /// Returns the fixture name associated with this event.
    #[must_use]
    pub fn fixture(&self) -> &str {
        match self {
            Self::StateUpdated { fixture, .. }
            | Self::FadeStarted { fixture, .. }
            | Self::FadeCompleted { fixture, .. } => fixture,
        }
    }

    /// Returns `true` if this is a state update.
    #[must_use]
    pub fn is_state_update(&self) -> bool {
        matches!(self, Self::StateUpdated { .. })
    }

    /// Creates a state update event.
    #[must_use]
    pub fn state_updated(fixture: Arc<str>, state: ColorState) -> Self {
        Self::StateUpdated { fixture, state }
    }
}
