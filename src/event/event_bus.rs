// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast bus for fixture events.

use tokio::sync::broadcast;

use super::FixtureEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus shared by every fixture controller of a rig.
///
/// Each subscriber gets its own copy of every event published after it
/// subscribed. A subscriber that falls more than the capacity behind loses
/// the oldest events and sees `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dmx_fader::ColorState;
/// use dmx_fader::event::{EventBus, FixtureEvent};
///
/// let bus = EventBus::with_capacity(16);
/// let mut host = bus.subscribe();
/// let mut logger = bus.subscribe();
///
/// bus.publish(FixtureEvent::state_updated(Arc::from("Lamp"), ColorState::off(2700)));
///
/// assert!(host.try_recv().unwrap().is_state_update());
/// assert!(logger.try_recv().unwrap().is_state_update());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FixtureEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus buffering up to `capacity` events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FixtureEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is dropped.
    pub fn publish(&self, event: FixtureEvent) {
        let _ = self.sender.send(event);
    }

    /// Publishes an event and returns how many subscribers will see it.
    #[must_use]
    pub fn publish_counted(&self, event: FixtureEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
