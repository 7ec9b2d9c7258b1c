// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A set of fixtures driven from one configuration.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::config::{Config, ResolvedConfig, Tunables};
use crate::controller::{FixtureController, FixtureHandle};
use crate::error::Error;
use crate::event::{EventBus, FixtureEvent};
use crate::transport::DmxTransport;
use crate::types::ColorState;

/// Every fixture of a configuration, each with its own controller task.
///
/// Fixtures start off at the default color temperature.
///
/// # Examples
///
/// ```no_run
/// use dmx_fader::{Rig, TurnOn};
/// use dmx_fader::config::Config;
/// use dmx_fader::transport::ChannelTransport;
///
/// #[tokio::main]
/// async fn main() -> dmx_fader::Result<()> {
///     let config = Config::from_json_str(&std::fs::read_to_string("rig.json").unwrap())?;
///     let (transport, mut frames) = ChannelTransport::unbounded();
///
///     tokio::spawn(async move {
///         while let Some(frame) = frames.recv().await {
///             // hand the frame to the Art-Net sender
///             let _ = frame;
///         }
///     });
///
///     let rig = Rig::start(&config, transport)?;
///     let mut events = rig.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("{event:?}");
///         }
///     });
///
///     rig.fixture("Desk")?.turn_on(TurnOn::new().transition(2.0)).await?;
///     rig.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Rig {
    handles: Vec<FixtureHandle>,
    by_name: HashMap<Arc<str>, usize>,
    tasks: Vec<JoinHandle<()>>,
    events: EventBus,
    tunables: Tunables,
}

impl Rig {
    /// Validates `config` and starts one controller per fixture.
    ///
    /// Must be called from within a `tokio` runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not resolve.
    pub fn start(config: &Config, transport: impl DmxTransport) -> Result<Self, Error> {
        let resolved = config.resolve()?;
        Ok(Self::start_resolved(&resolved, Arc::new(transport), EventBus::new()))
    }

    /// Starts one controller per fixture of an already resolved
    /// configuration, publishing on `events`.
    #[must_use]
    pub fn start_resolved(
        config: &ResolvedConfig,
        transport: Arc<dyn DmxTransport>,
        events: EventBus,
    ) -> Self {
        let tunables = *config.tunables();
        let initial = ColorState::off(tunables.default_color_temp_kelvin);

        let mut handles = Vec::with_capacity(config.fixtures().len());
        let mut by_name = HashMap::with_capacity(config.fixtures().len());
        let mut tasks = Vec::with_capacity(config.fixtures().len());

        for fixture in config.fixtures() {
            let name = fixture.shared_name();
            let (state_tx, state_rx) = watch::channel(initial);
            let controller = FixtureController::new(
                fixture.clone(),
                Arc::clone(&transport),
                config.timing(),
                tunables,
                events.clone(),
                state_tx,
            );
            let (handle, task) = FixtureHandle::spawn(controller, Arc::clone(&name), state_rx);
            by_name.insert(name, handles.len());
            handles.push(handle);
            tasks.push(task);
        }

        tracing::info!(fixtures = handles.len(), "Rig started");

        Self {
            handles,
            by_name,
            tasks,
            events,
            tunables,
        }
    }

    /// Returns the handle of the fixture named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FixtureNotFound`] if no fixture has that name.
    pub fn fixture(&self, name: &str) -> Result<&FixtureHandle, Error> {
        self.by_name
            .get(name)
            .and_then(|index| self.handles.get(*index))
            .ok_or_else(|| Error::FixtureNotFound(name.to_string()))
    }

    /// Returns every fixture handle in configuration order.
    #[must_use]
    pub fn fixtures(&self) -> &[FixtureHandle] {
        &self.handles
    }

    /// Returns the number of fixtures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if the rig drives no fixture.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns the tunables the rig runs with.
    #[must_use]
    pub const fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Subscribes to events from every fixture.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FixtureEvent> {
        self.events.subscribe()
    }

    /// Stops every controller and waits for the tasks to finish.
    ///
    /// Handles cloned out of the rig report
    /// [`Error::ControllerClosed`] afterwards.
    pub async fn shutdown(self) {
        for handle in &self.handles {
            handle.stop().await;
        }
        for (handle, task) in self.handles.iter().zip(self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(fixture = handle.name(), error = %e, "Controller task failed");
            }
        }
        tracing::info!("Rig stopped");
    }
}
