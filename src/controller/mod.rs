// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixture controllers.
//!
//! Each fixture is driven by one `tokio` task that owns its current state
//! and its [`FadeScheduler`](crate::FadeScheduler). Requests reach the task
//! through a [`FixtureHandle`] and are applied in arrival order. A request
//! that arrives mid-fade supersedes the running fade, starting from the
//! last state that was sent.

mod request;
mod task;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub use request::{LightRequest, Resolved, TurnOn, resolve_request};
pub(crate) use task::{Command, FixtureController};

use crate::error::Error;
use crate::types::ColorState;

/// Capacity of a controller's request queue.
pub(crate) const REQUEST_QUEUE_CAPACITY: usize = 32;

/// Cloneable handle to a running fixture controller.
///
/// # Examples
///
/// ```no_run
/// use dmx_fader::{FixtureHandle, TurnOn};
///
/// # async fn example(lamp: &FixtureHandle) -> dmx_fader::Result<()> {
/// lamp.turn_on(TurnOn::new().brightness(0.8).transition(2.0)).await?;
/// lamp.turn_off(Some(5.0)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FixtureHandle {
    name: Arc<str>,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ColorState>,
}

impl FixtureHandle {
    /// Spawns the controller task and returns a handle to it.
    pub(crate) fn spawn(
        controller: FixtureController,
        name: Arc<str>,
        state: watch::Receiver<ColorState>,
    ) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let task = tokio::spawn(controller.run(receiver));
        (
            Self {
                name,
                commands,
                state,
            },
            task,
        )
    }

    /// Returns the fixture name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Turns the light on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControllerClosed`] if the controller has stopped.
    pub async fn turn_on(&self, request: TurnOn) -> Result<(), Error> {
        self.request(LightRequest::TurnOn(request)).await
    }

    /// Turns the light off, keeping its color.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControllerClosed`] if the controller has stopped.
    pub async fn turn_off(&self, transition: Option<f64>) -> Result<(), Error> {
        self.request(LightRequest::TurnOff { transition }).await
    }

    /// Fades to an explicit state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControllerClosed`] if the controller has stopped.
    pub async fn set(&self, target: ColorState, transition: Option<f64>) -> Result<(), Error> {
        self.request(LightRequest::Set { target, transition }).await
    }

    /// Queues any request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControllerClosed`] if the controller has stopped.
    pub async fn request(&self, request: LightRequest) -> Result<(), Error> {
        tracing::debug!(fixture = %self.name, ?request, "Queueing light request");
        self.commands
            .send(Command::Request(request))
            .await
            .map_err(|_| Error::ControllerClosed(self.name.to_string()))
    }

    /// Returns the last state sent to the transport.
    #[must_use]
    pub fn state(&self) -> ColorState {
        *self.state.borrow()
    }

    /// Returns a receiver that sees every state sent to the transport.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ColorState> {
        self.state.clone()
    }

    /// Asks the controller to stop once the requests queued before are applied.
    pub(crate) async fn stop(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}
