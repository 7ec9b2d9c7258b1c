// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-fixture controller task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::config::Tunables;
use crate::encoder::encode_into;
use crate::event::{EventBus, FixtureEvent};
use crate::fade::{FadeSample, FadeScheduler, FadeTiming};
use crate::fixture::Fixture;
use crate::transport::DmxTransport;
use crate::types::{ColorState, normalize};

use super::request::{LightRequest, resolve_request};

/// Messages accepted by a controller task.
#[derive(Debug)]
pub(crate) enum Command {
    Request(LightRequest),
    Shutdown,
}

/// Owns one fixture: its scheduler, its output buffer and its timers.
pub(crate) struct FixtureController {
    fixture: Fixture,
    name: Arc<str>,
    transport: Arc<dyn DmxTransport>,
    scheduler: FadeScheduler,
    tunables: Tunables,
    events: EventBus,
    state_tx: watch::Sender<ColorState>,
    frame: Vec<u8>,
    fade_samples: u32,
    last_host_update: Option<Instant>,
}

impl FixtureController {
    pub(crate) fn new(
        fixture: Fixture,
        transport: Arc<dyn DmxTransport>,
        timing: FadeTiming,
        tunables: Tunables,
        events: EventBus,
        state_tx: watch::Sender<ColorState>,
    ) -> Self {
        let initial = *state_tx.borrow();
        Self {
            name: fixture.shared_name(),
            frame: Vec::with_capacity(fixture.fixture_type().footprint()),
            fixture,
            transport,
            scheduler: FadeScheduler::new(initial, timing),
            tunables,
            events,
            state_tx,
            fade_samples: 0,
            last_host_update: None,
        }
    }

    /// Runs until a shutdown command arrives or every handle is dropped.
    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut check = time::interval(self.scheduler.timing().check_interval());
        check.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut resend = self.tunables.resend_interval().map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        tracing::debug!(
            fixture = %self.name,
            universe = self.fixture.universe(),
            start_channel = self.fixture.start_channel(),
            resend = ?resend.as_ref().map(Interval::period),
            "Fixture controller started"
        );
        self.output();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Request(request)) => {
                        self.handle(&request, Instant::now());
                        check.reset();
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = check.tick(), if self.scheduler.is_fading() => {
                    self.check(Instant::now());
                }
                () = tick_optional(resend.as_mut()) => {
                    tracing::trace!(fixture = %self.name, "Refreshing output");
                    self.output();
                }
            }
        }

        tracing::debug!(fixture = %self.name, "Fixture controller stopped");
    }

    /// Starts the fade a request resolves to and emits its first sample if
    /// one is due.
    pub(crate) fn handle(&mut self, request: &LightRequest, now: Instant) {
        let resolved = resolve_request(request, self.scheduler.current(), &self.tunables);

        let target = match normalize(&resolved.target) {
            Ok(normalized) => ColorState::from(normalized),
            Err(e) => {
                tracing::warn!(fixture = %self.name, error = %e, "Clamping requested state");
                ColorState::from(resolved.target.clamped())
            }
        };

        let plan = self.scheduler.begin(target, resolved.transition_secs, now);
        if !plan.is_immediate() {
            self.events.publish(FixtureEvent::FadeStarted {
                fixture: Arc::clone(&self.name),
                kind: plan.kind(),
                target: *plan.target(),
                duration: plan.duration(),
            });
        }
        self.fade_samples = 0;
        self.last_host_update = None;

        self.check(now);
    }

    /// Ticks the scheduler and emits the sample it produces, if any.
    pub(crate) fn check(&mut self, now: Instant) {
        let immediate = self
            .scheduler
            .active_plan()
            .is_some_and(crate::fade::FadePlan::is_immediate);

        if let Some(sample) = self.scheduler.tick(now) {
            self.fade_samples += 1;
            self.emit(&sample, immediate);
        }
    }

    fn emit(&mut self, sample: &FadeSample, immediate: bool) {
        self.output();
        self.state_tx.send_replace(*sample.state());

        let interval = self.host_update_interval();
        let due = self
            .last_host_update
            .is_none_or(|last| sample.at().saturating_duration_since(last) >= interval);
        if sample.is_final() || due {
            self.events
                .publish(FixtureEvent::state_updated(Arc::clone(&self.name), *sample.state()));
            self.last_host_update = Some(sample.at());
        }

        if sample.is_final() && !immediate {
            self.events.publish(FixtureEvent::FadeCompleted {
                fixture: Arc::clone(&self.name),
                samples: self.fade_samples,
            });
        }
    }

    /// Encodes the last emitted state and hands it to the transport.
    pub(crate) fn output(&mut self) {
        let state = self.scheduler.current().clamped();
        self.frame.clear();
        encode_into(&state, self.fixture.fixture_type(), &mut self.frame);

        tracing::trace!(fixture = %self.name, payload = ?self.frame, "Sending frame");
        self.transport
            .send(self.fixture.universe(), self.fixture.start_channel(), &self.frame);
    }

    fn host_update_interval(&self) -> Duration {
        self.tunables.state_update_interval()
    }
}

async fn tick_optional(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
