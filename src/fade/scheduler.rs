// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fade scheduling with drift correction.
//!
//! The host cannot promise when a timer fires, so stepping a fade by a fixed
//! fraction per tick would drift. Instead the scheduler is ticked often (the
//! check cadence) and recomputes progress from the monotonic clock on every
//! tick. Emission happens on a fixed grid of slots, one emission interval
//! apart and anchored at the plan start: a tick produces a sample only once
//! the next slot has been reached, or when the plan has completed. Slots a
//! late loop missed are skipped rather than caught up, and anchoring to the
//! grid instead of to the tick keeps timer granularity from lowering the
//! rate. The completing sample is the target itself and is produced exactly
//! once.
//!
//! [`FadeScheduler`] is a plain state machine: it never reads the clock
//! itself, which keeps it deterministic under test. The fixture controller
//! drives it from a `tokio` interval.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::ConfigError;
use crate::types::ColorState;

use super::plan::FadePlan;

/// Default internal check cadence, in ticks per second.
pub const DEFAULT_CHECK_FPS: f64 = 240.0;

/// Default emission cadence, in samples per second.
pub const DEFAULT_FADE_FPS: f64 = 60.0;

/// The two cadences a fade runs at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeTiming {
    check_fps: f64,
    intended_fade_fps: f64,
    check_interval: Duration,
    emit_interval: Duration,
}

impl FadeTiming {
    /// Creates a timing from the check and emission rates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveTunable`] if either rate is not a
    /// positive finite number, or if its period rounds to zero or does not
    /// fit a [`Duration`].
    pub fn new(check_fps: f64, intended_fade_fps: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            check_fps,
            intended_fade_fps,
            check_interval: period_of("check_fps", check_fps)?,
            emit_interval: period_of("intended_fade_fps", intended_fade_fps)?,
        })
    }

    /// Returns the internal check rate.
    #[must_use]
    pub const fn check_fps(&self) -> f64 {
        self.check_fps
    }

    /// Returns the emission rate.
    #[must_use]
    pub const fn intended_fade_fps(&self) -> f64 {
        self.intended_fade_fps
    }

    /// Returns the period of the internal check loop.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Returns the minimum time between two emitted samples.
    #[must_use]
    pub const fn emit_interval(&self) -> Duration {
        self.emit_interval
    }
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self {
            check_fps: DEFAULT_CHECK_FPS,
            intended_fade_fps: DEFAULT_FADE_FPS,
            check_interval: Duration::from_secs_f64(DEFAULT_CHECK_FPS.recip()),
            emit_interval: Duration::from_secs_f64(DEFAULT_FADE_FPS.recip()),
        }
    }
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveTunable { name, value })
    }
}

/// Converts a positive period in seconds into a non-zero [`Duration`].
pub(crate) fn period_from_secs(name: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    require_positive(name, secs)?;
    match Duration::try_from_secs_f64(secs) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(ConfigError::NonPositiveTunable { name, value: secs }),
    }
}

fn period_of(name: &'static str, per_second: f64) -> Result<Duration, ConfigError> {
    require_positive(name, per_second)?;
    period_from_secs(name, per_second.recip())
        .map_err(|_| ConfigError::NonPositiveTunable { name, value: per_second })
}

/// One state produced by a fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSample {
    at: Instant,
    state: ColorState,
    progress: f64,
    is_final: bool,
}

impl FadeSample {
    /// Returns the tick instant the sample was produced at.
    ///
    /// This is at or after the emission slot the sample stands for.
    #[must_use]
    pub const fn at(&self) -> Instant {
        self.at
    }

    /// Returns the state to show.
    #[must_use]
    pub const fn state(&self) -> &ColorState {
        &self.state
    }

    /// Returns the plan progress in [0, 1].
    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Returns true for the sample that completes the plan.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.is_final
    }
}

#[derive(Debug)]
struct ActiveFade {
    plan: FadePlan,
    next_slot: Instant,
    emitted: u32,
}

/// Drives at most one [`FadePlan`] at a time.
///
/// Starting a new plan replaces the running one. The replacement starts from
/// the last emitted state, and the replaced plan can no longer emit anything.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use dmx_fader::{ColorState, FadeScheduler, FadeTiming};
///
/// let mut scheduler = FadeScheduler::new(ColorState::off(3000), FadeTiming::default());
/// let t0 = Instant::now();
/// let target = ColorState::on(1.0, 0.0, 0.0, 3000);
/// scheduler.begin(target, 0.0, t0);
///
/// let sample = scheduler.tick(t0).unwrap();
/// assert_eq!(*sample.state(), target);
/// assert!(sample.is_final());
/// assert!(scheduler.tick(t0 + Duration::from_millis(5)).is_none());
/// ```
#[derive(Debug)]
pub struct FadeScheduler {
    timing: FadeTiming,
    current: ColorState,
    active: Option<ActiveFade>,
}

impl FadeScheduler {
    /// Creates an idle scheduler showing `initial`.
    #[must_use]
    pub const fn new(initial: ColorState, timing: FadeTiming) -> Self {
        Self {
            timing,
            current: initial,
            active: None,
        }
    }

    /// Returns the cadences.
    #[must_use]
    pub const fn timing(&self) -> FadeTiming {
        self.timing
    }

    /// Returns the last emitted state.
    #[must_use]
    pub const fn current(&self) -> &ColorState {
        &self.current
    }

    /// Returns the running plan, if any.
    #[must_use]
    pub fn active_plan(&self) -> Option<&FadePlan> {
        self.active.as_ref().map(|active| &active.plan)
    }

    /// Returns true while a plan is running.
    #[must_use]
    pub const fn is_fading(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a plan towards `target`, replacing any running plan.
    ///
    /// The plan starts from the last emitted state.
    pub fn begin(&mut self, target: ColorState, duration_secs: f64, now: Instant) -> &FadePlan {
        if let Some(previous) = self.active.take() {
            tracing::debug!(
                emitted = previous.emitted,
                target = %previous.plan.target(),
                "Superseding running fade"
            );
        }

        let plan = FadePlan::new(self.current, target, duration_secs, now);
        tracing::debug!(
            kind = %plan.kind(),
            start = %plan.start(),
            target = %plan.target(),
            duration_ms = plan.duration().as_millis(),
            "Starting fade"
        );

        &self
            .active
            .insert(ActiveFade {
                plan,
                next_slot: now + self.timing.emit_interval(),
                emitted: 0,
            })
            .plan
    }

    /// Abandons the running plan without emitting anything more.
    ///
    /// The current state stays at the last emitted sample.
    pub fn cancel(&mut self) -> Option<FadePlan> {
        self.active.take().map(|active| active.plan)
    }

    /// Re-evaluates the running plan at `now`.
    ///
    /// Returns a sample if one is due: either the next emission slot has
    /// been reached, or the plan has completed. Returns `None` when idle.
    pub fn tick(&mut self, now: Instant) -> Option<FadeSample> {
        let active = self.active.as_mut()?;

        let progress = active.plan.progress_at(now);
        let is_final = progress >= 1.0;
        if !is_final {
            if now < active.next_slot {
                return None;
            }
            let interval = self.timing.emit_interval();
            let behind = now.saturating_duration_since(active.next_slot);
            let steps = behind.as_nanos() / interval.as_nanos().max(1) + 1;
            let steps = u32::try_from(steps).unwrap_or(u32::MAX);
            active.next_slot += interval.saturating_mul(steps);
        }

        let state = active.plan.state_at(progress);
        active.emitted += 1;
        self.current = state;

        if is_final {
            let duration = active.plan.duration().as_secs_f64();
            let emitted = active.emitted;
            if duration > 0.0 {
                tracing::debug!(
                    intended_fps = self.timing.intended_fade_fps,
                    actual_fps = f64::from(emitted) / duration,
                    "Fade complete"
                );
            } else {
                tracing::debug!("Fade applied immediately");
            }
            self.active = None;
        }

        Some(FadeSample {
            at: now,
            state,
            progress,
            is_final,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn start_state() -> ColorState {
        ColorState::on(0.1, 20.0, 0.5, 2700)
    }

    fn target_state() -> ColorState {
        ColorState::on(0.9, 60.0, 0.7, 5000)
    }

    /// Ticks every `step` from `from` until `until`, skipping ticks for which
    /// `skip` returns true, and collects the samples.
    fn run(
        scheduler: &mut FadeScheduler,
        from: Instant,
        until: Duration,
        step: Duration,
        skip: impl Fn(u32) -> bool,
    ) -> Vec<FadeSample> {
        let mut samples = Vec::new();
        let mut index = 0;
        let mut offset = Duration::ZERO;
        while offset <= until {
            if !skip(index) {
                if let Some(sample) = scheduler.tick(from + offset) {
                    samples.push(sample);
                }
            }
            index += 1;
            offset += step;
        }
        samples
    }

    #[test]
    fn timing_rejects_non_positive_rates() {
        assert!(matches!(
            FadeTiming::new(0.0, 60.0),
            Err(ConfigError::NonPositiveTunable { name: "check_fps", .. })
        ));
        assert!(matches!(
            FadeTiming::new(240.0, -1.0),
            Err(ConfigError::NonPositiveTunable { name: "intended_fade_fps", .. })
        ));
        assert!(FadeTiming::new(240.0, f64::NAN).is_err());
        assert!(FadeTiming::new(240.0, 60.0).is_ok());
    }

    #[test]
    fn timing_rejects_unusable_periods() {
        // a period below one nanosecond rounds to zero
        assert!(matches!(
            FadeTiming::new(1e10, 60.0),
            Err(ConfigError::NonPositiveTunable { name: "check_fps", .. })
        ));
        assert!(matches!(
            FadeTiming::new(240.0, 1e12),
            Err(ConfigError::NonPositiveTunable { name: "intended_fade_fps", .. })
        ));
        // a period too long for a Duration
        assert!(matches!(
            FadeTiming::new(1e-30, 60.0),
            Err(ConfigError::NonPositiveTunable { name: "check_fps", .. })
        ));
    }

    #[test]
    fn timing_intervals() {
        let timing = FadeTiming::new(250.0, 50.0).unwrap();
        assert_eq!(timing.check_interval(), ms(4));
        assert_eq!(timing.emit_interval(), ms(20));
    }

    #[test]
    fn idle_scheduler_emits_nothing() {
        let mut scheduler = FadeScheduler::new(start_state(), FadeTiming::default());
        assert!(!scheduler.is_fading());
        assert!(scheduler.tick(Instant::now()).is_none());
    }

    #[test]
    fn zero_duration_emits_target_once() {
        let mut scheduler = FadeScheduler::new(start_state(), FadeTiming::default());
        let t0 = Instant::now();
        scheduler.begin(target_state(), 0.0, t0);

        let samples = run(&mut scheduler, t0, ms(100), ms(4), |_| false);
        assert_eq!(samples.len(), 1);
        assert_eq!(*samples[0].state(), target_state());
        assert!(samples[0].is_final());
        assert_eq!(*scheduler.current(), target_state());
    }

    #[test]
    fn two_second_fade_with_steady_ticks() {
        let timing = FadeTiming::new(240.0, 60.0).unwrap();
        let mut scheduler = FadeScheduler::new(start_state(), timing);
        let t0 = Instant::now();
        scheduler.begin(target_state(), 2.0, t0);

        let samples = run(&mut scheduler, t0, Duration::from_secs(3), timing.check_interval(), |_| false);

        assert!(samples[0].at() - t0 >= timing.emit_interval());
        let last = samples.last().unwrap();
        assert_eq!(*last.state(), target_state());
        assert_eq!(samples.iter().filter(|s| s.is_final()).count(), 1);
        assert!(!scheduler.is_fading());
        // roughly 60 samples per second of fade
        assert!((100..=121).contains(&samples.len()), "emitted {}", samples.len());
    }

    #[test]
    fn jitter_does_not_distort_fade() {
        let timing = FadeTiming::new(240.0, 60.0).unwrap();
        let mut scheduler = FadeScheduler::new(start_state(), timing);
        let t0 = Instant::now();
        scheduler.begin(target_state(), 2.0, t0);

        // irregular steps with bursts of dropped ticks
        let samples = run(&mut scheduler, t0, Duration::from_millis(2600), ms(3), |i| {
            i % 7 == 3 || (100..140).contains(&i) || i % 11 == 0
        });

        for pair in samples.windows(2) {
            assert!(pair[1].progress() >= pair[0].progress());
        }
        // the n-th sample never comes before the n-th slot
        for (n, sample) in (1u32..).zip(samples.iter().filter(|s| !s.is_final())) {
            assert!(sample.at() - t0 >= timing.emit_interval() * n);
        }
        assert!(samples.len() <= 121);
        for sample in &samples {
            let expected = ((sample.at() - t0).as_secs_f64() / 2.0).min(1.0);
            assert!((sample.progress() - expected).abs() < 1e-9);
        }

        let finals: Vec<_> = samples.iter().filter(|s| s.is_final()).collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(*samples.last().unwrap().state(), target_state());
    }

    #[test]
    fn late_tick_completes_in_one_sample() {
        let mut scheduler = FadeScheduler::new(start_state(), FadeTiming::default());
        let t0 = Instant::now();
        scheduler.begin(target_state(), 1.0, t0);

        let sample = scheduler.tick(t0 + Duration::from_secs(30)).unwrap();
        assert!(sample.is_final());
        assert_eq!(*sample.state(), target_state());
        assert!(scheduler.tick(t0 + Duration::from_secs(31)).is_none());
    }

    #[test]
    fn clock_going_backwards_counts_as_no_progress() {
        let mut scheduler = FadeScheduler::new(start_state(), FadeTiming::default());
        let t0 = Instant::now() + Duration::from_secs(10);
        scheduler.begin(target_state(), 1.0, t0);

        assert!(scheduler.tick(t0 - Duration::from_secs(5)).is_none());
        assert!(scheduler.is_fading());

        let sample = scheduler.tick(t0 + ms(500)).unwrap();
        assert!((sample.progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn superseding_starts_from_last_emitted_sample() {
        let timing = FadeTiming::new(240.0, 60.0).unwrap();
        let mut scheduler = FadeScheduler::new(start_state(), timing);
        let t0 = Instant::now();
        scheduler.begin(target_state(), 2.0, t0);

        let first = run(&mut scheduler, t0, ms(800), ms(4), |_| false);
        let last_emitted = *first.last().unwrap().state();
        assert_ne!(last_emitted, target_state());

        let replacement = ColorState::on(0.3, 60.0, 0.7, 3000);
        let t1 = t0 + ms(801);
        let plan = scheduler.begin(replacement, 1.0, t1);
        assert_eq!(*plan.start(), last_emitted);

        let second = run(&mut scheduler, t1, Duration::from_secs(2), ms(4), |_| false);
        assert!(second.iter().all(|s| *s.state() != target_state()));
        assert_eq!(*second.last().unwrap().state(), replacement);
        assert_eq!(second.iter().filter(|s| s.is_final()).count(), 1);
    }

    #[test]
    fn cancel_keeps_last_emitted_state() {
        let mut scheduler = FadeScheduler::new(start_state(), FadeTiming::default());
        let t0 = Instant::now();
        scheduler.begin(target_state(), 1.0, t0);
        let sample = scheduler.tick(t0 + ms(500)).unwrap();

        let cancelled = scheduler.cancel().unwrap();
        assert_eq!(*cancelled.target(), target_state());
        assert_eq!(scheduler.current(), sample.state());
        assert!(scheduler.tick(t0 + Duration::from_secs(2)).is_none());
    }
}
