// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A single transition between two color states.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{ColorState, interpolate};

use super::hue::HuePath;

/// Shape of a fade, decided once when the plan is created.
///
/// Some fixtures show visible artifacts when color fields move while the
/// light is dark or desaturated, so those fields are switched at the dark or
/// desaturated end of the fade instead of being interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeKind {
    /// From black to lit: color fields jump to the target, brightness fades.
    OffToOn,
    /// From lit to black: brightness fades, color fields switch at the end.
    OnToOff,
    /// From white to a color: hue jumps to the target, the rest fades.
    UnsaturatedToSaturated,
    /// From a color to white: hue is held until the end, the rest fades.
    SaturatedToUnsaturated,
    /// Hue changes between two colors: brightness, hue and saturation fade
    /// through CIE LCh(ab), color temperature fades on its own.
    HueFade,
    /// Anything else: every field fades.
    Other,
}

impl FadeKind {
    /// Classifies the transition from `start` to `target`.
    ///
    /// Brightness is compared as shown, so an off light counts as black.
    #[must_use]
    pub fn classify(start: &ColorState, target: &ColorState) -> Self {
        let from = start.visible_brightness();
        let to = target.visible_brightness();

        if from <= 0.0 && to > 0.0 {
            Self::OffToOn
        } else if from > 0.0 && to <= 0.0 {
            Self::OnToOff
        } else if start.saturation() <= 0.0 && target.saturation() > 0.0 {
            Self::UnsaturatedToSaturated
        } else if start.saturation() > 0.0 && target.saturation() <= 0.0 {
            Self::SaturatedToUnsaturated
        } else if start.saturation() > 0.0 && (start.hue() - target.hue()).abs() > f64::EPSILON {
            Self::HueFade
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for FadeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OffToOn => "off to on",
            Self::OnToOff => "on to off",
            Self::UnsaturatedToSaturated => "unsaturated to saturated",
            Self::SaturatedToUnsaturated => "saturated to unsaturated",
            Self::HueFade => "hue",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A transition from `start` to `target` over `duration`, anchored at
/// `started_at` on the monotonic clock.
///
/// Progress is always derived from elapsed time, never from how many times
/// the plan has been sampled.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use dmx_fader::{ColorState, FadePlan};
///
/// let start = Instant::now();
/// let plan = FadePlan::new(
///     ColorState::on(0.0, 0.0, 0.0, 3000),
///     ColorState::on(1.0, 0.0, 0.0, 3000),
///     2.0,
///     start,
/// );
/// assert_eq!(plan.progress_at(start + Duration::from_secs(1)), 0.5);
/// assert_eq!(plan.progress_at(start + Duration::from_secs(5)), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FadePlan {
    start: ColorState,
    target: ColorState,
    duration: Duration,
    started_at: Instant,
    kind: FadeKind,
    hue_path: Option<HuePath>,
}

impl FadePlan {
    /// Creates a plan.
    ///
    /// A duration that is zero, negative or not finite makes an immediate
    /// plan, which is complete as soon as it is sampled.
    #[must_use]
    pub fn new(start: ColorState, target: ColorState, duration_secs: f64, started_at: Instant) -> Self {
        let kind = FadeKind::classify(&start, &target);
        Self {
            start,
            target,
            duration: duration_from_secs(duration_secs),
            started_at,
            kind,
            hue_path: (kind == FadeKind::HueFade).then(|| HuePath::new(&start, &target)),
        }
    }

    /// Returns the state the plan starts from.
    #[must_use]
    pub const fn start(&self) -> &ColorState {
        &self.start
    }

    /// Returns the state the plan ends at.
    #[must_use]
    pub const fn target(&self) -> &ColorState {
        &self.target
    }

    /// Returns the transition duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the instant the plan was started.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the fade shape.
    #[must_use]
    pub const fn kind(&self) -> FadeKind {
        self.kind
    }

    /// Returns true if the plan completes on its first sample.
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        self.duration.is_zero()
    }

    /// Returns the progress in [0, 1] at `now`.
    ///
    /// An instant before `started_at` counts as no time elapsed.
    #[must_use]
    pub fn progress_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Returns the state to show at the given progress.
    ///
    /// Progress 1 returns the target unchanged and progress 0 the start.
    #[must_use]
    pub fn state_at(&self, progress: f64) -> ColorState {
        if progress >= 1.0 {
            return self.target;
        }
        if progress.is_nan() || progress <= 0.0 {
            return self.start;
        }

        let state = interpolate(&self.start.visible(), &self.target.visible(), progress);
        match self.kind {
            FadeKind::OffToOn => with_color_of(state, &self.target),
            FadeKind::OnToOff => with_color_of(state, &self.start),
            FadeKind::UnsaturatedToSaturated => state.with_hue(self.target.hue()),
            FadeKind::SaturatedToUnsaturated => state.with_hue(self.start.hue()),
            FadeKind::HueFade => match &self.hue_path {
                Some(path) => {
                    let (brightness, hue, saturation) = path.at(progress);
                    state
                        .with_brightness(brightness)
                        .with_hue(hue)
                        .with_saturation(saturation)
                }
                None => state,
            },
            FadeKind::Other => state,
        }
    }
}

fn with_color_of(state: ColorState, source: &ColorState) -> ColorState {
    state
        .with_hue(source.hue())
        .with_saturation(source.saturation())
        .with_color_temp_kelvin(source.color_temp_kelvin())
}

fn duration_from_secs(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(start: ColorState, target: ColorState) -> FadePlan {
        FadePlan::new(start, target, 1.0, Instant::now())
    }

    #[test]
    fn classify_kinds() {
        let off = ColorState::off(3000);
        let white = ColorState::on(0.5, 0.0, 0.0, 3000);
        let red = ColorState::on(0.5, 0.0, 1.0, 3000);
        let blue = ColorState::on(0.5, 240.0, 1.0, 3000);
        let dimmer_red = ColorState::on(0.2, 0.0, 1.0, 3000);

        assert_eq!(FadeKind::classify(&off, &red), FadeKind::OffToOn);
        assert_eq!(FadeKind::classify(&red, &off), FadeKind::OnToOff);
        assert_eq!(FadeKind::classify(&red.turned_off(), &red), FadeKind::OffToOn);
        assert_eq!(FadeKind::classify(&white, &red), FadeKind::UnsaturatedToSaturated);
        assert_eq!(FadeKind::classify(&blue, &white), FadeKind::SaturatedToUnsaturated);
        assert_eq!(FadeKind::classify(&red, &blue), FadeKind::HueFade);
        assert_eq!(FadeKind::classify(&red, &dimmer_red), FadeKind::Other);
    }

    #[test]
    fn non_positive_duration_is_immediate() {
        let now = Instant::now();
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let plan = FadePlan::new(ColorState::off(3000), ColorState::off(4000), secs, now);
            assert!(plan.is_immediate());
            assert_eq!(plan.progress_at(now), 1.0);
        }
    }

    #[test]
    fn progress_before_start_is_zero() {
        let now = Instant::now();
        let plan = FadePlan::new(ColorState::off(3000), ColorState::off(4000), 1.0, now + Duration::from_secs(1));
        assert_eq!(plan.progress_at(now), 0.0);
    }

    #[test]
    fn endpoints_are_exact() {
        let start = ColorState::on(0.33, 12.0, 0.4, 2100);
        let target = ColorState::on(0.77, 100.0, 0.9, 5100);
        let plan = plan(start, target);
        assert_eq!(plan.state_at(0.0), start);
        assert_eq!(plan.state_at(1.0), target);
    }

    #[test]
    fn off_to_on_fades_brightness_from_black() {
        let start = ColorState::on(0.9, 10.0, 0.2, 2000).turned_off();
        let target = ColorState::on(0.8, 200.0, 0.6, 6000);
        let mid = plan(start, target).state_at(0.5);

        assert!(mid.is_on());
        assert!((mid.brightness() - 0.4).abs() < 1e-12);
        assert_eq!(mid.hue(), 200.0);
        assert_eq!(mid.saturation(), 0.6);
        assert_eq!(mid.color_temp_kelvin(), 6000);
    }

    #[test]
    fn on_to_off_holds_color_until_the_end() {
        let start = ColorState::on(0.8, 200.0, 0.6, 6000);
        let target = ColorState::off(2000);
        let plan = plan(start, target);

        let mid = plan.state_at(0.75);
        assert!(mid.is_on());
        assert!((mid.brightness() - 0.2).abs() < 1e-12);
        assert_eq!(mid.hue(), 200.0);
        assert_eq!(mid.color_temp_kelvin(), 6000);

        assert_eq!(plan.state_at(1.0), target);
    }

    #[test]
    fn saturation_fades_switch_hue_on_the_white_side() {
        let white = ColorState::on(1.0, 0.0, 0.0, 4000);
        let green = ColorState::on(1.0, 120.0, 1.0, 4000);

        let up = plan(white, green).state_at(0.5);
        assert_eq!(up.hue(), 120.0);
        assert!((up.saturation() - 0.5).abs() < 1e-12);

        let down = plan(green, white).state_at(0.5);
        assert_eq!(down.hue(), 120.0);
        assert!((down.saturation() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn hue_fade_wraps() {
        let a = ColorState::on(1.0, 350.0, 1.0, 4000);
        let b = ColorState::on(1.0, 10.0, 1.0, 4000);
        let plan = plan(a, b);
        assert_eq!(plan.kind(), FadeKind::HueFade);

        let hue = plan.state_at(0.5).hue();
        assert!(hue >= 340.0 || hue <= 20.0, "{hue}");
    }

    #[test]
    fn hue_fade_runs_through_lch() {
        let red = ColorState::on(1.0, 0.0, 1.0, 3000);
        let blue = ColorState::on(0.8, 240.0, 0.9, 5000);
        let plan = plan(red, blue);
        assert_eq!(plan.kind(), FadeKind::HueFade);

        let mid = plan.state_at(0.5);
        let hsv_mid = interpolate(&red, &blue, 0.5);
        assert_ne!(mid, hsv_mid);
        assert!(mid.is_on());
        assert!((0.0..360.0).contains(&mid.hue()));
        assert!((0.0..=1.0).contains(&mid.saturation()));
        assert!((0.0..=1.0).contains(&mid.brightness()));
        // color temperature keeps its own linear fade
        assert_eq!(mid.color_temp_kelvin(), 4000);

        assert_eq!(plan.state_at(0.0), red);
        assert_eq!(plan.state_at(1.0), blue);
    }

    #[test]
    fn grey_hue_change_is_not_a_hue_fade() {
        let a = ColorState::on(0.5, 10.0, 0.0, 3000);
        let b = ColorState::on(0.7, 200.0, 0.0, 3000);
        assert_eq!(FadeKind::classify(&a, &b), FadeKind::Other);
    }
}
