// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fade timing engine.
//!
//! - [`FadePlan`] - one transition, with progress derived from elapsed time
//! - [`FadeKind`] - the shape of a transition, chosen from its endpoints;
//!   hue fades between two colors run through CIE LCh(ab)
//! - [`FadeScheduler`] - runs one plan at a time, throttling emission
//! - [`FadeTiming`] - the internal check cadence and the emission cadence

mod hue;
mod plan;
mod scheduler;

pub use plan::{FadeKind, FadePlan};
pub(crate) use scheduler::{period_from_secs, require_positive};
pub use scheduler::{DEFAULT_CHECK_FPS, DEFAULT_FADE_FPS, FadeSample, FadeScheduler, FadeTiming};
