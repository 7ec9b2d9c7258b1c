// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for light control.
//!
//! # Types
//!
//! - [`ColorState`] - Brightness, hue, saturation, color temperature and on/off
//! - [`NormalizedState`] - A [`ColorState`] checked or clamped into its domain
//!
//! # Functions
//!
//! - [`normalize`] - Strict validation into a [`NormalizedState`]
//! - [`interpolate`] - Per-field linear interpolation between two states

mod color;

pub use color::{ColorState, HUE_DEGREES, NormalizedState, interpolate, normalize};
pub(crate) use color::wrap_hue;
