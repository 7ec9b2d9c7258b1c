// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Perceptual hue fades.
//!
//! Interpolating hue in HSV makes some arcs look uneven: a red to blue fade
//! sweeps through a long stretch of similar magentas and then rushes through
//! the rest. A hue fade instead maps both endpoints to CIE LCh(ab), moves
//! lightness and chroma linearly and hue along the shorter arc, and maps each
//! sample back to HSV.

use palette::encoding::Srgb;
use palette::white_point::D65;
use palette::{FromColor, Hsv, Lch, Mix};

use crate::types::{ColorState, wrap_hue};

type HsvColor = Hsv<Srgb, f64>;
type LchColor = Lch<D65, f64>;

/// The LCh endpoints of a hue fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HuePath {
    start: LchColor,
    target: LchColor,
}

impl HuePath {
    pub(crate) fn new(start: &ColorState, target: &ColorState) -> Self {
        Self {
            start: to_lch(start),
            target: to_lch(target),
        }
    }

    /// Returns brightness, hue and saturation at `progress`.
    pub(crate) fn at(&self, progress: f64) -> (f64, f64, f64) {
        let hsv = HsvColor::from_color(self.start.mix(self.target, progress));
        (
            hsv.value,
            wrap_hue(hsv.hue.into_positive_degrees()),
            hsv.saturation,
        )
    }
}

fn to_lch(state: &ColorState) -> LchColor {
    LchColor::from_color(HsvColor::new(
        state.hue(),
        state.saturation(),
        state.visible_brightness(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hue_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn endpoints_round_trip() {
        let start = ColorState::on(0.8, 30.0, 0.9, 3000);
        let target = ColorState::on(0.5, 200.0, 0.6, 3000);
        let path = HuePath::new(&start, &target);

        let (brightness, hue, saturation) = path.at(0.0);
        assert!((brightness - 0.8).abs() < 1e-6);
        assert!(hue_distance(hue, 30.0) < 1e-4);
        assert!((saturation - 0.9).abs() < 1e-6);

        let (brightness, hue, saturation) = path.at(1.0);
        assert!((brightness - 0.5).abs() < 1e-6);
        assert!(hue_distance(hue, 200.0) < 1e-4);
        assert!((saturation - 0.6).abs() < 1e-6);
    }

    #[test]
    fn red_to_blue_avoids_the_green_side() {
        let red = ColorState::on(1.0, 0.0, 1.0, 3000);
        let blue = ColorState::on(1.0, 240.0, 1.0, 3000);
        let path = HuePath::new(&red, &blue);

        for step in 1..10 {
            let (_, hue, _) = path.at(f64::from(step) / 10.0);
            assert!(!(30.0..210.0).contains(&hue), "hue {hue} at step {step}");
        }
    }
}
