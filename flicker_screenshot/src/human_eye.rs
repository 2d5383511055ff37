// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use flicker_core::geometry::Rect;

use crate::bitmap::color;
use crate::{BitmapMatcher, MatchError, MatchResult, check_sizes, in_regions};

/// Colour distance tolerated inside a block of differing pixels.
const THRESHOLD_BLOCK_OF_PIXELS: f64 = 3.0;
/// Colour distance tolerated along a two pixel wide line.
const THRESHOLD_2PX_LINE_OF_PIXELS: f64 = 10.0;
/// Colour distance tolerated along a one pixel wide line.
const THRESHOLD_1PX_LINE_OF_PIXELS: f64 = 12.0;
/// Colour distance tolerated for a lone pixel.
const THRESHOLD_ISOLATED_PIXEL: f64 = 40.0;

/// Marks a pixel outside every region.
const IGNORED: f64 = -1.0;

/// Tolerates differences a person would not notice.
///
/// Each pixel's colour distance is weighted per channel after Witzel,
/// Burnham and Onley. Pixels within the block threshold always match.
/// Others are allowed a threshold that depends on how many of their four
/// neighbours differ at least as much: a lone differing pixel may drift
/// up to 40, a block only up to 3.
///
/// With transparency handling, both colours are blended over white and
/// over black and the larger distance counts.
#[derive(Clone, Copy, Debug)]
pub struct HumanEyeMatcher {
    account_for_grouping: bool,
    account_for_transparency: bool,
}

impl Default for HumanEyeMatcher {
    fn default() -> Self {
        Self {
            account_for_grouping: true,
            account_for_transparency: true,
        }
    }
}

impl HumanEyeMatcher {
    /// Applies the block threshold to every pixel regardless of neighbours.
    #[must_use]
    pub fn without_grouping(mut self) -> Self {
        self.account_for_grouping = false;
        self
    }

    /// Compares raw channels without blending translucent pixels.
    #[must_use]
    pub fn without_transparency(mut self) -> Self {
        self.account_for_transparency = false;
        self
    }

    fn distance(&self, expected: u32, given: u32) -> f64 {
        if self.account_for_transparency {
            let over = |bg| color_diff(blend(expected, bg), blend(given, bg));
            over(color::WHITE).max(over(color::BLACK))
        } else {
            color_diff(expected, given)
        }
    }
}

impl BitmapMatcher for HumanEyeMatcher {
    fn compare_pixels(
        &self,
        expected: &[u32],
        given: &[u32],
        width: usize,
        height: usize,
        regions: &[Rect],
    ) -> Result<MatchResult, MatchError> {
        check_sizes(expected, given, width, height)?;

        let mut ignored = 0;
        let distances: Vec<f64> = expected
            .iter()
            .zip(given)
            .enumerate()
            .map(|(i, (&e, &g))| {
                if in_regions(regions, i % width, i / width) {
                    self.distance(e, g)
                } else {
                    ignored += 1;
                    IGNORED
                }
            })
            .collect();

        let diff = (0..distances.len())
            .map(|i| {
                let d = distances[i];
                let same = if d <= THRESHOLD_BLOCK_OF_PIXELS {
                    true
                } else if self.account_for_grouping {
                    d <= threshold(neighbouring_diffs(&distances, width, height, i))
                } else {
                    false
                };
                if same { color::TRANSPARENT } else { color::MAGENTA }
            })
            .collect();
        Ok(MatchResult::from_diff(width, height, diff, ignored))
    }
}

/// The loosest threshold `d` already fails, `None` for ignored pixels.
fn easiest_failed(d: f64) -> Option<f64> {
    if d == IGNORED {
        return None;
    }
    Some(
        [
            THRESHOLD_ISOLATED_PIXEL,
            THRESHOLD_1PX_LINE_OF_PIXELS,
            THRESHOLD_2PX_LINE_OF_PIXELS,
            THRESHOLD_BLOCK_OF_PIXELS,
        ]
        .into_iter()
        .find(|&t| d > t)
        .unwrap_or(0.0),
    )
}

/// Four minus the neighbours that fail a stricter threshold than pixel `i`.
///
/// Missing and ignored neighbours count as differing.
fn neighbouring_diffs(distances: &[f64], width: usize, height: usize, i: usize) -> usize {
    let (x, y) = (i % width, i / width);
    let Some(current) = easiest_failed(distances[i]) else {
        return 4;
    };
    let neighbours = [
        (y > 0).then(|| i - width),
        (y + 1 < height).then(|| i + width),
        (x > 0).then(|| i - 1),
        (x + 1 < width).then(|| i + 1),
    ];
    let calmer = neighbours
        .into_iter()
        .flatten()
        .filter_map(|n| easiest_failed(distances[n]))
        .filter(|&t| current > t)
        .count();
    4 - calmer
}

fn threshold(neighbouring_diffs: usize) -> f64 {
    match neighbouring_diffs {
        0 | 1 => THRESHOLD_ISOLATED_PIXEL,
        2 => THRESHOLD_1PX_LINE_OF_PIXELS,
        3 => THRESHOLD_2PX_LINE_OF_PIXELS,
        _ => THRESHOLD_BLOCK_OF_PIXELS,
    }
}

/// Weighted Euclidean distance between two opaque colours.
fn color_diff(a: u32, b: u32) -> f64 {
    let channel = |f: fn(u32) -> u8| (i32::from(f(a)), i32::from(f(b)));
    let (ra, rb) = channel(color::red);
    let (ga, gb) = channel(color::green);
    let (ba, bb) = channel(color::blue);
    let (red, green, blue) = (ra - rb, ga - gb, ba - bb);
    let (red_scalar, blue_scalar) = if (ra + rb) / 2 < 128 { (2, 3) } else { (3, 2) };
    let sum = red_scalar * red * red + 4 * green * green + blue_scalar * blue * blue;
    f64::from(sum).sqrt()
}

/// `color` composited over the opaque `background`.
fn blend(color: u32, background: u32) -> u32 {
    let alpha = color::alpha(color);
    if alpha == u8::MAX {
        return color;
    }
    if alpha == 0 {
        return background;
    }
    let a = f32::from(alpha) / 255.0;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "blended channel is within 0..=255"
    )]
    let mix = |f: fn(u32) -> u8| {
        let v = a * f32::from(f(color)) + (1.0 - a) * f32::from(f(background));
        (v + 0.5) as u8
    };
    color::argb(u8::MAX, mix(color::red), mix(color::green), mix(color::blue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bitmap;
    use proptest::prelude::*;

    const GREY: u32 = 0xff_80_80_80;

    /// `GREY` with the red channel raised by `step`.
    fn redder(step: u8) -> u32 {
        color::argb(0xff, 0x80 + step, 0x80, 0x80)
    }

    fn compare(expected: &Bitmap, given: &Bitmap) -> MatchResult {
        HumanEyeMatcher::default().compare(expected, given, &[]).unwrap()
    }

    #[test]
    fn isolated_pixels_may_drift_further_than_blocks() {
        let expected = Bitmap::filled(5, 5, GREY);
        // A distance of about 27.7: over 12, under 40.
        let mut lone = expected.clone();
        lone.set(2, 2, redder(16));
        assert!(compare(&expected, &lone).matches, "lone pixel tolerated");

        let block = Bitmap::filled(5, 5, redder(16));
        let result = compare(&expected, &block);
        assert!(!result.matches, "same drift over a block is visible");
        assert_eq!(result.stats.different, 25, "every pixel marked");
    }

    #[test]
    fn grouping_can_be_disabled() {
        let expected = Bitmap::filled(3, 3, GREY);
        let mut lone = expected.clone();
        lone.set(1, 1, redder(16));
        let strict = HumanEyeMatcher::default().without_grouping();
        let result = strict.compare(&expected, &lone, &[]).unwrap();
        assert_eq!(result.stats.different, 1, "block threshold everywhere");
    }

    #[test]
    fn transparent_pixels_compare_over_both_backgrounds() {
        let expected = Bitmap::filled(2, 2, color::TRANSPARENT);
        let given = Bitmap::filled(2, 2, 0x00_ff_00_00);
        assert!(compare(&expected, &given).matches, "invisible colour change");

        let translucent = Bitmap::filled(2, 2, 0x80_ff_ff_ff);
        assert!(!compare(&expected, &translucent).matches, "visible over black");
        let plain = HumanEyeMatcher::default().without_transparency();
        assert!(
            !plain.compare(&expected, &given, &[]).unwrap().matches,
            "raw channels differ"
        );
    }

    #[test]
    fn ignored_pixels_do_not_count() {
        let expected = Bitmap::filled(4, 1, color::BLACK);
        let given = Bitmap::filled(4, 1, color::WHITE);
        let result = HumanEyeMatcher::default()
            .compare(&expected, &given, &[Rect::new(0, 0, 0, 0)])
            .unwrap();
        assert_eq!(result.stats.ignored, 3, "only the first pixel compared");
        assert_eq!(result.stats.different, 1, "and it differs");
        assert_eq!(result.stats.identical, 0, "nothing identical");
    }

    proptest! {
        #[test]
        fn distance_is_symmetric_and_zero_on_equal(a in any::<u32>(), b in any::<u32>()) {
            let m = HumanEyeMatcher::default();
            prop_assert!((m.distance(a, b) - m.distance(b, a)).abs() < 1e-9, "symmetric");
            prop_assert_eq!(m.distance(a, a), 0.0, "reflexive");
        }

        #[test]
        fn small_drifts_always_match(step in 0_u8..=1, w in 1_usize..6, h in 1_usize..6) {
            let expected = Bitmap::filled(w, h, GREY);
            let given = Bitmap::filled(w, h, redder(step));
            prop_assert!(compare(&expected, &given).matches, "within the block threshold");
        }
    }
}
