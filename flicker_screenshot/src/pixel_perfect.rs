// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use flicker_core::geometry::Rect;

use crate::bitmap::color;
use crate::{BitmapMatcher, MatchError, MatchResult, check_sizes, in_regions};

/// Matches only identical ARGB values.
#[derive(Clone, Copy, Debug, Default)]
pub struct PixelPerfectMatcher;

impl BitmapMatcher for PixelPerfectMatcher {
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
        let diff = expected
            .iter()
            .zip(given)
            .enumerate()
            .map(|(i, (e, g))| {
                if !in_regions(regions, i % width, i / width) {
                    ignored += 1;
                    color::TRANSPARENT
                } else if e == g {
                    color::TRANSPARENT
                } else {
                    color::MAGENTA
                }
            })
            .collect();
        Ok(MatchResult::from_diff(width, height, diff, ignored))
    }
}
