// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-diff matchers for screenshot tests.
//!
//! A [`BitmapMatcher`] compares an expected and a captured [`Bitmap`] and
//! returns a [`MatchResult`]: whether they match, how many pixels were
//! compared, identical, different or ignored, and a diff image painting
//! the differing pixels magenta.
//!
//! - [`PixelPerfectMatcher`] requires identical ARGB values.
//! - [`HumanEyeMatcher`] tolerates differences a person would not notice.
//!   Isolated pixels may drift further than lines or blocks of pixels.
//!
//! Comparisons can be restricted to regions; pixels outside every region
//! are ignored. Region edges are inclusive.
//!
//! ```
//! use flicker_screenshot::{Bitmap, BitmapMatcher, HumanEyeMatcher};
//!
//! let expected = Bitmap::filled(4, 4, 0xff_80_80_80);
//! let mut given = expected.clone();
//! given.set(1, 1, 0xff_84_80_80);
//!
//! let result = HumanEyeMatcher::default().compare(&expected, &given, &[]).unwrap();
//! assert!(result.matches);
//! assert_eq!(result.stats.identical, 16);
//! ```

mod bitmap;
mod human_eye;
mod pixel_perfect;

pub use bitmap::{Bitmap, color};
pub use human_eye::HumanEyeMatcher;
pub use pixel_perfect::PixelPerfectMatcher;

use flicker_core::geometry::Rect;

/// The two images cannot be compared.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The pixel buffers differ in length.
    #[error("Pixels in expected ({expected}) does not match pixels in actual ({given})")]
    SizeMismatch {
        /// Pixels in the expected image.
        expected: usize,
        /// Pixels in the captured image.
        given: usize,
    },
    /// A buffer does not hold `width * height` pixels.
    #[error("{len} pixels cannot form a {width}x{height} image")]
    BadDimensions {
        /// Buffer length.
        len: usize,
        /// Claimed width.
        width: usize,
        /// Claimed height.
        height: usize,
    },
}

/// Pixel counts of one comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComparisonStats {
    /// Every pixel of the image, ignored ones included.
    pub compared: usize,
    /// Pixels considered the same.
    pub identical: usize,
    /// Pixels considered different.
    pub different: usize,
    /// Pixels outside every region.
    pub ignored: usize,
}

/// Outcome of a comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// `true` if no pixel differs.
    pub matches: bool,
    /// Pixel counts.
    pub stats: ComparisonStats,
    /// Differing pixels in magenta over transparency, when some differ.
    pub diff: Option<Bitmap>,
}

impl MatchResult {
    /// Builds the result from a diff mask of `TRANSPARENT` and `MAGENTA`
    /// pixels.
    fn from_diff(width: usize, height: usize, diff: Vec<u32>, ignored: usize) -> Self {
        let different = diff.iter().filter(|&&p| p == color::MAGENTA).count();
        let stats = ComparisonStats {
            compared: width * height,
            identical: diff.len() - different - ignored,
            different,
            ignored,
        };
        tracing::debug!(?stats, "bitmaps compared");
        let diff = (different > 0).then(|| Bitmap::from_pixels(width, height, diff)).flatten();
        Self {
            matches: different == 0,
            stats,
            diff,
        }
    }
}

/// Compares two images pixel by pixel.
pub trait BitmapMatcher {
    /// Compares row-major ARGB buffers of a `width` by `height` image.
    ///
    /// Only pixels inside `regions` are compared; an empty slice compares
    /// the whole image.
    ///
    /// # Errors
    ///
    /// [`MatchError`] if the buffers do not describe two images of the
    /// given size.
    fn compare_pixels(
        &self,
        expected: &[u32],
        given: &[u32],
        width: usize,
        height: usize,
        regions: &[Rect],
    ) -> Result<MatchResult, MatchError>;

    /// Compares two bitmaps.
    ///
    /// # Errors
    ///
    /// [`MatchError::SizeMismatch`] if the bitmaps differ in size.
    fn compare(
        &self,
        expected: &Bitmap,
        given: &Bitmap,
        regions: &[Rect],
    ) -> Result<MatchResult, MatchError> {
        if (expected.width(), expected.height()) != (given.width(), given.height()) {
            return Err(MatchError::SizeMismatch {
                expected: expected.pixels().len(),
                given: given.pixels().len(),
            });
        }
        self.compare_pixels(
            expected.pixels(),
            given.pixels(),
            expected.width(),
            expected.height(),
            regions,
        )
    }
}

/// Checks the buffers against the claimed size.
fn check_sizes(
    expected: &[u32],
    given: &[u32],
    width: usize,
    height: usize,
) -> Result<(), MatchError> {
    if expected.len() != given.len() {
        return Err(MatchError::SizeMismatch {
            expected: expected.len(),
            given: given.len(),
        });
    }
    if width.checked_mul(height) != Some(expected.len()) {
        return Err(MatchError::BadDimensions {
            len: expected.len(),
            width,
            height,
        });
    }
    Ok(())
}

/// Returns `true` if pixel (`x`, `y`) is compared under `regions`.
fn in_regions(regions: &[Rect], x: usize, y: usize) -> bool {
    let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
        return regions.is_empty();
    };
    regions.is_empty()
        || regions
            .iter()
            .any(|r| (r.left..=r.right).contains(&x) && (r.top..=r.bottom).contains(&y))
}
