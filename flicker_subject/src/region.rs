// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Assertions over screen regions.
//!
//! Coverage checks compare point sets: `covers_at_least` fails if part of
//! the test region is not covered, `covers_at_most` fails if the subject
//! reaches outside it and `covers_exactly` fails unless the symmetric
//! difference is empty. Positional checks compare bounding boxes.

use std::sync::Arc;

use flicker_core::geometry::{Rect, Region};
use flicker_core::time::Timestamp;

use crate::check::check;
use crate::error::{AssertionError, CheckResult, Fact};

const TOP_POSITION: &str = "Top position";
const BOTTOM_POSITION: &str = "Bottom position";
const LEFT_POSITION: &str = "Left position";
const RIGHT_POSITION: &str = "Right position";
const AREA: &str = "Rect area";

/// Maximum difference between two aspect ratios considered the same.
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.1;

/// Hands out shared copies of the regions subjects compute.
///
/// Entry subjects given an interner route every region they build through
/// it, so equal regions across a run share one allocation.
pub trait RegionInterner {
    /// The shared copy of `region`.
    fn intern(&self, region: Region) -> Arc<Region>;
}

/// A region captured at one moment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSubject {
    region: Arc<Region>,
    timestamp: Timestamp,
}

impl RegionSubject {
    /// Wraps a region.
    #[must_use]
    pub fn new(region: Region, timestamp: Timestamp) -> Self {
        Self::shared(Arc::new(region), timestamp)
    }

    /// Wraps a region that is already shared.
    #[must_use]
    pub fn shared(region: Arc<Region>, timestamp: Timestamp) -> Self {
        Self { region, timestamp }
    }

    pub(crate) fn interned(
        region: Region,
        timestamp: Timestamp,
        interner: Option<&dyn RegionInterner>,
    ) -> Self {
        match interner {
            Some(interner) => Self::shared(interner.intern(region), timestamp),
            None => Self::new(region, timestamp),
        }
    }

    /// Wraps the union of several regions.
    #[must_use]
    pub fn union_of<'r>(
        regions: impl IntoIterator<Item = &'r Region>,
        timestamp: Timestamp,
    ) -> Self {
        let region = regions
            .into_iter()
            .fold(Region::new(), |acc, r| acc.union(r));
        Self::new(region, timestamp)
    }

    /// Wraps a single rectangle.
    #[must_use]
    pub fn from_rect(rect: Rect, timestamp: Timestamp) -> Self {
        Self::new(Region::from_rect(rect), timestamp)
    }

    /// The region under test.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// The shared handle of the region under test.
    #[must_use]
    pub fn shared_region(&self) -> &Arc<Region> {
        &self.region
    }

    /// When the region was captured.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn fail(&self, check: &str) -> AssertionError {
        AssertionError::incorrect_region(check).at(self.timestamp)
    }

    /// Symmetric difference with `other`, as a new subject.
    #[must_use]
    pub fn minus(&self, other: &Region) -> Self {
        Self::new(self.region.xor(other), self.timestamp)
    }

    /// Union with `other`, as a new subject.
    #[must_use]
    pub fn plus(&self, other: &Region) -> Self {
        Self::new(self.region.union(other), self.timestamp)
    }

    /// Fails unless the region is empty.
    pub fn is_empty(&self) -> CheckResult<&Self> {
        check("Region is empty", self.region.is_empty(), self.timestamp).is_equal(true)?;
        Ok(self)
    }

    /// Fails if the region is empty.
    pub fn is_not_empty(&self) -> CheckResult<&Self> {
        check("Region is not empty", self.region.is_empty(), self.timestamp).is_equal(false)?;
        Ok(self)
    }

    /// Fails unless the region covers every point of `test`.
    pub fn covers_at_least(&self, test: &Region) -> CheckResult<&Self> {
        if self.region.covers_at_least(test) {
            return Ok(self);
        }
        Err(self.fail("coversAtLeast").with_facts([
            Fact::new("Region to test", test),
            Fact::new("Covered region", &self.region),
            Fact::new("Uncovered region", self.region.uncovered_region(test)),
        ]))
    }

    /// Fails if the region covers any point outside `test`.
    pub fn covers_at_most(&self, test: &Region) -> CheckResult<&Self> {
        if self.region.covers_at_most(test) {
            return Ok(self);
        }
        Err(self.fail("coversAtMost").with_facts([
            Fact::new("Region to test", test),
            Fact::new("Covered region", &self.region),
            Fact::new("Out-of-bounds region", self.region.out_of_bounds_region(test)),
        ]))
    }

    /// Fails unless the region and `test` are the same point set.
    pub fn covers_exactly(&self, test: &Region) -> CheckResult<&Self> {
        let difference = self.region.xor(test);
        if difference.is_empty() {
            return Ok(self);
        }
        Err(self.fail("coversExactly").with_facts([
            Fact::new("Region to test", test),
            Fact::new("Covered region", &self.region),
            Fact::new("Uncovered region", difference),
        ]))
    }

    /// Fails unless the region intersects `test`.
    pub fn overlaps(&self, test: &Region) -> CheckResult<&Self> {
        let overlap = self.region.intersect(test);
        if !overlap.is_empty() {
            return Ok(self);
        }
        Err(self.fail("overlaps").with_facts([
            Fact::new("Region to test", test),
            Fact::new("Covered region", &self.region),
            Fact::new("Overlap region", overlap),
        ]))
    }

    /// Fails if the region intersects `test`.
    pub fn not_overlaps(&self, test: &Region) -> CheckResult<&Self> {
        let overlap = self.region.intersect(test);
        if overlap.is_empty() {
            return Ok(self);
        }
        Err(self.fail("notOverlaps").with_facts([
            Fact::new("Region to test", test),
            Fact::new("Covered region", &self.region),
            Fact::new("Overlap region", overlap),
        ]))
    }

    /// Fails if the bounding box is larger than that of `test`.
    pub fn not_bigger_than(&self, test: &Region) -> CheckResult<&Self> {
        let test_area = test.bounds().area();
        let area = self.region.bounds().area();
        if area <= test_area {
            return Ok(self);
        }
        Err(self.fail("notBiggerThan").with_facts([
            Fact::new("Region to test", test),
            Fact::new("Area of test region", test_area),
            Fact::new("Covered region", &self.region),
            Fact::new("Area of region", area),
        ]))
    }

    /// Fails unless the region starts at most `threshold` pixels above and
    /// to the left of `test`.
    pub fn is_to_the_right_bottom(&self, test: &Region, threshold: i32) -> CheckResult<&Self> {
        let (ours, theirs) = (self.region.bounds(), test.bounds());
        let to_the_right = theirs.left - threshold <= ours.left;
        let to_the_bottom = theirs.top - threshold <= ours.top;
        if to_the_right && to_the_bottom {
            return Ok(self);
        }
        Err(self.fail("isToTheRightBottom").with_facts([
            Fact::new("Region to test", test),
            Fact::new("Actual region", &self.region),
        ]))
    }

    fn horizontal_extent_matches(&self, other: &Rect) -> CheckResult {
        let ours = self.region.bounds();
        check(LEFT_POSITION, ours.left, self.timestamp).is_equal(other.left)?;
        check(RIGHT_POSITION, ours.right, self.timestamp).is_equal(other.right)?;
        check(AREA, ours.area(), self.timestamp).is_equal(other.area())
    }

    fn vertical_extent_matches(&self, other: &Rect) -> CheckResult {
        let ours = self.region.bounds();
        check(TOP_POSITION, ours.top, self.timestamp).is_equal(other.top)?;
        check(BOTTOM_POSITION, ours.bottom, self.timestamp).is_equal(other.bottom)?;
        check(AREA, ours.area(), self.timestamp).is_equal(other.area())
    }

    /// Same width and area as `other`, not below it.
    pub fn is_higher_or_equal(&self, other: &Region) -> CheckResult<&Self> {
        let (ours, theirs) = (self.region.bounds(), other.bounds());
        self.horizontal_extent_matches(&theirs)?;
        check(TOP_POSITION, ours.top, self.timestamp).is_lower_or_equal(theirs.top)?;
        check(BOTTOM_POSITION, ours.bottom, self.timestamp).is_lower_or_equal(theirs.bottom)?;
        Ok(self)
    }

    /// Same width and area as `other`, strictly above it.
    pub fn is_higher(&self, other: &Region) -> CheckResult<&Self> {
        let (ours, theirs) = (self.region.bounds(), other.bounds());
        self.horizontal_extent_matches(&theirs)?;
        check(TOP_POSITION, ours.top, self.timestamp).is_lower(theirs.top)?;
        check(BOTTOM_POSITION, ours.bottom, self.timestamp).is_lower(theirs.bottom)?;
        Ok(self)
    }

    /// Same width and area as `other`, not above it.
    pub fn is_lower_or_equal(&self, other: &Region) -> CheckResult<&Self> {
        let (ours, theirs) = (self.region.bounds(), other.bounds());
        self.horizontal_extent_matches(&theirs)?;
        check(TOP_POSITION, ours.top, self.timestamp).is_greater_or_equal(theirs.top)?;
        check(BOTTOM_POSITION, ours.bottom, self.timestamp).is_greater_or_equal(theirs.bottom)?;
        Ok(self)
    }

    /// Same width and area as `other`, strictly below it.
    pub fn is_lower(&self, other: &Region) -> CheckResult<&Self> {
        let (ours, theirs) = (self.region.bounds(), other.bounds());
        self.horizontal_extent_matches(&theirs)?;
        check(TOP_POSITION, ours.top, self.timestamp).is_greater(theirs.top)?;
        check(BOTTOM_POSITION, ours.bottom, self.timestamp).is_greater(theirs.bottom)?;
        Ok(self)
    }

    /// Same height and area as `other`, not left of it.
    pub fn is_to_the_right(&self, other: &Region) -> CheckResult<&Self> {
        let (ours, theirs) = (self.region.bounds(), other.bounds());
        self.vertical_extent_matches(&theirs)?;
        check(LEFT_POSITION, ours.left, self.timestamp).is_greater_or_equal(theirs.left)?;
        check(RIGHT_POSITION, ours.right, self.timestamp).is_greater_or_equal(theirs.right)?;
        Ok(self)
    }

    /// Fails if the aspect ratios of the bounding boxes differ by more than
    /// [`ASPECT_RATIO_TOLERANCE`].
    pub fn is_same_aspect_ratio(&self, other: &Region) -> CheckResult<&Self> {
        let ratio = |r: Rect| f64::from(r.width()) / f64::from(r.height());
        let difference = (ratio(self.region.bounds()) - ratio(other.bounds())).abs();
        check("Aspect Ratio Difference", difference, self.timestamp)
            .is_lower_or_equal(ASPECT_RATIO_TOLERANCE)?;
        Ok(self)
    }
}
