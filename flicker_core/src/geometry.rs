// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangles and regions.
//!
//! [`Rect`] is an integer, half-open (`right` and `bottom` excluded) screen
//! rectangle. [`Region`] is a set of pixels stored as disjoint rectangles in a
//! canonical banded form: rows of equal-height bands sorted top-to-bottom,
//! each band holding non-touching spans sorted left-to-right, with vertically
//! adjacent bands merged when their spans are identical. Because the form is
//! canonical, two regions covering the same pixels compare equal.
//!
//! Set operations use coordinate compression: every edge of both operands
//! splits the plane into cells that are either fully inside or fully outside
//! each operand, so membership only needs to be tested once per cell.

use alloc::vec::Vec;
use core::fmt;

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An integer rectangle, `left`/`top` inclusive, `right`/`bottom` exclusive.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from its edges.
    #[inline]
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle from an origin and a size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self::new(left, top, left.saturating_add(width), top.saturating_add(height))
    }

    /// Width, zero for inverted rectangles.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        if self.right > self.left {
            self.right.abs_diff(self.left)
        } else {
            0
        }
    }

    /// Height, zero for inverted rectangles.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        if self.bottom > self.top {
            self.bottom.abs_diff(self.top)
        } else {
            0
        }
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Number of covered pixels.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns the overlap of two rectangles (possibly empty).
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let r = Self::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() { Self::EMPTY } else { r }
    }

    /// Returns `true` if the two rectangles share at least one pixel.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns `true` if the point lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.is_empty()
            || (self.left <= other.left
                && self.top <= other.top
                && self.right >= other.right
                && self.bottom >= other.bottom)
    }

    /// Horizontal center.
    #[inline]
    #[must_use]
    pub const fn center_x(&self) -> i32 {
        self.left + (self.right - self.left) / 2
    }

    /// Vertical center.
    #[inline]
    #[must_use]
    pub const fn center_y(&self) -> i32 {
        self.top + (self.bottom - self.top) / 2
    }

    /// Returns a copy offset by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Converts to a float rectangle.
    #[must_use]
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.left),
            f64::from(self.top),
            f64::from(self.right),
            f64::from(self.bottom),
        )
    }

    /// Converts a float rectangle by rounding each edge to the nearest pixel.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "trace bounds are screen coordinates well inside i32 range"
    )]
    pub fn from_kurbo(rect: kurbo::Rect) -> Self {
        let r = rect.round();
        Self::new(r.x0 as i32, r.y0 as i32, r.x1 as i32, r.y1 as i32)
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {} - {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<kurbo::Rect> for Rect {
    fn from(rect: kurbo::Rect) -> Self {
        Self::from_kurbo(rect)
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Set operation applied by [`Region::op`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionOp {
    /// Pixels in `self` but not in `other`.
    Difference,
    /// Pixels in both.
    Intersect,
    /// Pixels in either.
    Union,
    /// Pixels in exactly one.
    Xor,
    /// Pixels in `other` but not in `self`.
    ReverseDifference,
    /// Exactly the pixels of `other`.
    Replace,
}

impl RegionOp {
    #[inline]
    const fn apply(self, a: bool, b: bool) -> bool {
        match self {
            Self::Difference => a && !b,
            Self::Intersect => a && b,
            Self::Union => a || b,
            Self::Xor => a != b,
            Self::ReverseDifference => b && !a,
            Self::Replace => b,
        }
    }
}

/// A set of pixels stored as canonical disjoint rectangles.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// The empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// A region covering a single rectangle.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        if rect.is_empty() {
            Self::new()
        } else {
            Self {
                rects: alloc::vec![rect],
            }
        }
    }

    /// The union of any number of (possibly overlapping) rectangles.
    #[must_use]
    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        let raw: Vec<Rect> = rects.into_iter().filter(|r| !r.is_empty()).collect();
        combine(&raw, &[], RegionOp::Union)
    }

    /// The disjoint rectangles making up the region, top-to-bottom.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns `true` if the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns `true` if the region is exactly one rectangle.
    #[must_use]
    pub fn is_rect(&self) -> bool {
        self.rects.len() == 1
    }

    /// The smallest rectangle enclosing the region.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let mut iter = self.rects.iter();
        let Some(first) = iter.next() else {
            return Rect::EMPTY;
        };
        iter.fold(*first, |acc, r| {
            Rect::new(
                acc.left.min(r.left),
                acc.top.min(r.top),
                acc.right.max(r.right),
                acc.bottom.max(r.bottom),
            )
        })
    }

    /// Number of covered pixels.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.rects
            .iter()
            .fold(0_u64, |acc, r| acc.saturating_add(r.area()))
    }

    /// Returns `true` if the pixel `(x, y)` is covered.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }

    /// Applies a set operation with `other` as the second operand.
    #[must_use]
    pub fn op(&self, other: &Self, op: RegionOp) -> Self {
        combine(&self.rects, &other.rects, op)
    }

    /// Pixels in either region.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.op(other, RegionOp::Union)
    }

    /// Pixels in both regions.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        self.op(other, RegionOp::Intersect)
    }

    /// Pixels in `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.op(other, RegionOp::Difference)
    }

    /// Pixels in exactly one of the regions.
    #[must_use]
    pub fn xor(&self, other: &Self) -> Self {
        self.op(other, RegionOp::Xor)
    }

    /// Returns `true` if every pixel of `other` is covered by `self`.
    #[must_use]
    pub fn covers_at_least(&self, other: &Self) -> bool {
        self.uncovered_region(other).is_empty()
    }

    /// Returns `true` if no pixel of `self` lies outside `other`.
    #[must_use]
    pub fn covers_at_most(&self, other: &Self) -> bool {
        self.out_of_bounds_region(other).is_empty()
    }

    /// Returns `true` if `self` covers all of `other` and something more.
    #[must_use]
    pub fn covers_more_than(&self, other: &Self) -> bool {
        self.covers_at_least(other) && !self.covers_at_most(other)
    }

    /// Pixels of `other` that `self` fails to cover.
    #[must_use]
    pub fn uncovered_region(&self, other: &Self) -> Self {
        other.difference(self)
    }

    /// Pixels of `self` that fall outside `other`.
    #[must_use]
    pub fn out_of_bounds_region(&self, other: &Self) -> Self {
        self.difference(other)
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Region")?;
        f.debug_list().entries(self.rects.iter()).finish()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Region[]");
        }
        fmt::Debug::fmt(self, f)
    }
}

/// Combines two rectangle lists cell by cell and emits the canonical form.
fn combine(a: &[Rect], b: &[Rect], op: RegionOp) -> Region {
    let mut xs: Vec<i32> = Vec::with_capacity((a.len() + b.len()) * 2);
    let mut ys: Vec<i32> = Vec::with_capacity((a.len() + b.len()) * 2);
    for r in a.iter().chain(b) {
        xs.push(r.left);
        xs.push(r.right);
        ys.push(r.top);
        ys.push(r.bottom);
    }
    xs.sort_unstable();
    xs.dedup();
    ys.sort_unstable();
    ys.dedup();

    let covered = |rects: &[Rect], x: i32, y: i32| rects.iter().any(|r| r.contains_point(x, y));

    // Bands as (top, bottom, spans).
    let mut bands: Vec<(i32, i32, Vec<(i32, i32)>)> = Vec::new();
    for yw in ys.windows(2) {
        let (top, bottom) = (yw[0], yw[1]);
        let mut spans: Vec<(i32, i32)> = Vec::new();
        for xw in xs.windows(2) {
            let (left, right) = (xw[0], xw[1]);
            if !op.apply(covered(a, left, top), covered(b, left, top)) {
                continue;
            }
            match spans.last_mut() {
                Some(last) if last.1 == left => last.1 = right,
                _ => spans.push((left, right)),
            }
        }
        if spans.is_empty() {
            continue;
        }
        match bands.last_mut() {
            Some(last) if last.1 == top && last.2 == spans => last.1 = bottom,
            _ => bands.push((top, bottom, spans)),
        }
    }

    let rects = bands
        .into_iter()
        .flat_map(|(top, bottom, spans)| {
            spans
                .into_iter()
                .map(move |(left, right)| Rect::new(left, top, right, bottom))
        })
        .collect();
    Region { rects }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_rect_makes_empty_region() {
        assert!(Region::from_rect(Rect::new(5, 5, 5, 10)).is_empty(), "zero width");
        assert_eq!(Region::new().bounds(), Rect::EMPTY, "empty bounds");
    }

    #[test]
    fn extreme_rect_measures_without_overflow() {
        let all = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(all.width(), u32::MAX, "full width");
        assert_eq!(all.height(), u32::MAX, "full height");
        assert_eq!(all.area(), u64::from(u32::MAX) * u64::from(u32::MAX), "full area");
        assert_eq!(Region::from_rect(all).area(), all.area(), "region area");
        assert_eq!(
            Rect::from_origin_size(i32::MAX - 1, 0, 10, 10).right,
            i32::MAX,
            "size clamped at the edge"
        );
    }

    #[test]
    fn union_of_touching_rects_is_one_rect() {
        let r = Region::from_rects([Rect::new(0, 0, 10, 10), Rect::new(10, 0, 20, 10)]);
        assert_eq!(r.rects(), &[Rect::new(0, 0, 20, 10)], "merged horizontally");
        let r = Region::from_rects([Rect::new(0, 0, 10, 10), Rect::new(0, 10, 10, 20)]);
        assert_eq!(r.rects(), &[Rect::new(0, 0, 10, 20)], "merged vertically");
    }

    #[test]
    fn canonical_form_makes_equal_sets_equal() {
        let a = Region::from_rects([Rect::new(0, 0, 10, 20), Rect::new(10, 0, 20, 10)]);
        let b = Region::from_rects([Rect::new(0, 0, 20, 10), Rect::new(0, 10, 10, 20)]);
        assert_eq!(a, b, "same pixels");
        assert_eq!(a.area(), 300, "area");
    }

    #[test]
    fn difference_punches_hole() {
        let outer = Region::from_rect(Rect::new(0, 0, 30, 30));
        let hole = Region::from_rect(Rect::new(10, 10, 20, 20));
        let ring = outer.difference(&hole);
        assert_eq!(ring.area(), 800, "ring area");
        assert!(!ring.contains_point(15, 15), "hole is empty");
        assert!(ring.contains_point(5, 15), "ring is filled");
        assert_eq!(ring.bounds(), Rect::new(0, 0, 30, 30), "bounds unchanged");
    }

    #[test]
    fn all_ops_on_overlapping_rects() {
        let a = Region::from_rect(Rect::new(0, 0, 10, 10));
        let b = Region::from_rect(Rect::new(5, 0, 15, 10));
        assert_eq!(a.op(&b, RegionOp::Intersect).area(), 50, "intersect");
        assert_eq!(a.op(&b, RegionOp::Union).area(), 150, "union");
        assert_eq!(a.op(&b, RegionOp::Xor).area(), 100, "xor");
        assert_eq!(
            a.op(&b, RegionOp::Difference).rects(),
            &[Rect::new(0, 0, 5, 10)],
            "difference"
        );
        assert_eq!(
            a.op(&b, RegionOp::ReverseDifference).rects(),
            &[Rect::new(10, 0, 15, 10)],
            "reverse difference"
        );
        assert_eq!(a.op(&b, RegionOp::Replace), b, "replace");
    }

    #[test]
    fn coverage_relations() {
        let big = Region::from_rect(Rect::new(0, 0, 100, 100));
        let small = Region::from_rect(Rect::new(10, 10, 20, 20));
        assert!(big.covers_at_least(&small), "big covers small");
        assert!(!big.covers_at_most(&small), "big spills outside small");
        assert!(big.covers_more_than(&small), "strictly more");
        assert!(small.covers_at_most(&big), "small inside big");
        assert_eq!(big.uncovered_region(&small), Region::new(), "nothing uncovered");
        assert_eq!(small.out_of_bounds_region(&big), Region::new(), "nothing outside");
    }

    #[test]
    fn kurbo_conversion_rounds() {
        let r = Rect::from_kurbo(kurbo::Rect::new(0.4, 0.6, 99.5, 200.2));
        assert_eq!(r, Rect::new(0, 1, 100, 200), "rounded edges");
        assert_eq!(Rect::new(1, 2, 3, 4).to_kurbo(), kurbo::Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (0..40_i32, 0..40_i32, 0..20_i32, 0..20_i32)
            .prop_map(|(x, y, w, h)| Rect::from_origin_size(x, y, w, h))
    }

    fn arb_region() -> impl Strategy<Value = Region> {
        proptest::collection::vec(arb_rect(), 0..4).prop_map(Region::from_rects)
    }

    proptest! {
        #[test]
        fn xor_empty_iff_mutual_coverage(a in arb_region(), b in arb_region()) {
            let exact = a.xor(&b).is_empty();
            prop_assert_eq!(exact, a.covers_at_least(&b) && a.covers_at_most(&b));
            prop_assert_eq!(exact, a == b);
        }

        #[test]
        fn inclusion_exclusion(a in arb_region(), b in arb_region()) {
            prop_assert_eq!(
                a.union(&b).area() + a.intersect(&b).area(),
                a.area() + b.area()
            );
        }

        #[test]
        fn rects_are_disjoint(a in arb_region(), b in arb_region()) {
            let u = a.union(&b);
            for (i, r) in u.rects().iter().enumerate() {
                for s in &u.rects()[i + 1..] {
                    prop_assert!(!r.intersects(s));
                }
            }
        }
    }
}
