// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single compositor layer and its visibility rules.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::NO_PARENT;
use crate::geometry::{Rect, Region};

/// Layer id reserved for the root of off-screen layers.
pub const OFFSCREEN_ROOT_ID: i32 = 0x7FFF_FFFD;

/// Per-layer boolean flags as recorded by the compositor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Whether the layer (and its subtree) is hidden by policy.
    pub hidden: bool,
    /// Whether the layer content is marked secure.
    pub secure: bool,
}

/// Identifies a layer that hides another one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerRef {
    /// Layer id.
    pub id: i32,
    /// Layer name.
    pub name: String,
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A compositor layer at one moment in time.
///
/// Recorded properties are public. Hierarchy-derived state (hidden by a
/// parent, occlusion) is filled in when the layer becomes part of a
/// [`LayerTraceEntry`](super::LayerTraceEntry).
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// Unique id within the snapshot.
    pub id: i32,
    /// Id of the parent layer, [`NO_PARENT`] for roots.
    pub parent_id: i32,
    /// Layer name, e.g. `com.example/com.example.Main#12`.
    pub name: String,
    /// Z order relative to siblings.
    pub z: i32,
    /// Recorded flags.
    pub flags: LayerFlags,
    /// Color alpha in `0.0..=1.0`.
    pub alpha: f32,
    /// Whether the layer had no buffer attached.
    pub active_buffer_empty: bool,
    /// Whether the layer draws a color fill, shadow or blur.
    pub has_effects: bool,
    /// Screen-space bounds.
    pub bounds: kurbo::Rect,
    /// Visible region computed by composition, if recorded.
    pub visible_region: Option<Region>,
    /// Whether the layer is fully opaque.
    pub opaque: bool,
    /// Corner radius in pixels.
    pub corner_radius: f32,
    /// Layer stack (display) the layer is drawn on.
    pub layer_stack: i32,
    /// Whether composition state (visible region) was not recorded.
    pub excludes_composition_state: bool,

    pub(crate) hidden_by_parent: bool,
    pub(crate) parent_name: Option<String>,
    pub(crate) occluded_by: Vec<LayerRef>,
    pub(crate) partially_occluded_by: Vec<i32>,
    pub(crate) covered_by: Vec<i32>,
}

impl Layer {
    /// Creates a layer with no buffer, full alpha and empty bounds.
    #[must_use]
    pub fn new(id: i32, parent_id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            z: 0,
            flags: LayerFlags::default(),
            alpha: 1.0,
            active_buffer_empty: true,
            has_effects: false,
            bounds: kurbo::Rect::ZERO,
            visible_region: None,
            opaque: false,
            corner_radius: 0.0,
            layer_stack: 0,
            excludes_composition_state: false,
            hidden_by_parent: false,
            parent_name: None,
            occluded_by: Vec::new(),
            partially_occluded_by: Vec::new(),
            covered_by: Vec::new(),
        }
    }

    /// Sets the z order.
    #[must_use]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    /// Attaches a buffer and sets bounds and visible region to `rect`.
    #[must_use]
    pub fn with_buffer(mut self, rect: Rect) -> Self {
        self.active_buffer_empty = false;
        self.bounds = rect.to_kurbo();
        self.visible_region = Some(Region::from_rect(rect));
        self
    }

    /// Sets the screen bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: kurbo::Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Sets the composition visible region.
    #[must_use]
    pub fn with_visible_region(mut self, region: Region) -> Self {
        self.visible_region = Some(region);
        self
    }

    /// Marks the layer as drawing a color fill, shadow or blur.
    #[must_use]
    pub fn with_effects(mut self) -> Self {
        self.has_effects = true;
        self
    }

    /// Marks the layer as hidden by policy.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.flags.hidden = true;
        self
    }

    /// Marks the layer as opaque.
    #[must_use]
    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    /// Sets the alpha.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the corner radius.
    #[must_use]
    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }

    /// Sets the layer stack.
    #[must_use]
    pub fn with_layer_stack(mut self, stack: i32) -> Self {
        self.layer_stack = stack;
        self
    }

    /// Marks the composition state as not recorded, so bounds stand in for
    /// the visible region.
    #[must_use]
    pub fn excluding_composition_state(mut self) -> Self {
        self.excludes_composition_state = true;
        self
    }

    /// Returns `true` for layers without a parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id == NO_PARENT
    }

    /// Returns `true` if the layer is a task container.
    #[must_use]
    pub fn is_task(&self) -> bool {
        self.name.starts_with("Task=")
    }

    /// Returns `true` if the layer has the hidden flag or is the off-screen root.
    #[must_use]
    pub fn is_hidden_by_policy(&self) -> bool {
        self.flags.hidden || self.id == OFFSCREEN_ROOT_ID
    }

    /// Returns `true` if an ancestor is hidden by policy.
    #[must_use]
    pub fn is_hidden_by_parent(&self) -> bool {
        self.hidden_by_parent
    }

    /// Returns `true` if the layer has rounded corners.
    #[must_use]
    pub fn has_rounded_corners(&self) -> bool {
        self.corner_radius > 0.0
    }

    /// Layers whose opaque content fully hides this one.
    #[must_use]
    pub fn occluded_by(&self) -> &[LayerRef] {
        &self.occluded_by
    }

    /// Ids of opaque layers overlapping this one without fully hiding it.
    #[must_use]
    pub fn partially_occluded_by(&self) -> &[i32] {
        &self.partially_occluded_by
    }

    /// Ids of translucent layers drawn over this one.
    #[must_use]
    pub fn covered_by(&self) -> &[i32] {
        &self.covered_by
    }

    /// The region the layer actually shows.
    ///
    /// Falls back to the bounds when composition state was not recorded.
    #[must_use]
    pub fn effective_visible_region(&self) -> Region {
        if self.excludes_composition_state {
            Region::from_rect(Rect::from_kurbo(self.bounds))
        } else {
            self.visible_region.clone().unwrap_or_default()
        }
    }

    /// Screen bounds rounded to whole pixels.
    #[must_use]
    pub fn pixel_bounds(&self) -> Rect {
        Rect::from_kurbo(self.bounds)
    }

    /// Visibility ignoring occlusion by layers above.
    pub(crate) fn is_visible_unoccluded(&self) -> bool {
        if self.hidden_by_parent || self.is_hidden_by_policy() {
            return false;
        }
        if self.active_buffer_empty && !self.has_effects {
            return false;
        }
        !self.effective_visible_region().is_empty()
    }

    /// Returns `true` if the layer contributes pixels to the screen.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.occluded_by.is_empty() && self.is_visible_unoccluded()
    }

    /// Human-readable reasons the layer is invisible, empty when visible.
    #[must_use]
    pub fn visibility_reason(&self) -> Vec<String> {
        use alloc::format;

        if self.is_visible() {
            return Vec::new();
        }
        let mut reasons = Vec::new();
        if self.is_hidden_by_policy() {
            reasons.push(String::from("Flag is hidden"));
        }
        if self.hidden_by_parent {
            let parent = self.parent_name.as_deref().unwrap_or("<unknown>");
            reasons.push(format!("Hidden by parent {parent}"));
        }
        if self.active_buffer_empty {
            reasons.push(String::from("Buffer is empty"));
        }
        if self.alpha == 0.0 {
            reasons.push(String::from("Alpha is 0"));
        }
        if self.bounds.is_zero_area() {
            reasons.push(String::from("Bounds is 0x0"));
        }
        if self.active_buffer_empty && !self.has_effects {
            reasons.push(String::from("does not have color fill, shadow or blur"));
        }
        if !self.occluded_by.is_empty() {
            let names: Vec<String> = self.occluded_by.iter().map(|l| format!("{l}")).collect();
            reasons.push(format!("Layer is occluded by: {}", names.join(", ")));
        }
        if self.visible_region.as_ref().is_some_and(Region::is_empty) {
            reasons.push(String::from(
                "Visible region calculated by Composition Engine is empty",
            ));
        }
        if reasons.is_empty() {
            reasons.push(String::from("Unknown"));
        }
        reasons
    }

    /// Returns `true` if `inner`'s bounds lie inside this layer's bounds,
    /// both clipped to `crop` when it is non-empty.
    pub(crate) fn contains_bounds_of(&self, inner: &Self, crop: kurbo::Rect) -> bool {
        let (outer, inner) = clipped(self.bounds, inner.bounds, crop);
        outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
    }

    /// Returns `true` if the bounds of the two layers intersect within `crop`.
    pub(crate) fn overlaps(&self, other: &Self, crop: kurbo::Rect) -> bool {
        let (a, b) = clipped(self.bounds, other.bounds, crop);
        !a.intersect(b).is_zero_area()
    }
}

fn clipped(a: kurbo::Rect, b: kurbo::Rect, crop: kurbo::Rect) -> (kurbo::Rect, kurbo::Rect) {
    if crop.is_zero_area() {
        (a, b)
    } else {
        (a.intersect(crop), b.intersect(crop))
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.is_visible() {
            write!(f, " visible:{}", self.effective_visible_region())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> Layer {
        Layer::new(5, NO_PARENT, "com.example/com.example.Main#5")
            .with_buffer(Rect::new(0, 0, 100, 200))
    }

    #[test]
    fn layer_with_buffer_is_visible() {
        let layer = app();
        assert!(layer.is_visible(), "buffer and region present");
        assert!(layer.visibility_reason().is_empty(), "no reasons when visible");
    }

    #[test]
    fn hidden_flag_hides() {
        let layer = app().hidden();
        assert!(!layer.is_visible(), "hidden by policy");
        assert_eq!(layer.visibility_reason(), ["Flag is hidden"], "single reason");
    }

    #[test]
    fn offscreen_root_is_hidden() {
        let layer = Layer::new(OFFSCREEN_ROOT_ID, NO_PARENT, "Offscreen Root").with_effects();
        assert!(layer.is_hidden_by_policy(), "reserved id");
    }

    #[test]
    fn empty_buffer_without_effects_is_invisible() {
        let layer = Layer::new(1, NO_PARENT, "container")
            .with_visible_region(Region::from_rect(Rect::new(0, 0, 10, 10)));
        assert!(!layer.is_visible(), "nothing to draw");
        let reasons = layer.visibility_reason();
        assert!(reasons.iter().any(|r| r == "Buffer is empty"), "{reasons:?}");
    }

    #[test]
    fn effects_make_bufferless_layer_visible() {
        let layer = Layer::new(1, NO_PARENT, "dim")
            .with_effects()
            .with_visible_region(Region::from_rect(Rect::new(0, 0, 10, 10)));
        assert!(layer.is_visible(), "color fill draws");
    }

    #[test]
    fn bounds_stand_in_without_composition_state() {
        let mut layer = app().excluding_composition_state();
        layer.visible_region = None;
        assert!(layer.is_visible(), "bounds used as region");
        assert_eq!(layer.effective_visible_region().area(), 20_000, "full bounds");
    }

    #[test]
    fn empty_visible_region_reason() {
        let layer = app().with_visible_region(Region::new());
        assert!(!layer.is_visible(), "nothing composed");
        assert!(
            layer
                .visibility_reason()
                .iter()
                .any(|r| r == "Visible region calculated by Composition Engine is empty"),
            "composition reason"
        );
    }

    #[test]
    fn task_layers_by_prefix() {
        assert!(Layer::new(3, NO_PARENT, "Task=12").is_task(), "task prefix");
        assert!(!app().is_task(), "app layer");
    }
}
