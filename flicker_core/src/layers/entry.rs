// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer hierarchy snapshots.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::Result;
use crate::geometry::Rect;
use crate::hierarchy::{Hierarchy, reorder};
use crate::time::Timestamp;
use crate::trace::{Trace, TraceEntry};

use super::layer::{Layer, LayerRef};
use super::traverse::Ancestors;

/// A display known to the compositor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Display id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Layer stack rendered on this display.
    pub layer_stack: i32,
    /// Size of the layer stack in pixels.
    pub bounds: Rect,
    /// Whether the display is virtual.
    pub is_virtual: bool,
    /// Whether the display is powered on.
    pub is_on: bool,
}

impl DisplayInfo {
    /// A physical, powered-on display for layer stack 0.
    #[must_use]
    pub fn physical(id: u64, bounds: Rect) -> Self {
        Self {
            id,
            name: String::from("Built-in Screen"),
            layer_stack: 0,
            bounds,
            is_virtual: false,
            is_on: true,
        }
    }
}

/// A snapshot of the compositor layer tree.
///
/// Built from a flat list of layers linked by parent id. Parent links are
/// resolved and occlusion is computed once at construction; afterwards the
/// entry is read-only. Layers are stored breadth-first from the roots, with
/// siblings ordered by z.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerTraceEntry {
    timestamp: Timestamp,
    displays: Vec<DisplayInfo>,
    layers: Vec<Layer>,
    index: BTreeMap<i32, usize>,
}

/// A sequence of layer snapshots.
pub type LayersTrace = Trace<LayerTraceEntry>;

impl LayerTraceEntry {
    /// Builds a snapshot from a flat layer list.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateNodeId`](crate::Error::DuplicateNodeId) if two layers
    /// share an id, [`Error::UnknownParent`](crate::Error::UnknownParent) if a
    /// parent id is not in the list and
    /// [`Error::ParentCycle`](crate::Error::ParentCycle) if parent links loop.
    pub fn new(
        timestamp: Timestamp,
        displays: Vec<DisplayInfo>,
        layers: Vec<Layer>,
    ) -> Result<Self> {
        let nodes: Vec<(i32, i32)> = layers.iter().map(|l| (l.id, l.parent_id)).collect();
        let tree = Hierarchy::build(&nodes, |i| layers[i].z)?;
        let order = tree.breadth_first();

        let mut layers = layers;
        for &i in &order {
            if let Some(p) = tree.parent[i] {
                let hidden = layers[p].is_hidden_by_policy() || layers[p].hidden_by_parent;
                let name = layers[p].name.clone();
                layers[i].hidden_by_parent = hidden;
                layers[i].parent_name = Some(name);
            }
        }

        // Depth-first, bottom-most first; occlusion walks it top-down.
        fill_occlusion(&mut layers, &tree.depth_first(), &displays);

        let layers = reorder(layers, &order);
        let index = layers.iter().enumerate().map(|(i, l)| (l.id, i)).collect();
        Ok(Self {
            timestamp,
            displays,
            layers,
            index,
        })
    }

    /// When the snapshot was taken.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// All displays.
    #[must_use]
    pub fn displays(&self) -> &[DisplayInfo] {
        &self.displays
    }

    /// The first non-virtual display.
    #[must_use]
    pub fn physical_display(&self) -> Option<&DisplayInfo> {
        self.displays.iter().find(|d| !d.is_virtual)
    }

    /// Bounds of the first non-virtual display.
    #[must_use]
    pub fn physical_display_bounds(&self) -> Option<Rect> {
        self.physical_display().map(|d| d.bounds)
    }

    /// All layers, breadth-first from the roots.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers that contribute pixels to the screen.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().filter(|l| l.is_visible())
    }

    /// Layers without a parent.
    pub fn roots(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().filter(|l| l.is_root())
    }

    /// Looks up a layer by id.
    #[must_use]
    pub fn layer_by_id(&self, id: i32) -> Option<&Layer> {
        self.index.get(&id).map(|&i| &self.layers[i])
    }

    /// The parent of `layer`, if any.
    #[must_use]
    pub fn parent(&self, layer: &Layer) -> Option<&Layer> {
        if layer.is_root() {
            None
        } else {
            self.layer_by_id(layer.parent_id)
        }
    }

    /// Direct children of `layer`, ordered by z.
    pub fn children<'a>(&'a self, layer: &'a Layer) -> impl Iterator<Item = &'a Layer> + 'a {
        self.layers
            .iter()
            .filter(move |l| !l.is_root() && l.parent_id == layer.id)
    }

    /// Parent, grandparent and so on up to the root.
    #[must_use]
    pub fn ancestors<'a>(&'a self, layer: &'a Layer) -> Ancestors<'a> {
        Ancestors::new(self, self.parent(layer))
    }
}

impl TraceEntry for LayerTraceEntry {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Records, for each visible layer, the opaque layers above it that fully
/// contain it (occluders), that overlap it (partial occluders) and the
/// translucent layers above that overlap it.
fn fill_occlusion(layers: &mut [Layer], painter: &[usize], displays: &[DisplayInfo]) {
    let mut opaque: Vec<usize> = Vec::new();
    let mut translucent: Vec<usize> = Vec::new();
    for &i in painter.iter().rev() {
        if !layers[i].is_visible_unoccluded() {
            continue;
        }
        let stack = layers[i].layer_stack;
        let crop = displays
            .iter()
            .find(|d| d.layer_stack == stack)
            .map_or(kurbo::Rect::ZERO, |d| d.bounds.to_kurbo());

        let layer = &layers[i];
        let mut occluded_by = Vec::new();
        let mut partially = Vec::new();
        for &o in &opaque {
            let above = &layers[o];
            if above.layer_stack != stack {
                continue;
            }
            let same_corners =
                !above.has_rounded_corners() || layer.corner_radius == above.corner_radius;
            if above.contains_bounds_of(layer, crop) && same_corners {
                occluded_by.push(LayerRef {
                    id: above.id,
                    name: above.name.clone(),
                });
            } else if above.overlaps(layer, crop) {
                partially.push(above.id);
            }
        }
        let covered: Vec<i32> = translucent
            .iter()
            .map(|&t| &layers[t])
            .filter(|t| t.layer_stack == stack && t.overlaps(layer, crop))
            .map(|t| t.id)
            .collect();

        let is_opaque = layer.opaque;
        let layer = &mut layers[i];
        layer.occluded_by = occluded_by;
        layer.partially_occluded_by = partially;
        layer.covered_by = covered;
        if is_opaque {
            opaque.push(i);
        } else {
            translucent.push(i);
        }
    }
}
