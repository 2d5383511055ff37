// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::entry::LayerTraceEntry;
use super::layer::Layer;

/// An iterator over the ancestors of a layer, nearest first.
///
/// Created by [`LayerTraceEntry::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    entry: &'a LayerTraceEntry,
    current: Option<&'a Layer>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(entry: &'a LayerTraceEntry, first: Option<&'a Layer>) -> Self {
        Self {
            entry,
            current: first,
        }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<&'a Layer> {
        let layer = self.current?;
        self.current = self.entry.parent(layer);
        Some(layer)
    }
}
