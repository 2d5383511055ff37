// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Access to the traces captured during a run.
//!
//! Capture and parsing happen elsewhere; analysis only sees a [`Reader`].
//! Each accessor returns `None` when that kind of trace was not captured.

use alloc::boxed::Box;
use core::fmt;

use crate::cuj::CujTrace;
use crate::layers::LayersTrace;
use crate::time::{Duration, Timestamp};
use crate::transition::TransitionsTrace;
use crate::wm::WindowManagerTrace;

/// Read access to the traces of one run.
pub trait Reader: fmt::Debug {
    /// Window-manager snapshots.
    fn read_wm_trace(&self) -> Option<&WindowManagerTrace>;

    /// Compositor layer snapshots.
    fn read_layers_trace(&self) -> Option<&LayersTrace>;

    /// Merged shell transitions.
    fn read_transitions_trace(&self) -> Option<&TransitionsTrace>;

    /// Critical user journeys.
    fn read_cuj_trace(&self) -> Option<&CujTrace>;

    /// A reader restricted to `[start, end]`.
    ///
    /// Snapshot traces keep the last entry recorded before `start` so the
    /// state at `start` is known. Transitions and journeys are kept if they
    /// overlap the window.
    fn slice(&self, start: Timestamp, end: Timestamp) -> Box<dyn Reader>;
}

/// An in-memory [`Reader`].
///
/// ```
/// use flicker_core::reader::{Reader, TraceReader};
/// use flicker_core::transition::TransitionsTrace;
///
/// let reader = TraceReader::new().with_transitions(TransitionsTrace::default());
/// assert!(reader.read_wm_trace().is_none());
/// assert!(reader.read_transitions_trace().is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct TraceReader {
    wm: Option<WindowManagerTrace>,
    layers: Option<LayersTrace>,
    transitions: Option<TransitionsTrace>,
    cuj: Option<CujTrace>,
}

impl TraceReader {
    /// An empty reader: nothing was captured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the window-manager trace.
    #[must_use]
    pub fn with_wm(mut self, trace: WindowManagerTrace) -> Self {
        self.wm = Some(trace);
        self
    }

    /// Adds the layers trace.
    #[must_use]
    pub fn with_layers(mut self, trace: LayersTrace) -> Self {
        self.layers = Some(trace);
        self
    }

    /// Adds the transitions trace.
    #[must_use]
    pub fn with_transitions(mut self, trace: TransitionsTrace) -> Self {
        self.transitions = Some(trace);
        self
    }

    /// Adds the journey trace.
    #[must_use]
    pub fn with_cuj(mut self, trace: CujTrace) -> Self {
        self.cuj = Some(trace);
        self
    }
}

impl Reader for TraceReader {
    fn read_wm_trace(&self) -> Option<&WindowManagerTrace> {
        self.wm.as_ref()
    }

    fn read_layers_trace(&self) -> Option<&LayersTrace> {
        self.layers.as_ref()
    }

    fn read_transitions_trace(&self) -> Option<&TransitionsTrace> {
        self.transitions.as_ref()
    }

    fn read_cuj_trace(&self) -> Option<&CujTrace> {
        self.cuj.as_ref()
    }

    fn slice(&self, start: Timestamp, end: Timestamp) -> Box<dyn Reader> {
        // Snapshot slicing is half-open; widen by one tick to keep `end`.
        let past_end = end.saturating_add(Duration(1));
        Box::new(Self {
            wm: self
                .wm
                .as_ref()
                .map(|t| t.slice_with_initial_entry(start, past_end)),
            layers: self
                .layers
                .as_ref()
                .map(|t| t.slice_with_initial_entry(start, past_end)),
            transitions: self.transitions.as_ref().map(|t| t.slice(start, end)),
            cuj: self.cuj.as_ref().map(|t| t.slice(start, end)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NO_PARENT;
    use crate::wm::{ContainerKind, WindowContainer, WindowManagerState};
    use alloc::vec;
    use alloc::vec::Vec;

    fn state(at: i64) -> WindowManagerState {
        WindowManagerState::new(
            Timestamp::from_elapsed(at),
            vec![WindowContainer::new(
                ContainerKind::Display,
                1,
                NO_PARENT,
                "Display",
            )],
        )
        .unwrap()
    }

    #[test]
    fn slice_keeps_end_and_initial_entry() {
        let wm = WindowManagerTrace::new(vec![state(10), state(20), state(30), state(40)]).unwrap();
        let reader = TraceReader::new().with_wm(wm);
        let sliced = reader.slice(Timestamp::from_elapsed(15), Timestamp::from_elapsed(30));
        let kept: Vec<i64> = sliced
            .read_wm_trace()
            .unwrap()
            .entries()
            .iter()
            .map(|s| s.timestamp().elapsed_nanos())
            .collect();
        assert_eq!(kept, [10, 20, 30], "state before start and entry at end");
        assert!(sliced.read_layers_trace().is_none(), "absent stays absent");
    }
}
