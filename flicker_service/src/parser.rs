// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy construction of subjects from a reader.

use std::cell::OnceCell;
use std::fmt;

use flicker_core::reader::Reader;
use flicker_subject::{
    LayerTraceEntrySubject, LayersTraceSubject, RegionInterner, TraceSubject,
    WindowManagerStateSubject, WindowManagerTraceSubject,
};

/// Builds subjects over the traces of one reader.
///
/// Entry subjects are built on first use and shared by every later request.
/// Trace subjects are handed out fresh each time since checks are registered
/// on them. With an interner, every region the subjects compute is shared
/// through it.
pub struct SubjectsParser<'r> {
    reader: &'r dyn Reader,
    interner: Option<&'r dyn RegionInterner>,
    layers: OnceCell<Option<Vec<LayerTraceEntrySubject<'r>>>>,
    wm: OnceCell<Option<Vec<WindowManagerStateSubject<'r>>>>,
}

impl fmt::Debug for SubjectsParser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubjectsParser")
            .field("reader", &self.reader)
            .finish_non_exhaustive()
    }
}

impl<'r> SubjectsParser<'r> {
    /// A parser over `reader`.
    #[must_use]
    pub fn new(reader: &'r dyn Reader) -> Self {
        Self {
            reader,
            interner: None,
            layers: OnceCell::new(),
            wm: OnceCell::new(),
        }
    }

    /// A parser whose subjects intern their regions in `interner`.
    #[must_use]
    pub fn with_interner(reader: &'r dyn Reader, interner: &'r dyn RegionInterner) -> Self {
        Self {
            interner: Some(interner),
            ..Self::new(reader)
        }
    }

    fn layer_entries(&self) -> Option<&[LayerTraceEntrySubject<'r>]> {
        self.layers
            .get_or_init(|| {
                let (reader, interner) = (self.reader, self.interner);
                reader.read_layers_trace().map(|t| {
                    t.entries()
                        .iter()
                        .map(|e| {
                            let subject = LayerTraceEntrySubject::new(e);
                            interner.map_or(subject, |i| subject.with_interner(i))
                        })
                        .collect()
                })
            })
            .as_deref()
    }

    fn wm_entries(&self) -> Option<&[WindowManagerStateSubject<'r>]> {
        self.wm
            .get_or_init(|| {
                let (reader, interner) = (self.reader, self.interner);
                reader.read_wm_trace().map(|t| {
                    t.entries()
                        .iter()
                        .map(|s| {
                            let subject = WindowManagerStateSubject::new(s);
                            interner.map_or(subject, |i| subject.with_interner(i))
                        })
                        .collect()
                })
            })
            .as_deref()
    }

    /// A subject over the whole layers trace, `None` if it was not captured.
    #[must_use]
    pub fn layers_trace_subject(&self) -> Option<LayersTraceSubject<'r>> {
        self.layer_entries()
            .map(|entries| TraceSubject::from_subjects(entries.to_vec()))
    }

    /// A subject over the whole window-manager trace.
    #[must_use]
    pub fn wm_trace_subject(&self) -> Option<WindowManagerTraceSubject<'r>> {
        self.wm_entries()
            .map(|entries| TraceSubject::from_subjects(entries.to_vec()))
    }

    /// The first layers snapshot.
    #[must_use]
    pub fn layers_start(&self) -> Option<LayerTraceEntrySubject<'r>> {
        self.layer_entries()?.first().copied()
    }

    /// The last layers snapshot.
    #[must_use]
    pub fn layers_end(&self) -> Option<LayerTraceEntrySubject<'r>> {
        self.layer_entries()?.last().copied()
    }

    /// The first window-manager snapshot.
    #[must_use]
    pub fn wm_start(&self) -> Option<WindowManagerStateSubject<'r>> {
        self.wm_entries()?.first().copied()
    }

    /// The last window-manager snapshot.
    #[must_use]
    pub fn wm_end(&self) -> Option<WindowManagerStateSubject<'r>> {
        self.wm_entries()?.last().copied()
    }

    /// Returns `true` if a layers trace was captured.
    #[must_use]
    pub fn has_layers(&self) -> bool {
        self.layer_entries().is_some()
    }

    /// Returns `true` if a window-manager trace was captured.
    #[must_use]
    pub fn has_wm(&self) -> bool {
        self.wm_entries().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::reader::TraceReader;
    use flicker_core::time::Timestamp;
    use flicker_core::wm::{WindowManagerState, WindowManagerTrace};
    use flicker_core::component::ComponentNameMatcher;
    use flicker_subject::FlickerSubject;
    use std::sync::Arc;

    use crate::context::Cache;

    #[test]
    fn subjects_follow_captured_traces() {
        let states = [10, 20, 30]
            .into_iter()
            .map(|t| WindowManagerState::new(Timestamp::from_elapsed(t), Vec::new()).unwrap())
            .collect();
        let reader = TraceReader::new().with_wm(WindowManagerTrace::new(states).unwrap());
        let parser = SubjectsParser::new(&reader);

        assert!(parser.layers_trace_subject().is_none(), "no layers captured");
        assert!(parser.layers_start().is_none(), "no layers entry");
        assert_eq!(
            parser.wm_start().map(|s| s.timestamp()),
            Some(Timestamp::from_elapsed(10)),
            "first state"
        );
        assert_eq!(
            parser.wm_end().map(|s| s.timestamp()),
            Some(Timestamp::from_elapsed(30)),
            "last state"
        );
        let subject = parser.wm_trace_subject().unwrap();
        assert_eq!(subject.subjects().len(), 3, "all states wrapped");
    }

    #[test]
    fn interned_regions_are_shared_across_entries() {
        let reader = flicker_fixtures::app_launch::reader().unwrap();
        let cache = Cache::default();
        let parser = SubjectsParser::with_interner(&reader, &cache);
        let bar = ComponentNameMatcher::STATUS_BAR.matcher();

        let first = parser.layers_start().unwrap().visible_region(Some(&bar)).unwrap();
        let last = parser.layers_end().unwrap().visible_region(Some(&bar)).unwrap();
        assert!(
            Arc::ptr_eq(first.shared_region(), last.shared_region()),
            "status bar region shared between snapshots"
        );

        let plain = SubjectsParser::new(&reader)
            .layers_start()
            .unwrap()
            .visible_region(Some(&bar))
            .unwrap();
        assert_eq!(plain, first, "same value without an interner");
        assert!(
            !Arc::ptr_eq(plain.shared_region(), first.shared_region()),
            "but its own allocation"
        );
    }
}
