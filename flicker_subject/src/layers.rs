// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Assertions over compositor layer snapshots.

use std::collections::BTreeSet;
use std::fmt;

use flicker_core::component::{ComponentMatcher, ComponentNameMatcher, SharedMatcher};
use flicker_core::geometry::Region;
use flicker_core::layers::{Layer, LayerTraceEntry, LayersTrace};
use flicker_core::time::Timestamp;

use crate::FlickerSubject;
use crate::check::check;
use crate::error::{AssertionError, CheckResult, Fact};
use crate::region::{RegionInterner, RegionSubject};
use crate::trace::TraceSubject;

/// Assertions over one layer snapshot.
#[derive(Clone, Copy)]
pub struct LayerTraceEntrySubject<'a> {
    entry: &'a LayerTraceEntry,
    interner: Option<&'a dyn RegionInterner>,
}

impl fmt::Debug for LayerTraceEntrySubject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerTraceEntrySubject({})", self.entry.timestamp())
    }
}

impl FlickerSubject for LayerTraceEntrySubject<'_> {
    fn timestamp(&self) -> Timestamp {
        self.entry.timestamp()
    }
}

impl<'a> LayerTraceEntrySubject<'a> {
    /// Wraps a snapshot.
    #[must_use]
    pub fn new(entry: &'a LayerTraceEntry) -> Self {
        Self {
            entry,
            interner: None,
        }
    }

    /// Routes the regions this subject builds through `interner`.
    #[must_use]
    pub fn with_interner(self, interner: &'a dyn RegionInterner) -> Self {
        Self {
            interner: Some(interner),
            ..self
        }
    }

    /// The snapshot under test.
    #[must_use]
    pub fn entry(&self) -> &'a LayerTraceEntry {
        self.entry
    }

    /// The first layer matching `matcher`.
    #[must_use]
    pub fn layer(&self, matcher: &dyn ComponentMatcher) -> Option<&'a Layer> {
        matcher.matching_layers(self.entry).into_iter().next()
    }

    /// Fails unless the snapshot has no layers.
    pub fn is_empty(&self) -> CheckResult<&Self> {
        check("SF state size", self.entry.layers().len(), self.timestamp()).is_equal(0)?;
        Ok(self)
    }

    /// Fails if the snapshot has no layers.
    pub fn is_not_empty(&self) -> CheckResult<&Self> {
        check("SF state size", self.entry.layers().len(), self.timestamp()).is_greater(0)?;
        Ok(self)
    }

    /// Fails unless some layer matches.
    pub fn contains(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        if self.layer(matcher).is_some() {
            return Ok(self);
        }
        Err(
            AssertionError::invalid_element(&matcher.to_layer_identifier(), true)
                .at(self.timestamp()),
        )
    }

    /// Fails if any layer matches.
    pub fn not_contains(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        let found = matcher.matching_layers(self.entry);
        if found.is_empty() {
            return Ok(self);
        }
        Err(
            AssertionError::invalid_element(&matcher.to_layer_identifier(), false)
                .at(self.timestamp())
                .with_facts(found.iter().map(|l| Fact::new("Found", l))),
        )
    }

    /// Fails unless a matching layer exists and at least one is visible.
    pub fn is_visible(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        self.contains(matcher)?;
        let matched = matcher.matching_layers(self.entry);
        if matched.iter().any(|l| l.is_visible()) {
            return Ok(self);
        }
        Err(
            AssertionError::incorrect_visibility(&matcher.to_layer_identifier(), true)
                .at(self.timestamp())
                .with_facts(
                    matched
                        .iter()
                        .map(|l| Fact::new(&l.name, l.visibility_reason().join(", "))),
                ),
        )
    }

    /// Fails if any matching layer is visible. Absent layers are invisible.
    pub fn is_invisible(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        let visible: Vec<&Layer> = matcher
            .matching_layers(self.entry)
            .into_iter()
            .filter(|l| l.is_visible())
            .collect();
        if visible.is_empty() {
            return Ok(self);
        }
        Err(
            AssertionError::incorrect_visibility(&matcher.to_layer_identifier(), false)
                .at(self.timestamp())
                .with_facts(visible.iter().map(|l| Fact::new("Is visible", &l.name))),
        )
    }

    /// Fails unless every matching layer has rounded corners.
    pub fn has_rounded_corners(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        self.contains(matcher)?;
        let matched = matcher.matching_layers(self.entry);
        if matched.iter().all(|l| l.has_rounded_corners()) {
            return Ok(self);
        }
        Err(AssertionError::failed("RoundedCorners")
            .at(self.timestamp())
            .with_fact(Fact::new("Expected", "Not 0"))
            .with_fact(Fact::new("Actual", "0"))
            .with_fact(Fact::new("Filter", matcher.to_layer_identifier())))
    }

    /// Fails unless the snapshot records a display.
    pub fn contains_at_least_one_display(&self) -> CheckResult<&Self> {
        check("Displays", self.entry.displays().len(), self.timestamp()).is_greater(0)?;
        Ok(self)
    }

    /// The region shown by the visible layers matching `matcher`, or by all
    /// visible layers when `matcher` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if no layer matches.
    pub fn visible_region(
        &self,
        matcher: Option<&dyn ComponentMatcher>,
    ) -> CheckResult<RegionSubject> {
        let selected: Vec<&Layer> = match matcher {
            Some(m) => m.matching_layers(self.entry),
            None => self.entry.layers().iter().collect(),
        };
        if selected.is_empty() {
            let id = matcher.map_or_else(|| String::from("<any>"), |m| m.to_layer_identifier());
            return Err(AssertionError::invalid_element(&id, true).at(self.timestamp()));
        }
        let region = selected
            .iter()
            .filter(|l| l.is_visible())
            .fold(Region::new(), |acc, l| acc.union(&l.effective_visible_region()));
        Ok(RegionSubject::interned(region, self.timestamp(), self.interner))
    }

    /// Runs a custom check on the raw snapshot.
    pub fn check_with(
        &self,
        f: impl FnOnce(&LayerTraceEntry) -> CheckResult,
    ) -> CheckResult<&Self> {
        f(self.entry)?;
        Ok(self)
    }
}

/// Assertions over a layers trace.
pub type LayersTraceSubject<'a> = TraceSubject<LayerTraceEntrySubject<'a>>;

/// Layers that legitimately flash for a single entry while an app starts.
#[must_use]
pub fn transient_layers() -> Vec<SharedMatcher> {
    vec![
        ComponentNameMatcher::SPLASH_SCREEN.shared(),
        ComponentNameMatcher::SNAPSHOT.shared(),
        ComponentNameMatcher::IME_SNAPSHOT.shared(),
    ]
}

impl<'a> TraceSubject<LayerTraceEntrySubject<'a>> {
    /// Wraps every snapshot of `trace`.
    #[must_use]
    pub fn of_layers(trace: &'a LayersTrace) -> Self {
        Self::from_subjects(trace.entries().iter().map(LayerTraceEntrySubject::new).collect())
    }

    fn add_layer_check(
        &mut self,
        name: &str,
        matcher: &SharedMatcher,
        optional: bool,
        f: fn(&LayerTraceEntrySubject<'_>, &dyn ComponentMatcher) -> CheckResult,
    ) -> &mut Self {
        let m = SharedMatcher::clone(matcher);
        let name = format!("{name}({})", m.to_layer_identifier());
        self.invoke(name, optional, move |s| f(s, m.as_ref()))
    }

    /// Registers "a matching layer exists".
    pub fn contains(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_layer_check("contains", matcher, false, |s, m| s.contains(m).map(drop))
    }

    /// Registers "no matching layer exists".
    pub fn not_contains(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_layer_check("notContains", matcher, false, |s, m| s.not_contains(m).map(drop))
    }

    /// Registers an optional "no matching layer exists".
    pub fn not_contains_optional(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_layer_check("notContains", matcher, true, |s, m| s.not_contains(m).map(drop))
    }

    /// Registers "a matching layer is visible".
    pub fn is_visible(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_layer_check("isVisible", matcher, false, |s, m| s.is_visible(m).map(drop))
    }

    /// Registers an optional "a matching layer is visible".
    pub fn is_visible_optional(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_layer_check("isVisible", matcher, true, |s, m| s.is_visible(m).map(drop))
    }

    /// Registers "no matching layer is visible".
    pub fn is_invisible(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_layer_check("isInvisible", matcher, false, |s, m| s.is_invisible(m).map(drop))
    }

    /// Registers an optional "no matching layer is visible".
    pub fn is_invisible_optional(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_layer_check("isInvisible", matcher, true, |s, m| s.is_invisible(m).map(drop))
    }

    /// Fails if a visible layer, other than those matched by `ignore`, is
    /// shown for a single entry.
    ///
    /// # Errors
    ///
    /// Names the first such layer.
    pub fn visible_layers_shown_more_than_one_consecutive_entry(
        &self,
        ignore: &[SharedMatcher],
    ) -> CheckResult {
        self.visible_entries_shown_more_than_one_consecutive_time(|s| {
            let entry = s.entry();
            entry
                .visible_layers()
                .filter(|l| !ignore.iter().any(|m| m.layer_matches(entry, l)))
                .map(|l| l.name.clone())
                .collect::<BTreeSet<String>>()
        })
    }

    /// Visible regions of the matching layers, entry by entry.
    ///
    /// # Errors
    ///
    /// Fails on the first entry without a matching layer.
    pub fn visible_regions(
        &self,
        matcher: Option<&dyn ComponentMatcher>,
    ) -> CheckResult<Vec<RegionSubject>> {
        self.subjects()
            .iter()
            .map(|s| s.visible_region(matcher))
            .collect()
    }
}
