// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Assertions over whole traces.

use std::collections::BTreeSet;
use std::fmt;

use flicker_core::time::Timestamp;

use crate::FlickerSubject;
use crate::check::check;
use crate::checker::AssertionsChecker;
use crate::error::{AssertionError, CheckResult, Fact};

/// A trace viewed as a sequence of per-entry subjects.
///
/// Checks registered one after another form a single block that must hold
/// on the same entries; [`then`](Self::then) starts the next block. The
/// blocks are evaluated with [`for_all_entries`](Self::for_all_entries).
///
/// Layer and window-manager specific registrations live on
/// [`LayersTraceSubject`](crate::LayersTraceSubject) and
/// [`WindowManagerTraceSubject`](crate::WindowManagerTraceSubject).
pub struct TraceSubject<S> {
    subjects: Vec<S>,
    checker: AssertionsChecker<S>,
    new_block: bool,
}

impl<S: fmt::Debug> fmt::Debug for TraceSubject<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSubject")
            .field("entries", &self.subjects.len())
            .field("checker", &self.checker)
            .finish_non_exhaustive()
    }
}

impl<S: FlickerSubject> TraceSubject<S> {
    /// Wraps per-entry subjects.
    #[must_use]
    pub fn from_subjects(subjects: Vec<S>) -> Self {
        Self {
            subjects,
            checker: AssertionsChecker::new(),
            new_block: true,
        }
    }

    /// Per-entry subjects in trace order.
    #[must_use]
    pub fn subjects(&self) -> &[S] {
        &self.subjects
    }

    /// The first entry.
    #[must_use]
    pub fn first(&self) -> Option<&S> {
        self.subjects.first()
    }

    /// The last entry.
    #[must_use]
    pub fn last(&self) -> Option<&S> {
        self.subjects.last()
    }

    /// The entry with exactly this timestamp.
    #[must_use]
    pub fn entry(&self, timestamp: Timestamp) -> Option<&S> {
        self.subjects.iter().find(|s| s.timestamp() == timestamp)
    }

    /// The registered blocks.
    #[must_use]
    pub fn checker(&self) -> &AssertionsChecker<S> {
        &self.checker
    }

    /// Registers a named check on the current block.
    pub fn invoke(
        &mut self,
        name: impl Into<String>,
        optional: bool,
        check: impl Fn(&S) -> CheckResult + 'static,
    ) -> &mut Self {
        if self.new_block {
            self.checker.add(name, optional, check);
        } else {
            self.checker.append(name, optional, check);
        }
        self.new_block = false;
        self
    }

    /// Ends the current block; the next check starts a new one.
    pub fn then(&mut self) -> &mut Self {
        self.new_block = true;
        self
    }

    /// Ignore leading entries until the first block passes.
    pub fn skip_until_first_assertion(&mut self) -> &mut Self {
        self.checker.skip_until_first_assertion();
        self
    }

    /// Runs the registered blocks over every entry.
    ///
    /// # Errors
    ///
    /// See [`AssertionsChecker::test`].
    pub fn for_all_entries(&self) -> CheckResult {
        self.checker.test(&self.subjects)
    }

    /// Runs the registered blocks over entries in `[start, end]`.
    ///
    /// # Errors
    ///
    /// See [`AssertionsChecker::test`].
    pub fn for_range(&self, start: Timestamp, end: Timestamp) -> CheckResult {
        let in_range: Vec<usize> = self
            .subjects
            .iter()
            .enumerate()
            .filter(|(_, s)| s.timestamp() >= start && s.timestamp() <= end)
            .map(|(i, _)| i)
            .collect();
        match (in_range.first(), in_range.last()) {
            (Some(&from), Some(&to)) => self.checker.test(&self.subjects[from..=to]),
            _ => Ok(()),
        }
    }

    /// Fails unless the trace has no entries.
    pub fn is_empty(&self) -> CheckResult {
        check("Trace is empty", self.subjects.is_empty(), Timestamp::EMPTY).is_equal(true)
    }

    /// Fails if the trace has no entries.
    pub fn is_not_empty(&self) -> CheckResult {
        check("Trace is not empty", self.subjects.is_empty(), Timestamp::EMPTY).is_equal(false)
    }

    /// Fails if an element appears for a single entry only.
    ///
    /// `visible` names the elements shown in an entry. An element visible in
    /// the first or last entry only is fine: the trace may have been cut.
    pub(crate) fn visible_entries_shown_more_than_one_consecutive_time(
        &self,
        visible: impl Fn(&S) -> BTreeSet<String>,
    ) -> CheckResult {
        let sets: Vec<BTreeSet<String>> = self.subjects.iter().map(visible).collect();
        let last = sets.len().saturating_sub(1);
        for (i, names) in sets.iter().enumerate() {
            if i == 0 || i == last {
                continue;
            }
            for name in names {
                if !sets[i - 1].contains(name) && !sets[i + 1].contains(name) {
                    return Err(AssertionError::failed(format!(
                        "{name} was visible for only one entry"
                    ))
                    .at(self.subjects[i].timestamp())
                    .with_fact(Fact::new("Element", name))
                    .with_fact(Fact::new("Previous entry", self.subjects[i - 1].timestamp()))
                    .with_fact(Fact::new("Next entry", self.subjects[i + 1].timestamp())));
                }
            }
        }
        Ok(())
    }
}
