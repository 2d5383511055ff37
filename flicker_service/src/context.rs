// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-run state: recorded results and interned values.
//!
//! A [`FlickerContext`] is passed explicitly to the code that records into
//! it. Tests isolate runs with [`FlickerContext::snapshot`] and
//! [`FlickerContext::restore`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use flicker_core::geometry::Region;
use flicker_subject::RegionInterner;

use crate::result::{AssertionResult, RunResult};
use crate::scenario::ScenarioId;

/// Assertion results recorded per scenario.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataStore {
    results: BTreeMap<ScenarioId, Vec<AssertionResult>>,
}

impl DataStore {
    /// Appends one result under its scenario.
    pub fn add_result(&mut self, result: AssertionResult) {
        self.results
            .entry(result.scenario.clone())
            .or_default()
            .push(result);
    }

    /// Appends every assertion result of a run.
    pub fn add_run(&mut self, run: &RunResult) {
        for result in &run.assertions {
            self.add_result(result.clone());
        }
    }

    /// Results recorded for `scenario`, oldest first.
    #[must_use]
    pub fn results(&self, scenario: &ScenarioId) -> &[AssertionResult] {
        self.results.get(scenario).map_or(&[][..], Vec::as_slice)
    }

    /// Returns `true` if anything was recorded for `scenario`.
    #[must_use]
    pub fn contains(&self, scenario: &ScenarioId) -> bool {
        self.results.contains_key(scenario)
    }

    /// Scenarios with recorded results.
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioId> + '_ {
        self.results.keys()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Forgets every result.
    pub fn clear(&mut self) {
        self.results.clear();
    }
}

/// Interns regions so equal values share one allocation.
///
/// [`FlickerService::process`](crate::FlickerService::process) hands the
/// cache to the subjects of every instance, so regions computed by checks
/// are deduplicated across the whole run.
#[derive(Clone, Debug, Default)]
pub struct Cache {
    regions: RefCell<HashSet<Arc<Region>>>,
}

impl Cache {
    /// The shared copy of `region`.
    pub fn intern(&self, region: Region) -> Arc<Region> {
        let mut regions = self.regions.borrow_mut();
        if let Some(found) = regions.get(&region) {
            return Arc::clone(found);
        }
        let shared = Arc::new(region);
        regions.insert(Arc::clone(&shared));
        shared
    }

    /// Number of distinct values held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.borrow().len()
    }

    /// Returns `true` if nothing is interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.borrow().is_empty()
    }

    /// Drops every interned value.
    pub fn clear(&mut self) {
        self.regions.get_mut().clear();
    }
}

impl RegionInterner for Cache {
    fn intern(&self, region: Region) -> Arc<Region> {
        Self::intern(self, region)
    }
}

/// The data store and cache of one run.
#[derive(Debug, Default)]
pub struct FlickerContext {
    /// Recorded results.
    pub data_store: DataStore,
    /// Interned values.
    pub cache: Cache,
}

/// A saved [`FlickerContext`].
#[derive(Clone, Debug)]
pub struct ContextSnapshot {
    data_store: DataStore,
    cache: Cache,
}

impl FlickerContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            data_store: self.data_store.clone(),
            cache: self.cache.clone(),
        }
    }

    /// Replaces the current state with `snapshot`.
    pub fn restore(&mut self, snapshot: ContextSnapshot) {
        self.data_store = snapshot.data_store;
        self.cache = snapshot.cache;
    }

    /// Empties both the store and the cache.
    pub fn clear(&mut self) {
        self.data_store.clear();
        self.cache.clear();
    }
}
