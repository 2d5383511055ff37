// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Concrete occurrences of a scenario inside a trace.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use flicker_core::component::SharedMatcher;
use flicker_core::cuj::Cuj;
use flicker_core::reader::Reader;
use flicker_core::time::Timestamp;
use flicker_core::transition::Transition;

use crate::assertion::ScenarioAssertion;
use crate::components::ComponentTemplate;
use crate::error::ExtractionError;
use crate::scenario::{AssertionInvocationGroup, ScenarioId};
use crate::templates::AssertionTemplate;

/// A time window found by an extractor, before it is bound to a scenario.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceSlice {
    /// First timestamp of the window.
    pub start: Timestamp,
    /// Last timestamp of the window.
    pub end: Timestamp,
    /// The transition the window was built around, if any.
    pub associated_transition: Option<Transition>,
    /// The journey the window was built around, if any.
    pub associated_cuj: Option<Cuj>,
}

/// Assertion templates registered for a scenario, with their groups.
pub type AssertionSet = Vec<(Arc<dyn AssertionTemplate>, AssertionInvocationGroup)>;

/// One occurrence of a scenario.
///
/// Owns a reader restricted to its window and the assertion set that was
/// registered when it was extracted. Dynamic components are resolved on
/// first use and cached for the lifetime of the instance.
pub struct ScenarioInstance {
    scenario: ScenarioId,
    slice: TraceSlice,
    reader: Box<dyn Reader>,
    assertions: AssertionSet,
    components: RefCell<BTreeMap<&'static str, SharedMatcher>>,
}

impl fmt::Debug for ScenarioInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioInstance")
            .field("scenario", &self.scenario)
            .field("start", &self.slice.start)
            .field("end", &self.slice.end)
            .field("transition", &self.slice.associated_transition)
            .field("assertions", &self.assertions.len())
            .finish_non_exhaustive()
    }
}

impl ScenarioInstance {
    /// Binds a slice of `reader` to `scenario`.
    #[must_use]
    pub fn new(
        scenario: ScenarioId,
        slice: TraceSlice,
        reader: &dyn Reader,
        assertions: AssertionSet,
    ) -> Self {
        let reader = reader.slice(slice.start, slice.end);
        Self {
            scenario,
            slice,
            reader,
            assertions,
            components: RefCell::new(BTreeMap::new()),
        }
    }

    /// The scenario this is an occurrence of.
    #[must_use]
    pub fn scenario(&self) -> &ScenarioId {
        &self.scenario
    }

    /// First timestamp of the occurrence.
    #[must_use]
    pub fn start(&self) -> Timestamp {
        self.slice.start
    }

    /// Last timestamp of the occurrence.
    #[must_use]
    pub fn end(&self) -> Timestamp {
        self.slice.end
    }

    /// The transition the occurrence was built around.
    #[must_use]
    pub fn associated_transition(&self) -> Option<&Transition> {
        self.slice.associated_transition.as_ref()
    }

    /// The journey the occurrence was built around.
    #[must_use]
    pub fn associated_cuj(&self) -> Option<&Cuj> {
        self.slice.associated_cuj.as_ref()
    }

    /// Start transaction of the associated transition, `-1` if unknown.
    #[must_use]
    pub fn start_transaction_id(&self) -> i64 {
        self.associated_transition()
            .map_or(-1, Transition::start_transaction_id)
    }

    /// Finish transaction of the associated transition, `-1` if unknown.
    #[must_use]
    pub fn finish_transaction_id(&self) -> i64 {
        self.associated_transition()
            .map_or(-1, Transition::finish_transaction_id)
    }

    /// Traces restricted to the occurrence.
    #[must_use]
    pub fn reader(&self) -> &dyn Reader {
        self.reader.as_ref()
    }

    /// The assertion set captured at extraction.
    #[must_use]
    pub fn assertions(&self) -> &AssertionSet {
        &self.assertions
    }

    /// Resolves `template` for this occurrence.
    ///
    /// # Errors
    ///
    /// Propagates the template's resolution failure. Failures are not
    /// cached.
    pub fn resolve(&self, template: &ComponentTemplate) -> Result<SharedMatcher, ExtractionError> {
        if let Some(found) = self.components.borrow().get(template.name()) {
            return Ok(SharedMatcher::clone(found));
        }
        let resolved = template.build(self)?;
        self.components
            .borrow_mut()
            .insert(template.name(), SharedMatcher::clone(&resolved));
        Ok(resolved)
    }

    /// One executable assertion per registered template.
    #[must_use]
    pub fn generate_assertions(&self) -> Vec<ScenarioAssertion<'_>> {
        self.assertions
            .iter()
            .map(|(template, group)| ScenarioAssertion::new(self, Arc::clone(template), *group))
            .collect()
    }
}
