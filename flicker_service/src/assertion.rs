// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An assertion template bound to one scenario instance.

use std::fmt;
use std::sync::Arc;

use flicker_subject::{AssertionError, Fact};

use crate::flicker_test::FlickerTest;
use crate::instance::ScenarioInstance;
use crate::parser::SubjectsParser;
use crate::result::AssertionResult;
use crate::scenario::AssertionInvocationGroup;
use crate::templates::AssertionTemplate;

/// A template ready to run against one instance.
pub struct ScenarioAssertion<'i> {
    instance: &'i ScenarioInstance,
    template: Arc<dyn AssertionTemplate>,
    stability_group: AssertionInvocationGroup,
    name: String,
}

impl fmt::Debug for ScenarioAssertion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioAssertion")
            .field("name", &self.name)
            .field("stability_group", &self.stability_group)
            .finish_non_exhaustive()
    }
}

impl<'i> ScenarioAssertion<'i> {
    /// Binds `template` to `instance`.
    #[must_use]
    pub fn new(
        instance: &'i ScenarioInstance,
        template: Arc<dyn AssertionTemplate>,
        stability_group: AssertionInvocationGroup,
    ) -> Self {
        let name = format!("{}::{}", instance.scenario(), template.id());
        Self {
            instance,
            template,
            stability_group,
            name,
        }
    }

    /// `SCENARIO::assertion-id`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a failure fails the run.
    #[must_use]
    pub fn stability_group(&self) -> AssertionInvocationGroup {
        self.stability_group
    }

    /// The instance the assertion runs on.
    #[must_use]
    pub fn instance(&self) -> &'i ScenarioInstance {
        self.instance
    }

    /// Evaluates the template and runs the checks it registered.
    ///
    /// Never fails: if the template cannot register its checks, the error
    /// becomes a failure of its own, after any checks registered before it.
    #[must_use]
    pub fn execute(&self) -> AssertionResult {
        self.execute_with(&SubjectsParser::new(self.instance.reader()))
    }

    /// Like [`execute`](Self::execute), with subjects from `parser`.
    ///
    /// `parser` must read the instance's own reader.
    #[must_use]
    pub fn execute_with(&self, parser: &SubjectsParser<'_>) -> AssertionResult {
        let _span = tracing::debug_span!("assertion", name = %self.name).entered();
        let mut test = FlickerTest::new();
        let evaluated = self.template.evaluate(self.instance, &mut test);
        let mut errors = test.run(parser);
        if let Err(err) = evaluated {
            tracing::warn!(%err, "template evaluation failed");
            errors.push(
                AssertionError::failed(format!("Failed to evaluate {}", self.template.id()))
                    .with_fact(Fact::new("Cause", &err)),
            );
        }
        if errors.is_empty() {
            tracing::debug!("passed");
        } else {
            tracing::debug!(failures = errors.len(), "failed");
        }
        AssertionResult {
            name: self.name.clone(),
            scenario: self.instance.scenario().clone(),
            stability_group: self.stability_group,
            errors,
        }
    }
}
