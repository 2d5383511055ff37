// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outcomes of a run.

use std::fmt;

use flicker_subject::AssertionError;

use crate::scenario::{AssertionInvocationGroup, ScenarioId};

/// The outcome of one assertion on one scenario instance.
#[derive(Clone, Debug, PartialEq)]
pub struct AssertionResult {
    /// `SCENARIO::assertion-id`.
    pub name: String,
    /// The scenario the instance belongs to.
    pub scenario: ScenarioId,
    /// Whether a failure fails the run.
    pub stability_group: AssertionInvocationGroup,
    /// Failures, empty when the assertion passed.
    pub errors: Vec<AssertionError>,
}

impl AssertionResult {
    /// Returns `true` if no check failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` if this result fails the run.
    #[must_use]
    pub fn is_blocking_failure(&self) -> bool {
        !self.passed() && self.stability_group == AssertionInvocationGroup::Blocking
    }
}

/// Overall verdict of a run, from worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunStatus {
    /// Some scenario could not be extracted.
    ExtractionFailed,
    /// A blocking assertion failed.
    AssertionFailed,
    /// Only non-blocking assertions failed.
    NonBlockingFailed,
    /// Everything passed.
    Passed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExtractionFailed => "EXTRACTION_FAILED",
            Self::AssertionFailed => "ASSERTION_FAILED",
            Self::NonBlockingFailed => "NON_BLOCKING_FAILED",
            Self::Passed => "PASSED",
        })
    }
}

/// A scenario whose extraction failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionFailure {
    /// The scenario.
    pub scenario: ScenarioId,
    /// Rendered error.
    pub message: String,
}

/// Everything a run produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunResult {
    /// Assertion outcomes in execution order.
    pub assertions: Vec<AssertionResult>,
    /// Scenarios that could not be extracted.
    pub extraction_failures: Vec<ExtractionFailure>,
}

impl RunResult {
    /// The verdict: the worst outcome wins.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if !self.extraction_failures.is_empty() {
            RunStatus::ExtractionFailed
        } else if self.assertions.iter().any(AssertionResult::is_blocking_failure) {
            RunStatus::AssertionFailed
        } else if self.assertions.iter().any(|a| !a.passed()) {
            RunStatus::NonBlockingFailed
        } else {
            RunStatus::Passed
        }
    }

    /// Failed assertions.
    pub fn failures(&self) -> impl Iterator<Item = &AssertionResult> + '_ {
        self.assertions.iter().filter(|a| !a.passed())
    }

    /// Results for one scenario.
    pub fn for_scenario<'a>(
        &'a self,
        scenario: &'a ScenarioId,
    ) -> impl Iterator<Item = &'a AssertionResult> + 'a {
        self.assertions.iter().filter(move |a| &a.scenario == scenario)
    }
}
