// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while configuring, extracting and evaluating.

use crate::scenario::ScenarioId;

/// Extraction of scenario instances from a trace failed.
///
/// These abort the extraction of one scenario; the others still run.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    /// A trace the extractor needs was not captured.
    #[error("missing {0} trace")]
    MissingTrace(&'static str),
    /// A scenario that needs a transition found none for a journey.
    #[error("no associated transition found for {0}")]
    NoAssociatedTransition(String),
    /// A scenario that needs exactly one transition found several.
    #[error("got too many associated transitions for {cuj}: expected 1 but got {count}")]
    TooManyTransitions {
        /// The journey being matched.
        cuj: String,
        /// How many transitions survived the filters.
        count: usize,
    },
    /// A transform was applied to transitions of the wrong shape.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// A dynamic component could not be resolved.
    #[error("{0}")]
    Component(String),
    /// The data model rejected derived data.
    #[error(transparent)]
    Core(#[from] flicker_core::Error),
}

/// The configuration registry was used incorrectly.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The scenario has not been registered.
    #[error("No scenario named '{0}' registered")]
    UnknownScenario(ScenarioId),
    /// The scenario is registered already.
    #[error("already has a registered scenario with name '{0}'")]
    DuplicateScenario(ScenarioId),
    /// The scenario already holds an assertion with this id.
    #[error("Assertion with id '{assertion}' already present for scenario '{scenario}'")]
    DuplicateAssertion {
        /// Scenario receiving the assertion.
        scenario: ScenarioId,
        /// Assertion id.
        assertion: String,
    },
    /// The scenario holds no assertion with this id.
    #[error("No assertion with id '{assertion}' registered for scenario '{scenario}'")]
    UnknownAssertion {
        /// Scenario searched.
        scenario: ScenarioId,
        /// Assertion id.
        assertion: String,
    },
    /// Overrides could not be parsed.
    #[error("invalid config overrides: {0}")]
    InvalidOverrides(#[from] serde_json::Error),
}

/// An assertion template could not register its checks.
///
/// The executor turns this into a failed assertion.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FlickerError {
    /// A component the template needs could not be resolved.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The template found the instance unusable.
    #[error("{0}")]
    Evaluation(String),
}
