// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured assertion failures.

use std::fmt;

use flicker_core::time::Timestamp;

/// One labelled piece of evidence attached to a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fact {
    /// What the value describes.
    pub label: String,
    /// The rendered value.
    pub value: String,
}

impl Fact {
    /// Creates a fact from anything printable.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// A failed check: a message followed by the facts that explain it.
///
/// ```
/// use flicker_subject::{AssertionError, Fact};
///
/// let err = AssertionError::failed("Top position")
///     .with_fact(Fact::new("Expected", 0))
///     .with_fact(Fact::new("Actual", 12));
/// assert_eq!(err.to_string(), "Top position\nExpected: 0\nActual: 12");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", FactLines(.facts))]
pub struct AssertionError {
    message: String,
    facts: Vec<Fact>,
}

struct FactLines<'a>(&'a [Fact]);

impl fmt::Display for FactLines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fact in self.0 {
            write!(f, "\n{fact}")?;
        }
        Ok(())
    }
}

impl AssertionError {
    /// A generic failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            facts: Vec::new(),
        }
    }

    /// An element was expected to exist and does not, or the reverse.
    #[must_use]
    pub fn invalid_element(element: &str, expect_exists: bool) -> Self {
        let expectation = if expect_exists { "exist" } else { "not exist" };
        Self::failed(format!("Expected {element} to {expectation}"))
            .with_fact(Fact::new("Element", element))
    }

    /// An element was expected to be visible and is not, or the reverse.
    #[must_use]
    pub fn incorrect_visibility(element: &str, expect_visible: bool) -> Self {
        let expectation = if expect_visible { "visible" } else { "invisible" };
        Self::failed(format!("Expected {element} to be {expectation}"))
            .with_fact(Fact::new("Element", element))
    }

    /// A region did not have the expected shape or position.
    #[must_use]
    pub fn incorrect_region(check: &str) -> Self {
        Self::failed(format!("Incorrect region: {check}"))
    }

    /// Appends a fact.
    #[must_use]
    pub fn with_fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    /// Appends several facts.
    #[must_use]
    pub fn with_facts(mut self, facts: impl IntoIterator<Item = Fact>) -> Self {
        self.facts.extend(facts);
        self
    }

    /// Records when the failing state was captured.
    #[must_use]
    pub fn at(self, timestamp: Timestamp) -> Self {
        self.with_fact(Fact::new("Timestamp", timestamp))
    }

    /// The headline.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Evidence, in the order it was added.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// The value of the first fact with this label.
    #[must_use]
    pub fn fact(&self, label: &str) -> Option<&str> {
        self.facts
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

/// Outcome of a check.
pub type CheckResult<T = ()> = Result<T, AssertionError>;
