// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property checks that fail with expected/actual facts.

use std::fmt;

use flicker_core::time::Timestamp;

use crate::error::{AssertionError, CheckResult, Fact};

/// Starts a check of `actual`, labelled `label` in the failure message.
///
/// ```
/// use flicker_core::time::Timestamp;
/// use flicker_subject::check;
///
/// assert!(check("SF state size", 3, Timestamp::EMPTY).is_greater(0).is_ok());
/// let err = check("Rect area", 10, Timestamp::EMPTY).is_equal(12).unwrap_err();
/// assert_eq!(err.fact("Expected"), Some("12"));
/// ```
#[must_use]
pub fn check<T>(label: impl Into<String>, actual: T, timestamp: Timestamp) -> CheckSubject<T> {
    CheckSubject {
        label: label.into(),
        actual,
        timestamp,
        extra: Vec::new(),
    }
}

/// A value under test. Built with [`check`].
#[derive(Clone, Debug)]
pub struct CheckSubject<T> {
    label: String,
    actual: T,
    timestamp: Timestamp,
    extra: Vec<Fact>,
}

impl<T: fmt::Debug> CheckSubject<T> {
    /// Adds a fact reported on failure.
    #[must_use]
    pub fn with_fact(mut self, fact: Fact) -> Self {
        self.extra.push(fact);
        self
    }

    fn fail(&self, expected: impl fmt::Display) -> AssertionError {
        let mut err = AssertionError::failed(self.label.clone())
            .with_fact(Fact::new("Expected", expected))
            .with_fact(Fact::new("Actual", format_args!("{:?}", self.actual)))
            .with_facts(self.extra.iter().cloned());
        if !self.timestamp.is_empty() {
            err = err.at(self.timestamp);
        }
        err
    }

    fn ensure(&self, ok: bool, expected: impl fmt::Display) -> CheckResult {
        if ok { Ok(()) } else { Err(self.fail(expected)) }
    }
}

impl<T: PartialEq + fmt::Debug> CheckSubject<T> {
    /// Fails unless the value equals `expected`.
    pub fn is_equal(&self, expected: T) -> CheckResult {
        self.ensure(self.actual == expected, format_args!("{expected:?}"))
    }

    /// Fails if the value equals `unexpected`.
    pub fn is_not_equal(&self, unexpected: T) -> CheckResult {
        self.ensure(
            self.actual != unexpected,
            format_args!("Different from {unexpected:?}"),
        )
    }
}

impl<T: PartialOrd + fmt::Debug> CheckSubject<T> {
    /// Fails unless the value is strictly lower.
    pub fn is_lower(&self, bound: T) -> CheckResult {
        self.ensure(self.actual < bound, format_args!("Lower than {bound:?}"))
    }

    /// Fails unless the value is lower or equal.
    pub fn is_lower_or_equal(&self, bound: T) -> CheckResult {
        self.ensure(
            self.actual <= bound,
            format_args!("Lower or equal to {bound:?}"),
        )
    }

    /// Fails unless the value is strictly greater.
    pub fn is_greater(&self, bound: T) -> CheckResult {
        self.ensure(self.actual > bound, format_args!("Greater than {bound:?}"))
    }

    /// Fails unless the value is greater or equal.
    pub fn is_greater_or_equal(&self, bound: T) -> CheckResult {
        self.ensure(
            self.actual >= bound,
            format_args!("Greater or equal to {bound:?}"),
        )
    }
}

impl<T: fmt::Debug> CheckSubject<Option<T>> {
    /// Fails unless the value is absent.
    pub fn is_none(&self) -> CheckResult {
        self.ensure(self.actual.is_none(), "None")
    }

    /// Fails unless the value is present.
    pub fn is_some(&self) -> CheckResult {
        self.ensure(self.actual.is_some(), "Not null")
    }
}

impl<T: PartialEq + fmt::Debug> CheckSubject<Vec<T>> {
    /// Fails unless the list contains `item`.
    pub fn contains(&self, item: &T) -> CheckResult {
        self.ensure(self.actual.contains(item), format_args!("Contain {item:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_report_expectation() {
        let at = Timestamp::from_elapsed(5);
        assert!(check("Top position", 10, at).is_lower_or_equal(10).is_ok(), "equal is fine");
        let err = check("Top position", 10, at).is_lower(10).unwrap_err();
        assert_eq!(err.message(), "Top position", "label is the message");
        assert_eq!(err.fact("Expected"), Some("Lower than 10"), "expectation");
        assert_eq!(err.fact("Actual"), Some("10"), "actual");
        assert!(err.fact("Timestamp").is_some(), "timestamp recorded");
    }

    #[test]
    fn option_and_list_checks() {
        assert!(check("x", None::<i32>, Timestamp::EMPTY).is_none().is_ok(), "none");
        assert!(check("x", Some(1), Timestamp::EMPTY).is_none().is_err(), "some");
        let names = vec!["a", "b"];
        assert!(check("names", names.clone(), Timestamp::EMPTY).contains(&"b").is_ok(), "found");
        assert!(check("names", names, Timestamp::EMPTY).contains(&"c").is_err(), "missing");
    }
}
