// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered assertions over a sequence of states.
//!
//! An [`AssertionsChecker`] holds a list of [`CompoundAssertion`] blocks and
//! walks a sequence of subjects with them. The first block must hold for a
//! prefix of the sequence, then the next block takes over from the first
//! entry where the current one fails, and so on. Each block must pass on at
//! least one entry unless it is optional, and every non-optional block must
//! be reached before the sequence ends.

use std::fmt;

use tracing::trace;

use crate::FlickerSubject;
use crate::error::{AssertionError, CheckResult, Fact};

/// A check applied to one subject.
pub type AssertionFn<T> = Box<dyn Fn(&T) -> CheckResult>;

/// A named check.
pub struct NamedAssertion<T> {
    name: String,
    optional: bool,
    check: AssertionFn<T>,
}

impl<T> NamedAssertion<T> {
    /// Wraps `check` under `name`.
    pub fn new(
        name: impl Into<String>,
        optional: bool,
        check: impl Fn(&T) -> CheckResult + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            optional,
            check: Box::new(check),
        }
    }

    /// The name used in failure messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a failure may be tolerated.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Runs the check.
    pub fn invoke(&self, target: &T) -> CheckResult {
        (self.check)(target)
    }
}

impl<T> fmt::Debug for NamedAssertion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedAssertion")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

/// Closures cannot be compared; two assertions are equal when their names
/// and optionality are.
impl<T> PartialEq for NamedAssertion<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.optional == other.optional
    }
}

/// Several checks evaluated together against the same subject.
///
/// Every check runs, even after one fails. The result is the first failure
/// of a non-optional check, or else the first failure of any check.
pub struct CompoundAssertion<T> {
    assertions: Vec<NamedAssertion<T>>,
}

impl<T> CompoundAssertion<T> {
    /// Starts a block with one check.
    pub fn new(
        name: impl Into<String>,
        optional: bool,
        check: impl Fn(&T) -> CheckResult + 'static,
    ) -> Self {
        Self {
            assertions: vec![NamedAssertion::new(name, optional, check)],
        }
    }

    /// Adds a check to the block.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        optional: bool,
        check: impl Fn(&T) -> CheckResult + 'static,
    ) {
        self.assertions.push(NamedAssertion::new(name, optional, check));
    }

    /// Names of all checks joined with `and`.
    #[must_use]
    pub fn name(&self) -> String {
        let names: Vec<&str> = self.assertions.iter().map(NamedAssertion::name).collect();
        names.join(" and ")
    }

    /// A block is optional when all of its checks are.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.assertions.iter().all(NamedAssertion::is_optional)
    }

    /// The individual checks.
    #[must_use]
    pub fn assertions(&self) -> &[NamedAssertion<T>] {
        &self.assertions
    }

    /// Runs every check against `target`.
    pub fn invoke(&self, target: &T) -> CheckResult {
        let failures: Vec<(bool, AssertionError)> = self
            .assertions
            .iter()
            .filter_map(|a| a.invoke(target).err().map(|e| (a.is_optional(), e)))
            .collect();
        let first_blocking = failures.iter().position(|(optional, _)| !optional);
        match first_blocking.or(if failures.is_empty() { None } else { Some(0) }) {
            Some(i) => Err(failures[i].1.clone()),
            None => Ok(()),
        }
    }
}

impl<T> fmt::Debug for CompoundAssertion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompoundAssertion({})", self.name())
    }
}

impl<T> fmt::Display for CompoundAssertion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl<T> PartialEq for CompoundAssertion<T> {
    fn eq(&self, other: &Self) -> bool {
        self.assertions == other.assertions
    }
}

/// Runs blocks of assertions in order over a sequence of subjects.
pub struct AssertionsChecker<T> {
    assertions: Vec<CompoundAssertion<T>>,
    skip_until_first_assertion: bool,
}

impl<T> Default for AssertionsChecker<T> {
    fn default() -> Self {
        Self {
            assertions: Vec::new(),
            skip_until_first_assertion: false,
        }
    }
}

impl<T> fmt::Debug for AssertionsChecker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionsChecker")
            .field("assertions", &self.assertions)
            .field("skip_until_first_assertion", &self.skip_until_first_assertion)
            .finish()
    }
}

impl<T> PartialEq for AssertionsChecker<T> {
    fn eq(&self, other: &Self) -> bool {
        self.skip_until_first_assertion == other.skip_until_first_assertion
            && self.assertions == other.assertions
    }
}

impl<T: FlickerSubject> AssertionsChecker<T> {
    /// An empty checker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no assertion was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// The blocks, in order.
    #[must_use]
    pub fn blocks(&self) -> &[CompoundAssertion<T>] {
        &self.assertions
    }

    /// Starts a new block.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        optional: bool,
        check: impl Fn(&T) -> CheckResult + 'static,
    ) {
        self.assertions.push(CompoundAssertion::new(name, optional, check));
    }

    /// Adds a check to the last block, starting one if there is none.
    pub fn append(
        &mut self,
        name: impl Into<String>,
        optional: bool,
        check: impl Fn(&T) -> CheckResult + 'static,
    ) {
        match self.assertions.last_mut() {
            Some(last) => last.add(name, optional, check),
            None => self.add(name, optional, check),
        }
    }

    /// Ignore failures on leading entries until the first block passes.
    pub fn skip_until_first_assertion(&mut self) {
        self.skip_until_first_assertion = true;
    }

    /// Walks `entries` with the blocks.
    ///
    /// # Errors
    ///
    /// The failure of a block that never passed, `Assertion never passed` if
    /// no block ever passed, or `Assertion N never failed` if the sequence
    /// ended while non-optional blocks were still untested.
    pub fn test(&self, entries: &[T]) -> CheckResult {
        if self.assertions.is_empty() || entries.is_empty() {
            return Ok(());
        }

        let mut entry_index = 0;
        let mut assertion_index = 0;
        let mut last_passed: Option<usize> = None;
        while assertion_index < self.assertions.len() && entry_index < entries.len() {
            let current = &self.assertions[assertion_index];
            let entry = &entries[entry_index];
            trace!(
                assertion = assertion_index + 1,
                of = self.assertions.len(),
                name = %current,
                entry = entry_index + 1,
                at = %entry.timestamp(),
                "checking"
            );
            let Err(failure) = current.invoke(entry) else {
                last_passed = Some(assertion_index);
                entry_index += 1;
                continue;
            };
            if self.skip_until_first_assertion && last_passed.is_none() {
                entry_index += 1;
                continue;
            }
            if current.is_optional() {
                last_passed = Some(assertion_index);
                assertion_index += 1;
                continue;
            }
            if last_passed != Some(assertion_index) {
                return Err(failure);
            }
            assertion_index += 1;
            if assertion_index == self.assertions.len() {
                return Err(failure);
            }
        }

        if last_passed.is_none() {
            let first = &entries[0];
            return Err(AssertionError::failed(format!(
                "Assertion never passed {}",
                self.assertions[0]
            ))
            .at(first.timestamp())
            .with_facts(
                self.assertions
                    .iter()
                    .enumerate()
                    .map(|(i, a)| Fact::new(format!("Assertion{i}"), a)),
            ));
        }

        let untested = self.assertions.get(assertion_index + 1..).unwrap_or(&[]);
        if untested.iter().any(|a| !a.is_optional()) {
            let last = &entries[entries.len() - 1];
            return Err(AssertionError::failed(format!(
                "Assertion {assertion_index} never failed: {}",
                self.assertions[assertion_index]
            ))
            .at(last.timestamp())
            .with_facts(
                self.assertions[..assertion_index]
                    .iter()
                    .map(|a| Fact::new("Passed", a)),
            )
            .with_facts(untested.iter().map(|a| Fact::new("Untested", a))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::time::Timestamp;

    /// A state with a single letter, for readable sequences.
    #[derive(Debug)]
    struct Letter(usize, char);

    impl FlickerSubject for Letter {
        fn timestamp(&self) -> Timestamp {
            Timestamp::from_elapsed(self.0 as i64)
        }
    }

    fn letters(s: &str) -> Vec<Letter> {
        s.chars().enumerate().map(|(i, c)| Letter(i + 1, c)).collect()
    }

    fn is(c: char) -> impl Fn(&Letter) -> CheckResult {
        move |l: &Letter| {
            if l.1 == c {
                Ok(())
            } else {
                Err(AssertionError::failed(format!("expected {c}, got {}", l.1)))
            }
        }
    }

    fn checker(blocks: &[(char, bool)]) -> AssertionsChecker<Letter> {
        let mut c = AssertionsChecker::new();
        for &(letter, optional) in blocks {
            c.add(format!("is {letter}"), optional, is(letter));
        }
        c
    }

    #[test]
    fn sequence_passes_in_order() {
        let c = checker(&[('a', false), ('b', false), ('c', false)]);
        assert!(c.test(&letters("aabbbc")).is_ok(), "a then b then c");
    }

    #[test]
    fn first_assertion_must_hold_at_start() {
        let c = checker(&[('a', false), ('b', false)]);
        let err = c.test(&letters("bb")).unwrap_err();
        assert_eq!(err.message(), "expected a, got b", "first failure surfaces");
    }

    #[test]
    fn skip_until_first_assertion_ignores_leading_entries() {
        let mut c = checker(&[('a', false), ('b', false)]);
        c.skip_until_first_assertion();
        assert!(c.test(&letters("xxab")).is_ok(), "leading x skipped");
        let err = c.test(&letters("xxx")).unwrap_err();
        assert!(err.message().starts_with("Assertion never passed"), "{err}");
    }

    #[test]
    fn trace_ending_early_reports_untested() {
        let c = checker(&[('a', false), ('b', false), ('c', false)]);
        let err = c.test(&letters("aab")).unwrap_err();
        assert!(err.message().starts_with("Assertion 1 never failed"), "{err}");
        assert_eq!(err.fact("Untested"), Some("is c"), "c never reached");
    }

    #[test]
    fn optional_block_may_be_skipped() {
        let c = checker(&[('a', false), ('s', true), ('b', false)]);
        assert!(c.test(&letters("aabb")).is_ok(), "no s at all");
        assert!(c.test(&letters("asb")).is_ok(), "s present");
        let c = checker(&[('a', false), ('b', true)]);
        assert!(c.test(&letters("aa")).is_ok(), "optional tail untested");
    }

    #[test]
    fn failing_block_after_pass_moves_on() {
        let c = checker(&[('a', false), ('b', false)]);
        let err = c.test(&letters("abc")).unwrap_err();
        assert_eq!(err.message(), "expected b, got c", "last block failed");
    }

    #[test]
    fn compound_runs_all_and_prefers_blocking_failures() {
        let mut block = CompoundAssertion::new("optional", true, |_: &Letter| {
            Err(AssertionError::failed("optional failed"))
        });
        block.add("blocking", false, |_: &Letter| Err(AssertionError::failed("blocking failed")));
        let err = block.invoke(&Letter(1, 'a')).unwrap_err();
        assert_eq!(err.message(), "blocking failed", "non-optional wins");
        assert_eq!(block.name(), "optional and blocking", "joined name");
        assert!(!block.is_optional(), "mixed block is required");

        let only_optional =
            CompoundAssertion::new(
                "optional",
                true,
                |_: &Letter| Err(AssertionError::failed("soft")),
            );
        assert!(only_optional.invoke(&Letter(1, 'a')).is_err(), "lone optional failure surfaces");
    }

    #[test]
    fn equality_is_by_name_and_optionality() {
        let a = checker(&[('a', false)]);
        let b = checker(&[('a', false)]);
        let c = checker(&[('a', true)]);
        assert_eq!(a, b, "same names");
        assert_ne!(a, c, "optionality differs");
    }
}
