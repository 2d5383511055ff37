// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The check accumulator templates register their checks on.

use std::fmt;

use flicker_subject::{
    AssertionError, CheckResult, LayerTraceEntrySubject, LayersTraceSubject,
    WindowManagerStateSubject, WindowManagerTraceSubject,
};

use crate::parser::SubjectsParser;

type LayersCheck = Box<dyn for<'a> FnOnce(&mut LayersTraceSubject<'a>) -> CheckResult>;
type LayerEntryCheck = Box<dyn for<'a> FnOnce(&LayerTraceEntrySubject<'a>) -> CheckResult>;
type WmCheck = Box<dyn for<'a> FnOnce(&mut WindowManagerTraceSubject<'a>) -> CheckResult>;
type WmEntryCheck = Box<dyn for<'a> FnOnce(&WindowManagerStateSubject<'a>) -> CheckResult>;

enum Check {
    Layers(LayersCheck),
    LayersStart(LayerEntryCheck),
    LayersEnd(LayerEntryCheck),
    Wm(WmCheck),
    WmStart(WmEntryCheck),
    WmEnd(WmEntryCheck),
}

impl Check {
    const fn target(&self) -> &'static str {
        match self {
            Self::Layers(_) => "layers trace",
            Self::LayersStart(_) => "layers start",
            Self::LayersEnd(_) => "layers end",
            Self::Wm(_) => "wm trace",
            Self::WmStart(_) => "wm start",
            Self::WmEnd(_) => "wm end",
        }
    }
}

/// Collects checks, then runs them against one set of subjects.
///
/// Trace checks receive a fresh trace subject. Blocks registered on it with
/// `then()` are run over every entry once the closure returns, so a closure
/// may both register blocks and check directly. Checks on a trace that was
/// not captured are skipped.
#[derive(Default)]
pub struct FlickerTest {
    checks: Vec<(String, Check)>,
}

impl fmt::Debug for FlickerTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|(name, check)| (name, check.target())))
            .finish()
    }
}

impl FlickerTest {
    /// An empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Registers a check over the layers trace.
    pub fn assert_layers(
        &mut self,
        name: impl Into<String>,
        check: impl for<'a> FnOnce(&mut LayersTraceSubject<'a>) -> CheckResult + 'static,
    ) {
        self.checks.push((name.into(), Check::Layers(Box::new(check))));
    }

    /// Registers a check over the first layers snapshot.
    pub fn assert_layers_start(
        &mut self,
        name: impl Into<String>,
        check: impl for<'a> FnOnce(&LayerTraceEntrySubject<'a>) -> CheckResult + 'static,
    ) {
        self.checks.push((name.into(), Check::LayersStart(Box::new(check))));
    }

    /// Registers a check over the last layers snapshot.
    pub fn assert_layers_end(
        &mut self,
        name: impl Into<String>,
        check: impl for<'a> FnOnce(&LayerTraceEntrySubject<'a>) -> CheckResult + 'static,
    ) {
        self.checks.push((name.into(), Check::LayersEnd(Box::new(check))));
    }

    /// Registers a check over the window-manager trace.
    pub fn assert_wm(
        &mut self,
        name: impl Into<String>,
        check: impl for<'a> FnOnce(&mut WindowManagerTraceSubject<'a>) -> CheckResult + 'static,
    ) {
        self.checks.push((name.into(), Check::Wm(Box::new(check))));
    }

    /// Registers a check over the first window-manager snapshot.
    pub fn assert_wm_start(
        &mut self,
        name: impl Into<String>,
        check: impl for<'a> FnOnce(&WindowManagerStateSubject<'a>) -> CheckResult + 'static,
    ) {
        self.checks.push((name.into(), Check::WmStart(Box::new(check))));
    }

    /// Registers a check over the last window-manager snapshot.
    pub fn assert_wm_end(
        &mut self,
        name: impl Into<String>,
        check: impl for<'a> FnOnce(&WindowManagerStateSubject<'a>) -> CheckResult + 'static,
    ) {
        self.checks.push((name.into(), Check::WmEnd(Box::new(check))));
    }

    /// Runs every check; returns the failures in registration order.
    ///
    /// A failing check does not stop the others.
    pub fn run(self, parser: &SubjectsParser<'_>) -> Vec<AssertionError> {
        let mut failures = Vec::new();
        for (name, check) in self.checks {
            let target = check.target();
            let outcome = match check {
                Check::Layers(f) => parser.layers_trace_subject().map(|mut subject| {
                    f(&mut subject)?;
                    subject.for_all_entries()
                }),
                Check::LayersStart(f) => entry(parser.has_layers(), parser.layers_start(), f),
                Check::LayersEnd(f) => entry(parser.has_layers(), parser.layers_end(), f),
                Check::Wm(f) => parser.wm_trace_subject().map(|mut subject| {
                    f(&mut subject)?;
                    subject.for_all_entries()
                }),
                Check::WmStart(f) => entry(parser.has_wm(), parser.wm_start(), f),
                Check::WmEnd(f) => entry(parser.has_wm(), parser.wm_end(), f),
            };
            match outcome {
                None => tracing::debug!(check = %name, target, "skipped, trace not captured"),
                Some(Ok(())) => tracing::trace!(check = %name, "passed"),
                Some(Err(err)) => failures.push(err),
            }
        }
        failures
    }
}

/// Runs `f` on `subject`. A captured but empty trace is a failure.
fn entry<S>(
    captured: bool,
    subject: Option<S>,
    f: impl FnOnce(&S) -> CheckResult,
) -> Option<CheckResult> {
    if !captured {
        return None;
    }
    Some(match subject {
        Some(s) => f(&s),
        None => Err(AssertionError::failed("No entries found")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::component::{ComponentNameMatcher, SharedMatcher};
    use flicker_core::reader::TraceReader;
    use flicker_core::time::Timestamp;
    use flicker_core::wm::{WindowManagerState, WindowManagerTrace};

    fn wm_reader() -> TraceReader {
        let states = (1..=3)
            .map(|t| WindowManagerState::new(Timestamp::from_elapsed(t), Vec::new()).unwrap())
            .collect();
        TraceReader::new().with_wm(WindowManagerTrace::new(states).unwrap())
    }

    #[test]
    fn missing_traces_are_skipped() {
        let mut test = FlickerTest::new();
        test.assert_layers_start("always fails", |_| Err(AssertionError::failed("boom")));
        test.assert_layers("also fails", |_| Err(AssertionError::failed("boom")));
        let reader = wm_reader();
        assert!(test.run(&SubjectsParser::new(&reader)).is_empty(), "no layers trace");
    }

    #[test]
    fn failures_are_collected_in_order() {
        let bar: SharedMatcher = ComponentNameMatcher::STATUS_BAR.shared();
        let mut test = FlickerTest::new();
        test.assert_wm_start("first", |_| Err(AssertionError::failed("first")));
        test.assert_wm("second", move |subject| {
            subject.contains(&bar);
            Ok(())
        });
        test.assert_wm_end("third", |_| Ok(()));
        assert_eq!(test.len(), 3, "three checks");

        let reader = wm_reader();
        let failures = test.run(&SubjectsParser::new(&reader));
        assert_eq!(failures.len(), 2, "start and trace checks fail");
        assert_eq!(failures[0].message(), "first", "start check first");
        assert!(
            failures[1].message().contains("StatusBar"),
            "registered block ran: {}",
            failures[1]
        );
    }
}
