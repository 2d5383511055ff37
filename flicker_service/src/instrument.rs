// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured events emitted while a run progresses.
//!
//! This module provides a [`RunSink`] trait with per-event methods that the
//! [`FlickerService`](crate::FlickerService) calls at each stage. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn RunSink`; each method performs a
//! single `Option` branch before dispatching.

use flicker_core::time::Timestamp;

use crate::result::RunStatus;
use crate::scenario::{AssertionInvocationGroup, ScenarioId};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted before scenarios are detected.
#[derive(Clone, Debug, PartialEq)]
pub struct RunBeginEvent {
    /// Number of enabled scenarios.
    pub scenarios: usize,
    /// First timestamp covered by the traces.
    pub trace_start: Timestamp,
    /// Last timestamp covered by the traces.
    pub trace_end: Timestamp,
}

/// Emitted for each detected scenario instance.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioDetectedEvent {
    /// The scenario.
    pub scenario: ScenarioId,
    /// Start of the instance.
    pub start: Timestamp,
    /// End of the instance.
    pub end: Timestamp,
    /// Id of the associated transition, if any.
    pub transition_id: Option<i32>,
}

/// Emitted when a scenario could not be extracted.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionFailedEvent {
    /// The scenario.
    pub scenario: ScenarioId,
    /// Rendered error.
    pub message: String,
}

/// Emitted when an incomplete transition is left out of extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionSkippedEvent {
    /// Transition id.
    pub transition_id: i32,
    /// First timestamp of the transition.
    pub timestamp: Timestamp,
    /// Whether the transition was aborted rather than never finished.
    pub aborted: bool,
}

/// Emitted after each assertion ran.
#[derive(Clone, Debug, PartialEq)]
pub struct AssertionResultEvent {
    /// `SCENARIO::assertion-id`.
    pub name: String,
    /// The scenario.
    pub scenario: ScenarioId,
    /// Whether a failure fails the run.
    pub stability_group: AssertionInvocationGroup,
    /// Start of the instance the assertion ran on.
    pub start: Timestamp,
    /// End of the instance.
    pub end: Timestamp,
    /// Number of failures recorded.
    pub failures: usize,
}

impl AssertionResultEvent {
    /// Returns `true` if the assertion passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}

/// Emitted once the verdict is known.
#[derive(Clone, Debug, PartialEq)]
pub struct RunEndEvent {
    /// The verdict.
    pub status: RunStatus,
    /// Number of assertions executed.
    pub assertions: usize,
    /// Number of failed assertions.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// RunSink trait
// ---------------------------------------------------------------------------

/// Receives run events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait RunSink {
    /// Called before detection starts.
    fn on_run_begin(&mut self, e: &RunBeginEvent) {
        _ = e;
    }

    /// Called for each detected scenario instance.
    fn on_scenario_detected(&mut self, e: &ScenarioDetectedEvent) {
        _ = e;
    }

    /// Called when a scenario could not be extracted.
    fn on_extraction_failed(&mut self, e: &ExtractionFailedEvent) {
        _ = e;
    }

    /// Called when an incomplete transition is skipped.
    fn on_transition_skipped(&mut self, e: &TransitionSkippedEvent) {
        _ = e;
    }

    /// Called after each assertion.
    fn on_assertion_result(&mut self, e: &AssertionResultEvent) {
        _ = e;
    }

    /// Called once with the verdict.
    fn on_run_end(&mut self, e: &RunEndEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`RunSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl RunSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`RunSink`].
pub struct Tracer<'a> {
    sink: Option<&'a mut dyn RunSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn RunSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Emits a [`RunBeginEvent`].
    #[inline]
    pub fn run_begin(&mut self, e: &RunBeginEvent) {
        if let Some(s) = &mut self.sink {
            s.on_run_begin(e);
        }
    }

    /// Emits a [`ScenarioDetectedEvent`].
    #[inline]
    pub fn scenario_detected(&mut self, e: &ScenarioDetectedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_scenario_detected(e);
        }
    }

    /// Emits an [`ExtractionFailedEvent`].
    #[inline]
    pub fn extraction_failed(&mut self, e: &ExtractionFailedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_extraction_failed(e);
        }
    }

    /// Emits a [`TransitionSkippedEvent`].
    #[inline]
    pub fn transition_skipped(&mut self, e: &TransitionSkippedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_transition_skipped(e);
        }
    }

    /// Emits an [`AssertionResultEvent`].
    #[inline]
    pub fn assertion_result(&mut self, e: &AssertionResultEvent) {
        if let Some(s) = &mut self.sink {
            s.on_assertion_result(e);
        }
    }

    /// Emits a [`RunEndEvent`].
    #[inline]
    pub fn run_end(&mut self, e: &RunEndEvent) {
        if let Some(s) = &mut self.sink {
            s.on_run_end(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        skipped: usize,
        ended: Option<RunStatus>,
    }

    impl RunSink for Counting {
        fn on_transition_skipped(&mut self, _e: &TransitionSkippedEvent) {
            self.skipped += 1;
        }

        fn on_run_end(&mut self, e: &RunEndEvent) {
            self.ended = Some(e.status);
        }
    }

    #[test]
    fn tracer_dispatches_to_sink() {
        let mut sink = Counting::default();
        let mut tracer = Tracer::new(&mut sink);
        tracer.transition_skipped(&TransitionSkippedEvent {
            transition_id: 3,
            timestamp: Timestamp::from_elapsed(5),
            aborted: false,
        });
        tracer.run_end(&RunEndEvent {
            status: RunStatus::Passed,
            assertions: 0,
            failed: 0,
        });
        assert_eq!(sink.skipped, 1, "one skip recorded");
        assert_eq!(sink.ended, Some(RunStatus::Passed), "verdict recorded");
    }

    #[test]
    fn none_tracer_is_silent() {
        let mut tracer = Tracer::none();
        tracer.run_begin(&RunBeginEvent {
            scenarios: 1,
            trace_start: Timestamp::MIN,
            trace_end: Timestamp::MAX,
        });
    }
}
