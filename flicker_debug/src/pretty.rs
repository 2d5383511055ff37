// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable run output.
//!
//! [`PrettyPrintSink`] implements [`RunSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Windows are
//! printed in milliseconds on the elapsed clock.

use std::io::Write;

use flicker_core::time::Timestamp;
use flicker_service::RunSink;
use flicker_service::instrument::{
    AssertionResultEvent, ExtractionFailedEvent, RunBeginEvent, RunEndEvent,
    ScenarioDetectedEvent, TransitionSkippedEvent,
};

/// Writes human-readable run lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    failures_only: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("failures_only", &self.failures_only)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            failures_only: false,
        }
    }

    /// Skips passing assertions.
    #[must_use]
    pub fn failures_only(mut self) -> Self {
        self.failures_only = true;
        self
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: Timestamp) -> String {
    if t.is_min() {
        String::from("min")
    } else if t.is_max() {
        String::from("max")
    } else {
        format!("{:.1}ms", t.elapsed_nanos() as f64 / 1_000_000.0)
    }
}

impl<W: Write> RunSink for PrettyPrintSink<W> {
    fn on_run_begin(&mut self, e: &RunBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[run] scenarios={} trace={}..{}",
            e.scenarios,
            ms(e.trace_start),
            ms(e.trace_end),
        );
    }

    fn on_scenario_detected(&mut self, e: &ScenarioDetectedEvent) {
        let transition = e
            .transition_id
            .map_or_else(|| String::from("none"), |id| id.to_string());
        let _ = writeln!(
            self.writer,
            "[scenario] {} {}..{} transition={transition}",
            e.scenario,
            ms(e.start),
            ms(e.end),
        );
    }

    fn on_extraction_failed(&mut self, e: &ExtractionFailedEvent) {
        let _ = writeln!(self.writer, "[extract] {} FAILED: {}", e.scenario, e.message);
    }

    fn on_transition_skipped(&mut self, e: &TransitionSkippedEvent) {
        let why = if e.aborted { "aborted" } else { "unfinished" };
        let _ = writeln!(
            self.writer,
            "[skip] transition={} at {} {why}",
            e.transition_id,
            ms(e.timestamp),
        );
    }

    fn on_assertion_result(&mut self, e: &AssertionResultEvent) {
        if self.failures_only && e.passed() {
            return;
        }
        let verdict = if e.passed() { "ok" } else { "FAILED" };
        let _ = writeln!(
            self.writer,
            "[assert] {} {verdict} group={} failures={}",
            e.name, e.stability_group, e.failures,
        );
    }

    fn on_run_end(&mut self, e: &RunEndEvent) {
        let _ = writeln!(
            self.writer,
            "[done] {} assertions={} failed={}",
            e.status, e.assertions, e.failed,
        );
    }
}
