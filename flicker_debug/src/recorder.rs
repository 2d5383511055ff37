// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`RunSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. Timestamps take three `i64`s, one
//! per clock. Strings are a `u32` byte length followed by UTF-8 bytes.
//! [`decode`] reads the records back as an iterator of [`RecordedEvent`].

use flicker_core::time::Timestamp;
use flicker_service::instrument::{
    AssertionResultEvent, ExtractionFailedEvent, RunBeginEvent, RunEndEvent,
    ScenarioDetectedEvent, TransitionSkippedEvent,
};
use flicker_service::{AssertionInvocationGroup, RunSink, RunStatus, ScenarioId};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_RUN_BEGIN: u8 = 1;
const TAG_SCENARIO_DETECTED: u8 = 2;
const TAG_EXTRACTION_FAILED: u8 = 3;
const TAG_TRANSITION_SKIPPED: u8 = 4;
const TAG_ASSERTION_RESULT: u8 = 5;
const TAG_RUN_END: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`RunSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, n: usize) {
        self.write_u32(u32::try_from(n).unwrap_or(u32::MAX));
    }

    fn write_str(&mut self, s: &str) {
        // Longer strings are cut at a char boundary.
        let mut len = s.len().min(u32::MAX as usize);
        while !s.is_char_boundary(len) {
            len -= 1;
        }
        self.write_count(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len]);
    }

    fn write_timestamp(&mut self, t: Timestamp) {
        self.write_i64(t.elapsed_nanos());
        self.write_i64(t.system_uptime_nanos());
        self.write_i64(t.unix_nanos());
    }

    fn write_option_i32(&mut self, v: Option<i32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u32(val.cast_unsigned());
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_group(&mut self, g: AssertionInvocationGroup) {
        self.write_u8(match g {
            AssertionInvocationGroup::Blocking => 0,
            AssertionInvocationGroup::NonBlocking => 1,
        });
    }

    fn write_status(&mut self, s: RunStatus) {
        self.write_u8(match s {
            RunStatus::ExtractionFailed => 0,
            RunStatus::AssertionFailed => 1,
            RunStatus::NonBlockingFailed => 2,
            RunStatus::Passed => 3,
        });
    }
}

impl RunSink for RecorderSink {
    fn on_run_begin(&mut self, e: &RunBeginEvent) {
        self.write_u8(TAG_RUN_BEGIN);
        self.write_count(e.scenarios);
        self.write_timestamp(e.trace_start);
        self.write_timestamp(e.trace_end);
    }

    fn on_scenario_detected(&mut self, e: &ScenarioDetectedEvent) {
        self.write_u8(TAG_SCENARIO_DETECTED);
        self.write_str(e.scenario.as_str());
        self.write_timestamp(e.start);
        self.write_timestamp(e.end);
        self.write_option_i32(e.transition_id);
    }

    fn on_extraction_failed(&mut self, e: &ExtractionFailedEvent) {
        self.write_u8(TAG_EXTRACTION_FAILED);
        self.write_str(e.scenario.as_str());
        self.write_str(&e.message);
    }

    fn on_transition_skipped(&mut self, e: &TransitionSkippedEvent) {
        self.write_u8(TAG_TRANSITION_SKIPPED);
        self.write_u32(e.transition_id.cast_unsigned());
        self.write_timestamp(e.timestamp);
        self.write_u8(u8::from(e.aborted));
    }

    fn on_assertion_result(&mut self, e: &AssertionResultEvent) {
        self.write_u8(TAG_ASSERTION_RESULT);
        self.write_str(&e.name);
        self.write_str(e.scenario.as_str());
        self.write_group(e.stability_group);
        self.write_timestamp(e.start);
        self.write_timestamp(e.end);
        self.write_count(e.failures);
    }

    fn on_run_end(&mut self, e: &RunEndEvent) {
        self.write_u8(TAG_RUN_END);
        self.write_status(e.status);
        self.write_count(e.assertions);
        self.write_count(e.failed);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`RunBeginEvent`].
    RunBegin(RunBeginEvent),
    /// A [`ScenarioDetectedEvent`].
    ScenarioDetected(ScenarioDetectedEvent),
    /// An [`ExtractionFailedEvent`].
    ExtractionFailed(ExtractionFailedEvent),
    /// A [`TransitionSkippedEvent`].
    TransitionSkipped(TransitionSkippedEvent),
    /// An [`AssertionResultEvent`].
    AssertionResult(AssertionResultEvent),
    /// A [`RunEndEvent`].
    RunEnd(RunEndEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated or unknown record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_i64(&mut self) -> Option<i64> {
        Some(i64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u32()?).ok()
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_count()?;
        String::from_utf8(self.take(len)?.to_vec()).ok()
    }

    fn read_scenario(&mut self) -> Option<ScenarioId> {
        self.read_string().map(ScenarioId::new)
    }

    fn read_timestamp(&mut self) -> Option<Timestamp> {
        Some(Timestamp::new(
            self.read_i64()?,
            self.read_i64()?,
            self.read_i64()?,
        ))
    }

    fn read_option_i32(&mut self) -> Option<Option<i32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?.cast_signed();
        Some((present != 0).then_some(val))
    }

    fn read_group(&mut self) -> Option<AssertionInvocationGroup> {
        Some(match self.read_u8()? {
            0 => AssertionInvocationGroup::Blocking,
            _ => AssertionInvocationGroup::NonBlocking,
        })
    }

    fn read_status(&mut self) -> Option<RunStatus> {
        Some(match self.read_u8()? {
            0 => RunStatus::ExtractionFailed,
            1 => RunStatus::AssertionFailed,
            2 => RunStatus::NonBlockingFailed,
            _ => RunStatus::Passed,
        })
    }

    fn decode_run_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RunBegin(RunBeginEvent {
            scenarios: self.read_count()?,
            trace_start: self.read_timestamp()?,
            trace_end: self.read_timestamp()?,
        }))
    }

    fn decode_scenario_detected(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ScenarioDetected(ScenarioDetectedEvent {
            scenario: self.read_scenario()?,
            start: self.read_timestamp()?,
            end: self.read_timestamp()?,
            transition_id: self.read_option_i32()?,
        }))
    }

    fn decode_extraction_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ExtractionFailed(ExtractionFailedEvent {
            scenario: self.read_scenario()?,
            message: self.read_string()?,
        }))
    }

    fn decode_transition_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TransitionSkipped(TransitionSkippedEvent {
            transition_id: self.read_u32()?.cast_signed(),
            timestamp: self.read_timestamp()?,
            aborted: self.read_u8()? != 0,
        }))
    }

    fn decode_assertion_result(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AssertionResult(AssertionResultEvent {
            name: self.read_string()?,
            scenario: self.read_scenario()?,
            stability_group: self.read_group()?,
            start: self.read_timestamp()?,
            end: self.read_timestamp()?,
            failures: self.read_count()?,
        }))
    }

    fn decode_run_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RunEnd(RunEndEvent {
            status: self.read_status()?,
            assertions: self.read_count()?,
            failed: self.read_count()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_RUN_BEGIN => self.decode_run_begin(),
            TAG_SCENARIO_DETECTED => self.decode_scenario_detected(),
            TAG_EXTRACTION_FAILED => self.decode_extraction_failed(),
            TAG_TRANSITION_SKIPPED => self.decode_transition_skipped(),
            TAG_ASSERTION_RESULT => self.decode_assertion_result(),
            TAG_RUN_END => self.decode_run_end(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
