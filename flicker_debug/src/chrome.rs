// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Scenario instances land on thread 0 and assertions on thread 1, both as
//! complete events spanning their window on the elapsed clock.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use flicker_core::time::Timestamp;
use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const SCENARIO_TRACK: u32 = 0;
const ASSERTION_TRACK: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// # Errors
///
/// Fails if writing to `writer` fails.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut end = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::RunBegin(e) => {
                end = to_us(e.trace_end);
                events.push(json!({
                    "ph": "i",
                    "name": "RunBegin",
                    "cat": "Run",
                    "ts": to_us(e.trace_start),
                    "pid": 0,
                    "tid": SCENARIO_TRACK,
                    "s": "g",
                    "args": {
                        "scenarios": e.scenarios,
                    }
                }));
            }
            RecordedEvent::ScenarioDetected(e) => {
                events.push(json!({
                    "ph": "X",
                    "name": e.scenario.as_str(),
                    "cat": "Scenario",
                    "ts": to_us(e.start),
                    "dur": to_us(e.end) - to_us(e.start),
                    "pid": 0,
                    "tid": SCENARIO_TRACK,
                    "args": {
                        "transition": e.transition_id,
                    }
                }));
            }
            RecordedEvent::ExtractionFailed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "ExtractionFailed",
                    "cat": "Scenario",
                    "ts": 0,
                    "pid": 0,
                    "tid": SCENARIO_TRACK,
                    "s": "p",
                    "args": {
                        "scenario": e.scenario.as_str(),
                        "message": e.message,
                    }
                }));
            }
            RecordedEvent::TransitionSkipped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "TransitionSkipped",
                    "cat": "Transition",
                    "ts": to_us(e.timestamp),
                    "pid": 0,
                    "tid": SCENARIO_TRACK,
                    "s": "t",
                    "args": {
                        "id": e.transition_id,
                        "aborted": e.aborted,
                    }
                }));
            }
            RecordedEvent::AssertionResult(e) => {
                events.push(json!({
                    "ph": "X",
                    "name": e.name,
                    "cat": if e.passed() { "Passed" } else { "Failed" },
                    "ts": to_us(e.start),
                    "dur": to_us(e.end) - to_us(e.start),
                    "pid": 0,
                    "tid": ASSERTION_TRACK,
                    "args": {
                        "scenario": e.scenario.as_str(),
                        "group": e.stability_group.to_string(),
                        "failures": e.failures,
                    }
                }));
            }
            RecordedEvent::RunEnd(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RunEnd",
                    "cat": "Run",
                    "ts": end,
                    "pid": 0,
                    "tid": SCENARIO_TRACK,
                    "s": "g",
                    "args": {
                        "status": e.status.to_string(),
                        "assertions": e.assertions,
                        "failed": e.failed,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

/// Elapsed-clock microseconds; zero for timestamps without that clock.
fn to_us(t: Timestamp) -> f64 {
    if t.is_min() || t.is_max() || !t.has_elapsed() {
        return 0.0;
    }
    t.elapsed_nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use flicker_fixtures::{app_launch, ms};
    use flicker_service::instrument::{RunBeginEvent, ScenarioDetectedEvent};
    use flicker_service::{FlickerContext, FlickerService, RunSink, ScenarioId, Tracer};

    fn parse(bytes: &[u8]) -> Vec<Value> {
        let mut out = Vec::new();
        export(bytes, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_run_begin(&RunBeginEvent {
            scenarios: 1,
            trace_start: ms(10),
            trace_end: ms(300),
        });
        rec.on_scenario_detected(&ScenarioDetectedEvent {
            scenario: ScenarioId::COMMON,
            start: ms(10),
            end: ms(300),
            transition_id: None,
        });

        let parsed = parse(rec.as_bytes());
        assert_eq!(parsed.len(), 2, "one value per event");

        assert_eq!(parsed[0]["ph"], "i", "run begin is an instant");
        assert_eq!(parsed[0]["ts"], 10_000.0, "microseconds");

        assert_eq!(parsed[1]["ph"], "X", "scenarios are spans");
        assert_eq!(parsed[1]["name"], "COMMON", "named by scenario");
        assert_eq!(parsed[1]["dur"], 290_000.0, "window length");
    }

    #[test]
    fn assertions_get_their_own_track() {
        let reader = app_launch::reader().unwrap();
        let mut rec = RecorderSink::new();
        FlickerService::with_defaults().unwrap().process(
            &reader,
            &mut FlickerContext::new(),
            &mut Tracer::new(&mut rec),
        );
        let parsed = parse(rec.as_bytes());
        let assertions = parsed.iter().filter(|e| e["tid"] == ASSERTION_TRACK).count();
        let results = decode(rec.as_bytes())
            .filter(|e| matches!(e, RecordedEvent::AssertionResult(_)))
            .count();
        assert!(results > 0, "assertions ran");
        assert_eq!(assertions, results, "one span per assertion");
    }

    #[test]
    fn export_empty_recording() {
        assert!(parse(&[]).is_empty(), "no events");
    }
}
