// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full runs over the canned app launch.

use flicker_core::cuj::CujType;
use flicker_fixtures::app_launch;
use flicker_fixtures::ms;
use flicker_service::{
    FlickerContext, FlickerService, RunResult, RunSink, ScenarioId, Tracer,
    instrument::{ScenarioDetectedEvent, TransitionSkippedEvent},
};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct Recorded {
    detected: Vec<ScenarioDetectedEvent>,
    skipped: Vec<i32>,
}

impl RunSink for Recorded {
    fn on_scenario_detected(&mut self, e: &ScenarioDetectedEvent) {
        self.detected.push(e.clone());
    }

    fn on_transition_skipped(&mut self, e: &TransitionSkippedEvent) {
        self.skipped.push(e.transition_id);
    }
}

fn run(events: &mut Recorded) -> (RunResult, FlickerContext) {
    let reader = app_launch::reader().unwrap();
    let service = FlickerService::with_defaults().unwrap();
    let mut context = FlickerContext::new();
    let run = service.process(&reader, &mut context, &mut Tracer::new(events));
    (run, context)
}

fn launch() -> ScenarioId {
    ScenarioId::from_cuj(CujType::LauncherAppLaunchFromIcon)
}

#[test]
fn launch_is_detected_around_the_open_transition() {
    let mut events = Recorded::default();
    let (run, _) = run(&mut events);
    assert!(run.extraction_failures.is_empty(), "{:?}", run.extraction_failures);

    let found: Vec<(String, i64, i64, Option<i32>)> = events
        .detected
        .iter()
        .map(|e| {
            (
                e.scenario.to_string(),
                e.start.elapsed_nanos(),
                e.end.elapsed_nanos(),
                e.transition_id,
            )
        })
        .collect();
    assert_eq!(
        found,
        [
            (
                String::from("COMMON"),
                ms(10).elapsed_nanos(),
                ms(300).elapsed_nanos(),
                None
            ),
            (
                launch().to_string(),
                ms(40).elapsed_nanos(),
                ms(160).elapsed_nanos(),
                Some(app_launch::OPEN_TRANSITION)
            ),
        ],
        "the whole trace and one launch"
    );
    assert_eq!(
        events.skipped,
        [app_launch::INCOMPLETE_TRANSITION],
        "unfinished transition skipped"
    );
}

#[test]
fn launch_checks_pass() {
    let (run, _) = run(&mut Recorded::default());
    let scenario = launch();
    let expected = [
        "AppLayerIsInvisibleAtStart(OPENING_APP)",
        "AppLayerIsVisibleAtEnd(OPENING_APP)",
        "AppLayerBecomesVisible(OPENING_APP)",
        "AppWindowBecomesVisible(OPENING_APP)",
        "AppLayerIsVisibleAtStart(Launcher)",
        "AppLayerIsInvisibleAtEnd(Launcher)",
    ];
    for id in expected {
        let name = format!("{scenario}::{id}");
        let result = run
            .for_scenario(&scenario)
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("{name} did not run"));
        assert!(result.passed(), "{name} failed: {:?}", result.errors);
    }
}

#[test]
fn results_are_recorded_per_scenario() {
    let (run, context) = run(&mut Recorded::default());
    let recorded = context.data_store.results(&launch()).len();
    assert_eq!(recorded, run.for_scenario(&launch()).count(), "every launch result stored");
    assert!(context.data_store.contains(&ScenarioId::COMMON), "whole-trace checks stored");
    let scenarios: Vec<&ScenarioId> = context.data_store.scenarios().collect();
    assert_eq!(scenarios.len(), 2, "nothing else was detected");
}
