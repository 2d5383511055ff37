// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Run orchestration: detect scenarios, run their assertions, record results.

use flicker_core::reader::Reader;
use flicker_core::time::Timestamp;
use flicker_subject::RegionInterner;

use crate::config::FlickerConfig;
use crate::context::FlickerContext;
use crate::error::ConfigError;
use crate::extractors::{EntireTraceExtractor, ScenarioExtractor};
use crate::instance::ScenarioInstance;
use crate::parser::SubjectsParser;
use crate::instrument::{
    AssertionResultEvent, ExtractionFailedEvent, RunBeginEvent, RunEndEvent,
    ScenarioDetectedEvent, Tracer, TransitionSkippedEvent,
};
use crate::result::{ExtractionFailure, RunResult};
use crate::service_config::FlickerServiceConfig;

/// Scenario instances found in a trace, and the scenarios that could not be
/// extracted.
#[derive(Debug, Default)]
pub struct Detection {
    /// Instances to check, grouped by scenario in id order.
    pub instances: Vec<ScenarioInstance>,
    /// One entry per failed extractor.
    pub failures: Vec<ExtractionFailure>,
}

/// Runs the registered scenarios over captured traces.
///
/// ```
/// use flicker_core::reader::TraceReader;
/// use flicker_service::{FlickerService, Tracer};
///
/// let service = FlickerService::with_defaults().unwrap();
/// let detection = service.detect_scenarios(&TraceReader::new(), &mut Tracer::none());
/// assert!(detection.instances.is_empty());
/// // Nothing was captured, so every enabled scenario failed to extract.
/// assert!(!detection.failures.is_empty());
/// ```
#[derive(Debug)]
pub struct FlickerService {
    config: FlickerConfig,
}

impl FlickerService {
    /// A service over `config`.
    #[must_use]
    pub fn new(config: FlickerConfig) -> Self {
        Self { config }
    }

    /// A service over the built-in scenario table.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in table is inconsistent.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Ok(Self::new(FlickerServiceConfig::registry()?))
    }

    /// The registry.
    #[must_use]
    pub fn config(&self) -> &FlickerConfig {
        &self.config
    }

    /// Mutable access to the registry between runs.
    pub fn config_mut(&mut self) -> &mut FlickerConfig {
        &mut self.config
    }

    /// Finds every instance of every registered scenario.
    ///
    /// A failing extractor is recorded and does not stop the others.
    /// Instances whose scenario condition rejects them are dropped.
    pub fn detect_scenarios(&self, reader: &dyn Reader, tracer: &mut Tracer<'_>) -> Detection {
        let _span = tracing::debug_span!("detect_scenarios").entered();
        let (trace_start, trace_end) = trace_bounds(reader);
        tracer.run_begin(&RunBeginEvent {
            scenarios: self.config.len(),
            trace_start,
            trace_end,
        });

        if let Some(transitions) = reader.read_transitions_trace() {
            for transition in transitions.entries().iter().filter(|t| t.is_incomplete()) {
                tracing::warn!(
                    transition = transition.id(),
                    aborted = transition.aborted(),
                    "skipping incomplete transition"
                );
                tracer.transition_skipped(&TransitionSkippedEvent {
                    transition_id: transition.id(),
                    timestamp: transition.create_time(),
                    aborted: transition.aborted(),
                });
            }
        }

        let mut detection = Detection::default();
        for extractor in self.config.get_extractors() {
            let scenario = extractor.scenario().clone();
            match extractor.extract(reader) {
                Ok(instances) => {
                    for instance in instances {
                        if !extractor
                            .condition()
                            .should_execute(instance.associated_transition())
                        {
                            tracing::debug!(%scenario, "instance rejected by condition");
                            continue;
                        }
                        tracer.scenario_detected(&ScenarioDetectedEvent {
                            scenario: scenario.clone(),
                            start: instance.start(),
                            end: instance.end(),
                            transition_id: instance.associated_transition().map(|t| t.id()),
                        });
                        detection.instances.push(instance);
                    }
                }
                Err(err) => {
                    tracing::warn!(%scenario, %err, "extraction failed");
                    let message = err.to_string();
                    tracer.extraction_failed(&ExtractionFailedEvent {
                        scenario: scenario.clone(),
                        message: message.clone(),
                    });
                    detection.failures.push(ExtractionFailure { scenario, message });
                }
            }
        }
        tracing::debug!(
            instances = detection.instances.len(),
            failures = detection.failures.len(),
            "detection done"
        );
        detection
    }

    /// Runs every assertion of every instance, in order.
    pub fn execute(&self, instances: &[ScenarioInstance], tracer: &mut Tracer<'_>) -> RunResult {
        run_assertions(instances, None, tracer)
    }

    /// Detects, executes and records a whole run into `context`.
    ///
    /// Regions computed by the checks are interned in `context.cache`.
    pub fn process(
        &self,
        reader: &dyn Reader,
        context: &mut FlickerContext,
        tracer: &mut Tracer<'_>,
    ) -> RunResult {
        let detection = self.detect_scenarios(reader, tracer);
        let mut run = run_assertions(
            &detection.instances,
            Some(&context.cache as &dyn RegionInterner),
            tracer,
        );
        run.extraction_failures = detection.failures;

        let status = run.status();
        let failed = run.failures().count();
        tracing::info!(%status, assertions = run.assertions.len(), failed, "run finished");
        tracer.run_end(&RunEndEvent {
            status,
            assertions: run.assertions.len(),
            failed,
        });
        context.data_store.add_run(&run);
        run
    }
}

/// One parser per instance, shared by the instance's assertions.
fn run_assertions(
    instances: &[ScenarioInstance],
    interner: Option<&dyn RegionInterner>,
    tracer: &mut Tracer<'_>,
) -> RunResult {
    let mut run = RunResult::default();
    for instance in instances {
        let parser = match interner {
            Some(interner) => SubjectsParser::with_interner(instance.reader(), interner),
            None => SubjectsParser::new(instance.reader()),
        };
        for assertion in instance.generate_assertions() {
            let result = assertion.execute_with(&parser);
            tracer.assertion_result(&AssertionResultEvent {
                name: result.name.clone(),
                scenario: result.scenario.clone(),
                stability_group: result.stability_group,
                start: instance.start(),
                end: instance.end(),
                failures: result.errors.len(),
            });
            run.assertions.push(result);
        }
    }
    run
}

fn trace_bounds(reader: &dyn Reader) -> (Timestamp, Timestamp) {
    EntireTraceExtractor
        .extract(reader)
        .ok()
        .and_then(|slices| slices.first().map(|s| (s.start, s.end)))
        .unwrap_or((Timestamp::MIN, Timestamp::MAX))
}
