// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenario detection and assertion runs over flicker traces.
//!
//! A run goes through these stages:
//!
//! ```text
//!   Reader ──► extractors ──► ScenarioInstance ──► templates ──► FlickerTest ──► RunResult
//!              (per scenario)  (sliced reader)     (registered)   (subjects)
//! ```
//!
//! - A [`FlickerConfig`] registers scenarios. Each has extractors and an
//!   assertion set of [`AssertionTemplate`]s with their invocation groups.
//! - Extractors turn a [`Reader`](flicker_core::reader::Reader) into
//!   [`TraceSlice`]s. [`TaggedScenarioExtractor`] follows journey markers
//!   and matches each to one transition through a [`TransitionMatcher`]
//!   built from the [`filters`].
//! - A [`ScenarioInstance`] binds a slice to its scenario. Its assertions
//!   resolve component roles ([`components`]) and register checks.
//! - [`FlickerService`] runs everything, reports progress to a
//!   [`RunSink`] and records results in a [`FlickerContext`].
//!
//! # Example
//!
//! ```
//! use flicker_core::reader::TraceReader;
//! use flicker_service::{FlickerContext, FlickerService, RunStatus, Tracer};
//!
//! let service = FlickerService::with_defaults().unwrap();
//! let mut context = FlickerContext::new();
//! let run = service.process(&TraceReader::new(), &mut context, &mut Tracer::none());
//! assert_eq!(run.status(), RunStatus::ExtractionFailed);
//! ```

mod assertion;
pub mod assertion_sets;
pub mod components;
mod config;
mod context;
mod error;
mod extractors;
pub mod filters;
mod flicker_test;
mod instance;
pub mod instrument;
mod parser;
mod result;
mod scenario;
mod service;
mod service_config;
pub mod templates;

pub use assertion::ScenarioAssertion;
pub use components::ComponentTemplate;
pub use config::{
    ConfigOverrides, ConfiguredExtractor, FlickerConfig, FlickerConfigEntry, StabilityOverride,
};
pub use context::{Cache, ContextSnapshot, DataStore, FlickerContext};
pub use error::{ConfigError, ExtractionError, FlickerError};
pub use extractors::{
    CujAdjustment, EntireTraceExtractor, ScenarioExtractor, TaggedScenarioExtractor,
    TransitionMatcher, widen_to_close_to_home,
};
pub use flicker_test::FlickerTest;
pub use instance::{AssertionSet, ScenarioInstance, TraceSlice};
pub use instrument::{NoopSink, RunSink, Tracer};
pub use parser::SubjectsParser;
pub use result::{AssertionResult, ExtractionFailure, RunResult, RunStatus};
pub use scenario::{AssertionInvocationGroup, ExecutionCondition, ScenarioId};
pub use service::{Detection, FlickerService};
pub use service_config::FlickerServiceConfig;
pub use templates::AssertionTemplate;
