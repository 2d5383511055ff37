// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scenario registry.
//!
//! [`FlickerConfig`] maps each scenario to its extractors and its assertion
//! set. Every mutation validates its preconditions and fails with a
//! [`ConfigError`] instead of overwriting silently. A failed single-step call
//! leaves the registry unchanged; bulk calls keep the steps that succeeded.

use std::collections::BTreeMap;
use std::sync::Arc;

use flicker_core::reader::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ExtractionError};
use crate::extractors::ScenarioExtractor;
use crate::instance::{AssertionSet, ScenarioInstance};
use crate::scenario::{AssertionInvocationGroup, ExecutionCondition, ScenarioId};
use crate::templates::AssertionTemplate;

/// One scenario ready to be registered.
#[derive(Clone, Debug)]
pub struct FlickerConfigEntry {
    /// The scenario.
    pub scenario_id: ScenarioId,
    /// Finds its occurrences.
    pub extractor: Arc<dyn ScenarioExtractor>,
    /// What to check on each occurrence.
    pub assertions: AssertionSet,
    /// Disabled entries are skipped by [`FlickerConfig::use_entries`].
    pub enabled: bool,
    /// Which occurrences are checked.
    pub condition: ExecutionCondition,
}

impl FlickerConfigEntry {
    /// An enabled entry checked on every occurrence.
    #[must_use]
    pub fn new(
        scenario_id: ScenarioId,
        extractor: impl ScenarioExtractor + 'static,
        assertions: AssertionSet,
    ) -> Self {
        Self {
            scenario_id,
            extractor: Arc::new(extractor),
            assertions,
            enabled: true,
            condition: ExecutionCondition::Always,
        }
    }

    /// Marks the entry disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Restricts which occurrences are checked.
    #[must_use]
    pub fn with_condition(mut self, condition: ExecutionCondition) -> Self {
        self.condition = condition;
        self
    }
}

#[derive(Debug)]
struct Registration {
    extractors: Vec<Arc<dyn ScenarioExtractor>>,
    assertions: AssertionSet,
    condition: ExecutionCondition,
}

impl Registration {
    fn position(&self, assertion: &str) -> Option<usize> {
        self.assertions.iter().position(|(t, _)| t.id() == assertion)
    }
}

/// Registry of scenarios, their extractors and their assertions.
#[derive(Debug, Default)]
pub struct FlickerConfig {
    scenarios: BTreeMap<ScenarioId, Registration>,
}

impl FlickerConfig {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Returns `true` if no scenario is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Returns `true` if `scenario` is registered.
    #[must_use]
    pub fn contains(&self, scenario: &ScenarioId) -> bool {
        self.scenarios.contains_key(scenario)
    }

    /// Registered scenarios, in id order.
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioId> + '_ {
        self.scenarios.keys()
    }

    /// The assertion set currently registered for `scenario`.
    #[must_use]
    pub fn assertions(&self, scenario: &ScenarioId) -> Option<&AssertionSet> {
        self.scenarios.get(scenario).map(|r| &r.assertions)
    }

    /// Registers a scenario with its extractors and assertions.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateScenario`] if the id is taken, or
    /// [`ConfigError::DuplicateAssertion`] if `assertions` repeats an id.
    pub fn register_scenario(
        &mut self,
        scenario: ScenarioId,
        extractors: Vec<Arc<dyn ScenarioExtractor>>,
        assertions: AssertionSet,
    ) -> Result<&mut Self, ConfigError> {
        self.register(scenario, extractors, assertions, ExecutionCondition::Always)
    }

    fn register(
        &mut self,
        scenario: ScenarioId,
        extractors: Vec<Arc<dyn ScenarioExtractor>>,
        assertions: AssertionSet,
        condition: ExecutionCondition,
    ) -> Result<&mut Self, ConfigError> {
        if self.scenarios.contains_key(&scenario) {
            return Err(ConfigError::DuplicateScenario(scenario));
        }
        for (i, (template, _)) in assertions.iter().enumerate() {
            let id = template.id();
            if assertions[..i].iter().any(|(t, _)| t.id() == id) {
                return Err(ConfigError::DuplicateAssertion {
                    scenario,
                    assertion: id,
                });
            }
        }
        tracing::debug!(%scenario, assertions = assertions.len(), "registered scenario");
        self.scenarios.insert(
            scenario,
            Registration {
                extractors,
                assertions,
                condition,
            },
        );
        Ok(self)
    }

    /// Removes a scenario.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownScenario`] if it is not registered.
    pub fn unregister_scenario(&mut self, scenario: &ScenarioId) -> Result<&mut Self, ConfigError> {
        self.scenarios
            .remove(scenario)
            .ok_or_else(|| ConfigError::UnknownScenario(scenario.clone()))?;
        Ok(self)
    }

    fn registration(&mut self, scenario: &ScenarioId) -> Result<&mut Registration, ConfigError> {
        self.scenarios
            .get_mut(scenario)
            .ok_or_else(|| ConfigError::UnknownScenario(scenario.clone()))
    }

    /// Adds an assertion to a registered scenario.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownScenario`] or
    /// [`ConfigError::DuplicateAssertion`].
    pub fn register_assertion(
        &mut self,
        scenario: &ScenarioId,
        template: Arc<dyn AssertionTemplate>,
        group: AssertionInvocationGroup,
    ) -> Result<&mut Self, ConfigError> {
        let registration = self.registration(scenario)?;
        let id = template.id();
        if registration.position(&id).is_some() {
            return Err(ConfigError::DuplicateAssertion {
                scenario: scenario.clone(),
                assertion: id,
            });
        }
        registration.assertions.push((template, group));
        Ok(self)
    }

    /// Removes the assertion with this id.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownScenario`] or [`ConfigError::UnknownAssertion`].
    pub fn unregister_assertion(
        &mut self,
        scenario: &ScenarioId,
        assertion: &str,
    ) -> Result<&mut Self, ConfigError> {
        let registration = self.registration(scenario)?;
        let index = registration
            .position(assertion)
            .ok_or_else(|| ConfigError::UnknownAssertion {
                scenario: scenario.clone(),
                assertion: assertion.to_string(),
            })?;
        registration.assertions.remove(index);
        Ok(self)
    }

    /// Moves one assertion to another invocation group.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownScenario`] or [`ConfigError::UnknownAssertion`].
    pub fn override_assertion_stability_group(
        &mut self,
        scenario: &ScenarioId,
        assertion: &str,
        group: AssertionInvocationGroup,
    ) -> Result<&mut Self, ConfigError> {
        let registration = self.registration(scenario)?;
        let index = registration
            .position(assertion)
            .ok_or_else(|| ConfigError::UnknownAssertion {
                scenario: scenario.clone(),
                assertion: assertion.to_string(),
            })?;
        registration.assertions[index].1 = group;
        Ok(self)
    }

    /// Registers every enabled entry as [`register_scenario`] would.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that cannot be registered, including one
    /// whose scenario is already registered. Entries before it stay
    /// registered.
    ///
    /// [`register_scenario`]: Self::register_scenario
    pub fn use_entries(
        &mut self,
        entries: impl IntoIterator<Item = FlickerConfigEntry>,
    ) -> Result<&mut Self, ConfigError> {
        for entry in entries {
            if !entry.enabled {
                tracing::trace!(scenario = %entry.scenario_id, "skipping disabled entry");
                continue;
            }
            self.register(
                entry.scenario_id,
                vec![entry.extractor],
                entry.assertions,
                entry.condition,
            )?;
        }
        Ok(self)
    }

    /// One extractor per registered extractor, each holding a snapshot of
    /// its scenario's assertion set as it is now.
    #[must_use]
    pub fn get_extractors(&self) -> Vec<ConfiguredExtractor> {
        self.scenarios
            .iter()
            .flat_map(|(scenario, registration)| {
                registration.extractors.iter().map(|extractor| ConfiguredExtractor {
                    scenario: scenario.clone(),
                    extractor: Arc::clone(extractor),
                    assertions: registration.assertions.clone(),
                    condition: registration.condition,
                })
            })
            .collect()
    }

    /// Applies parsed overrides, validating each step.
    ///
    /// # Errors
    ///
    /// Fails on the first override naming an unknown scenario or assertion.
    pub fn apply_overrides(
        &mut self,
        overrides: &ConfigOverrides,
    ) -> Result<&mut Self, ConfigError> {
        for scenario in &overrides.disabled_scenarios {
            self.unregister_scenario(scenario)?;
        }
        for o in &overrides.stability_overrides {
            self.override_assertion_stability_group(&o.scenario, &o.assertion, o.group)?;
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// ConfiguredExtractor
// ---------------------------------------------------------------------------

/// An extractor bound to its scenario and assertion snapshot.
#[derive(Clone, Debug)]
pub struct ConfiguredExtractor {
    scenario: ScenarioId,
    extractor: Arc<dyn ScenarioExtractor>,
    assertions: AssertionSet,
    condition: ExecutionCondition,
}

impl ConfiguredExtractor {
    /// The scenario found by this extractor.
    #[must_use]
    pub fn scenario(&self) -> &ScenarioId {
        &self.scenario
    }

    /// The assertion set captured when the extractor was materialized.
    #[must_use]
    pub fn assertions(&self) -> &AssertionSet {
        &self.assertions
    }

    /// Which occurrences are checked.
    #[must_use]
    pub fn condition(&self) -> ExecutionCondition {
        self.condition
    }

    /// Finds every occurrence of the scenario in `reader`.
    ///
    /// # Errors
    ///
    /// Propagates the extractor's failure; no partial result is returned.
    pub fn extract(&self, reader: &dyn Reader) -> Result<Vec<ScenarioInstance>, ExtractionError> {
        let slices = self.extractor.extract(reader)?;
        tracing::debug!(scenario = %self.scenario, count = slices.len(), "extracted slices");
        Ok(slices
            .into_iter()
            .map(|slice| {
                ScenarioInstance::new(self.scenario.clone(), slice, reader, self.assertions.clone())
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Moves one assertion of one scenario to another group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityOverride {
    /// The scenario.
    pub scenario: ScenarioId,
    /// The assertion id.
    pub assertion: String,
    /// The new group.
    pub group: AssertionInvocationGroup,
}

/// Adjustments to a registry, read from JSON.
///
/// ```
/// use flicker_service::ConfigOverrides;
///
/// let overrides = ConfigOverrides::from_json(
///     r#"{ "disabled_scenarios": ["SPLIT_SCREEN_RESIZE"] }"#,
/// )
/// .unwrap();
/// assert_eq!(overrides.disabled_scenarios.len(), 1);
/// assert!(overrides.stability_overrides.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    /// Scenarios to unregister.
    pub disabled_scenarios: Vec<ScenarioId>,
    /// Group changes.
    pub stability_overrides: Vec<StabilityOverride>,
}

impl ConfigOverrides {
    /// Parses overrides from JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidOverrides`] on malformed input or unknown
    /// fields.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::reader::TraceReader;
    use flicker_core::time::Timestamp;
    use flicker_core::wm::{WindowManagerState, WindowManagerTrace};

    use crate::assertion_sets;
    use crate::extractors::EntireTraceExtractor;
    use crate::error::FlickerError;
    use crate::flicker_test::FlickerTest;
    use crate::templates::CustomAssertion;

    fn pass(_: &ScenarioInstance, _: &mut FlickerTest) -> Result<(), FlickerError> {
        Ok(())
    }

    const OK: CustomAssertion = CustomAssertion::new("Ok", pass);

    fn config() -> FlickerConfig {
        let mut config = FlickerConfig::new();
        config
            .register_scenario(
                ScenarioId::COMMON,
                vec![Arc::new(EntireTraceExtractor)],
                assertion_sets::common(),
            )
            .unwrap();
        config
    }

    #[test]
    fn duplicate_scenario_leaves_registry_intact() {
        let mut config = config();
        let err = config
            .register_scenario(ScenarioId::COMMON, Vec::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateScenario(_)), "{err}");
        assert_eq!(config.len(), 1, "one scenario");
        assert_eq!(
            config.assertions(&ScenarioId::COMMON).map(Vec::len),
            Some(3),
            "original assertions kept"
        );
    }

    #[test]
    fn use_entries_rejects_duplicate_scenario() {
        let mut config = FlickerConfig::new();
        let err = config
            .use_entries([
                FlickerConfigEntry::new(
                    ScenarioId::COMMON,
                    EntireTraceExtractor,
                    assertion_sets::common(),
                ),
                FlickerConfigEntry::new(
                    ScenarioId::COMMON,
                    EntireTraceExtractor,
                    assertion_sets::common(),
                ),
            ])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateScenario(_)), "{err}");
        assert_eq!(config.len(), 1, "first entry stays registered");
        assert_eq!(
            config.get_extractors().len(),
            1,
            "second extractor not attached"
        );
    }

    #[test]
    fn assertion_operations_require_a_registered_scenario() {
        let mut config = config();
        let missing = ScenarioId::from_static("MISSING");
        assert!(
            matches!(
                config.register_assertion(
                    &missing,
                    Arc::new(OK),
                    AssertionInvocationGroup::Blocking,
                ),
                Err(ConfigError::UnknownScenario(_))
            ),
            "register"
        );
        assert!(
            matches!(
                config.unregister_assertion(&missing, "Ok"),
                Err(ConfigError::UnknownScenario(_))
            ),
            "unregister"
        );
        assert!(
            matches!(config.unregister_scenario(&missing), Err(ConfigError::UnknownScenario(_))),
            "scenario"
        );
    }

    #[test]
    fn assertions_are_unique_per_scenario() {
        let mut config = config();
        config
            .register_assertion(
                &ScenarioId::COMMON,
                Arc::new(OK),
                AssertionInvocationGroup::Blocking,
            )
            .unwrap();
        let err = config
            .register_assertion(
                &ScenarioId::COMMON,
                Arc::new(OK),
                AssertionInvocationGroup::NonBlocking,
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion with id 'Ok' already present for scenario 'COMMON'",
            "duplicate id"
        );
        assert!(
            matches!(
                config.unregister_assertion(&ScenarioId::COMMON, "Nope"),
                Err(ConfigError::UnknownAssertion { .. })
            ),
            "unknown id"
        );
    }

    #[test]
    fn extractors_snapshot_the_assertion_set() {
        let mut config = config();
        let before = config.get_extractors();
        config
            .register_assertion(
                &ScenarioId::COMMON,
                Arc::new(OK),
                AssertionInvocationGroup::Blocking,
            )
            .unwrap();
        let after = config.get_extractors();
        assert_eq!(before[0].assertions().len(), 3, "earlier snapshot unchanged");
        assert_eq!(after[0].assertions().len(), 4, "fresh snapshot");
    }

    #[test]
    fn use_entries_skips_disabled_and_composes() {
        let common = FlickerConfigEntry::new(
            ScenarioId::COMMON,
            EntireTraceExtractor,
            assertion_sets::common(),
        );
        let other = FlickerConfigEntry::new(
            ScenarioId::from_static("OTHER"),
            EntireTraceExtractor,
            assertion_sets::common(),
        );
        let off = FlickerConfigEntry::new(
            ScenarioId::from_static("OFF"),
            EntireTraceExtractor,
            Vec::new(),
        )
            .disabled();
        let mut config = FlickerConfig::new();
        config
            .use_entries([common, off])
            .unwrap()
            .use_entries([other])
            .unwrap();
        let ids: Vec<&str> = config.scenarios().map(ScenarioId::as_str).collect();
        assert_eq!(ids, ["COMMON", "OTHER"], "disabled entry skipped");
    }

    #[test]
    fn extracted_instances_carry_the_snapshot() {
        let states = [1, 2]
            .into_iter()
            .map(|t| WindowManagerState::new(Timestamp::from_elapsed(t), Vec::new()).unwrap())
            .collect();
        let reader = TraceReader::new().with_wm(WindowManagerTrace::new(states).unwrap());
        let extractors = config().get_extractors();
        let instances = extractors[0].extract(&reader).unwrap();
        assert_eq!(instances.len(), 1, "whole trace");
        assert_eq!(instances[0].assertions().len(), 3, "common set");
        assert_eq!(instances[0].scenario(), &ScenarioId::COMMON, "scenario");
    }

    #[test]
    fn overrides_from_json() {
        let json = r#"{
            "disabled_scenarios": [],
            "stability_overrides": [
                { "scenario": "COMMON", "assertion": "EntireScreenCoveredAlways", "group": "NON_BLOCKING" }
            ]
        }"#;
        let overrides = ConfigOverrides::from_json(json).unwrap();
        let mut config = config();
        config.apply_overrides(&overrides).unwrap();
        let groups: Vec<AssertionInvocationGroup> = config
            .assertions(&ScenarioId::COMMON)
            .unwrap()
            .iter()
            .map(|(_, g)| *g)
            .collect();
        assert_eq!(groups[0], AssertionInvocationGroup::NonBlocking, "targeted assertion moved");
        assert!(
            groups[1..].iter().all(|g| *g == AssertionInvocationGroup::Blocking),
            "others untouched"
        );

        assert!(
            matches!(
                ConfigOverrides::from_json(r#"{ "bogus": 1 }"#),
                Err(ConfigError::InvalidOverrides(_))
            ),
            "unknown field rejected"
        );
        let unknown = ConfigOverrides {
            disabled_scenarios: vec![ScenarioId::from_static("MISSING")],
            ..ConfigOverrides::default()
        };
        assert!(config.apply_overrides(&unknown).is_err(), "validated like the API");
    }
}
