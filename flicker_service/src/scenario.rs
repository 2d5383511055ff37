// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenario identifiers, invocation groups and execution conditions.

use std::borrow::Cow;
use std::fmt;

use flicker_core::cuj::CujType;
use flicker_core::transition::Transition;
use serde::{Deserialize, Serialize};

/// Names a class of UI transition, e.g. `LAUNCHER_APP_LAUNCH_FROM_ICON`.
///
/// Scenarios tied to a journey are named after it, without the `CUJ_`
/// prefix.
///
/// ```
/// use flicker_core::cuj::CujType;
/// use flicker_service::ScenarioId;
///
/// let id = ScenarioId::from_cuj(CujType::LauncherQuickSwitch);
/// assert_eq!(id.as_str(), "LAUNCHER_QUICK_SWITCH");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(Cow<'static, str>);

impl ScenarioId {
    /// Checks that apply to the whole run.
    pub const COMMON: Self = Self::from_static("COMMON");

    /// A scenario id from a static name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// A scenario id from an owned name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The scenario detected through `cuj`.
    #[must_use]
    pub fn from_cuj(cuj: CujType) -> Self {
        let name = cuj.name();
        Self::from_static(name.strip_prefix("CUJ_").unwrap_or(name))
    }

    /// The name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScenarioId({})", self.0)
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a failing assertion fails the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssertionInvocationGroup {
    /// A failure fails the run.
    #[default]
    Blocking,
    /// A failure is reported but the run still passes.
    NonBlocking,
}

impl fmt::Display for AssertionInvocationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blocking => "BLOCKING",
            Self::NonBlocking => "NON_BLOCKING",
        })
    }
}

/// Decides whether a detected instance should be checked at all.
#[derive(Clone, Copy, Default)]
pub enum ExecutionCondition {
    /// Every instance is checked.
    #[default]
    Always,
    /// No instance is checked.
    Never,
    /// Instances whose associated transition satisfies the predicate.
    ///
    /// Instances without a transition are not checked.
    Matches(fn(&Transition) -> bool),
}

impl ExecutionCondition {
    /// Returns `true` if an instance with this transition should be checked.
    #[must_use]
    pub fn should_execute(&self, transition: Option<&Transition>) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Matches(f) => transition.is_some_and(f),
        }
    }
}

impl fmt::Debug for ExecutionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::Matches(_) => f.write_str("Matches(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::time::Timestamp;
    use flicker_core::transition::{ShellTransitionData, TransitionType, WmTransitionData};

    fn transition(kind: TransitionType) -> Transition {
        let wm = WmTransitionData {
            create_time: Some(Timestamp::from_elapsed(1)),
            transition_type: Some(kind),
            ..WmTransitionData::default()
        };
        Transition::new(1, wm, ShellTransitionData::default()).unwrap()
    }

    #[test]
    fn cuj_scenarios_drop_the_prefix() {
        assert_eq!(
            ScenarioId::from_cuj(CujType::SplitScreenEnter),
            ScenarioId::new("SPLIT_SCREEN_ENTER"),
            "borrowed and owned ids compare by name"
        );
    }

    #[test]
    fn group_serializes_in_platform_form() {
        let json = serde_json::to_string(&AssertionInvocationGroup::NonBlocking).unwrap();
        assert_eq!(json, "\"NON_BLOCKING\"", "screaming snake case");
        let back: AssertionInvocationGroup = serde_json::from_str("\"BLOCKING\"").unwrap();
        assert_eq!(back, AssertionInvocationGroup::Blocking, "parses back");
    }

    #[test]
    fn conditions() {
        let open = transition(TransitionType::Open);
        let is_open: fn(&Transition) -> bool = |t| t.transition_type() == TransitionType::Open;
        assert!(ExecutionCondition::Always.should_execute(None), "always");
        assert!(!ExecutionCondition::Never.should_execute(Some(&open)), "never");
        assert!(
            ExecutionCondition::Matches(is_open).should_execute(Some(&open)),
            "predicate holds"
        );
        assert!(
            !ExecutionCondition::Matches(is_open).should_execute(None),
            "no transition to test"
        );
    }
}
