// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named component roles resolved per scenario instance.
//!
//! A role is either a fixed component ([`ComponentTemplate::fixed`]) or a
//! function of the instance ([`ComponentTemplate::dynamic`]), typically
//! reading the associated transition's changes.

use std::fmt;
use std::sync::Arc;

use flicker_core::component::{
    ComponentNameConst, ComponentNameMatcher, FullComponentIdMatcher, SharedMatcher,
};
use flicker_core::cuj::CujType;
use flicker_core::transition::{Transition, TransitionChange, TransitionType};

use crate::error::ExtractionError;
use crate::instance::ScenarioInstance;
use crate::scenario::ScenarioId;

type Resolver = fn(&ScenarioInstance) -> Result<SharedMatcher, ExtractionError>;

#[derive(Clone, Copy)]
enum Resolution {
    Fixed(ComponentNameConst),
    Literal(&'static str),
    Dynamic(Resolver),
}

/// A named, lazily resolved component role.
#[derive(Clone, Copy)]
pub struct ComponentTemplate {
    name: &'static str,
    resolution: Resolution,
}

impl fmt::Debug for ComponentTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTemplate({})", self.name)
    }
}

impl PartialEq for ComponentTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ComponentTemplate {}

impl ComponentTemplate {
    /// A role bound to a well-known component.
    #[must_use]
    pub const fn fixed(name: &'static str, component: ComponentNameConst) -> Self {
        Self {
            name,
            resolution: Resolution::Fixed(component),
        }
    }

    /// A role bound to a system component class name.
    #[must_use]
    pub const fn system(name: &'static str, class_name: &'static str) -> Self {
        Self {
            name,
            resolution: Resolution::Literal(class_name),
        }
    }

    /// A role computed from the instance.
    #[must_use]
    pub const fn dynamic(name: &'static str, resolver: Resolver) -> Self {
        Self {
            name,
            resolution: Resolution::Dynamic(resolver),
        }
    }

    /// The role name, used in assertion ids.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Resolves the role without caching.
    ///
    /// Prefer [`ScenarioInstance::resolve`], which caches.
    ///
    /// # Errors
    ///
    /// Dynamic roles fail when the instance lacks what they read.
    pub fn build(&self, instance: &ScenarioInstance) -> Result<SharedMatcher, ExtractionError> {
        match self.resolution {
            Resolution::Fixed(component) => Ok(component.shared()),
            Resolution::Literal(class_name) => {
                Ok(Arc::new(ComponentNameMatcher::system(class_name)))
            }
            Resolution::Dynamic(resolve) => resolve(instance),
        }
    }
}

/// Navigation bar.
pub const NAV_BAR: ComponentTemplate =
    ComponentTemplate::fixed("Navbar", ComponentNameMatcher::NAV_BAR);
/// Status bar.
pub const STATUS_BAR: ComponentTemplate =
    ComponentTemplate::fixed("StatusBar", ComponentNameMatcher::STATUS_BAR);
/// The home launcher.
pub const LAUNCHER: ComponentTemplate =
    ComponentTemplate::fixed("Launcher", ComponentNameMatcher::LAUNCHER);
/// The app brought to front by the associated transition.
pub const OPENING_APP: ComponentTemplate = ComponentTemplate::dynamic("OPENING_APP", opening_app);
/// The app sent away by the associated transition.
pub const CLOSING_APP: ComponentTemplate = ComponentTemplate::dynamic("CLOSING_APP", closing_app);
/// The drag-to-dismiss target shown over picture-in-picture.
pub const PIP_DISMISS_OVERLAY: ComponentTemplate =
    ComponentTemplate::system("PipDismissOverlay", "pip-dismiss-overlay");
/// The overlay drawn over content entering picture-in-picture.
pub const PIP_CONTENT_OVERLAY: ComponentTemplate =
    ComponentTemplate::fixed("PipContentOverlay", ComponentNameMatcher::PIP_CONTENT_OVERLAY);
/// The app entering picture-in-picture.
pub const PIP_APP: ComponentTemplate = ComponentTemplate::dynamic("PIP", pip_app);
/// The split-screen divider.
pub const SPLIT_SCREEN_DIVIDER: ComponentTemplate =
    ComponentTemplate::system("SplitScreenDivider", "StageCoordinatorSplitDivider#");
/// The first app of a split pair.
pub const SPLIT_SCREEN_PRIMARY_APP: ComponentTemplate =
    ComponentTemplate::dynamic("SPLIT_SCREEN_PRIMARY_APP", split_screen_primary_app);
/// The second app of a split pair.
pub const SPLIT_SCREEN_SECONDARY_APP: ComponentTemplate =
    ComponentTemplate::dynamic("SPLIT_SCREEN_SECONDARY_APP", split_screen_secondary_app);

/// Every built-in role.
pub const ALL: &[ComponentTemplate] = &[
    NAV_BAR,
    STATUS_BAR,
    LAUNCHER,
    OPENING_APP,
    CLOSING_APP,
    PIP_DISMISS_OVERLAY,
    PIP_CONTENT_OVERLAY,
    PIP_APP,
    SPLIT_SCREEN_DIVIDER,
    SPLIT_SCREEN_PRIMARY_APP,
    SPLIT_SCREEN_SECONDARY_APP,
];

/// Looks a built-in role up by name.
#[must_use]
pub fn by_name(name: &str) -> Option<ComponentTemplate> {
    ALL.iter().copied().find(|c| c.name == name)
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

fn transition(instance: &ScenarioInstance) -> Result<&Transition, ExtractionError> {
    instance
        .associated_transition()
        .ok_or_else(|| ExtractionError::Component(String::from("Missing associated transition")))
}

fn id_matcher(change: &TransitionChange) -> SharedMatcher {
    Arc::new(FullComponentIdMatcher::new(change.window_id, change.layer_id))
}

fn single_change(
    transition: &Transition,
    what: &str,
    modes: [TransitionType; 2],
) -> Result<SharedMatcher, ExtractionError> {
    let targets: Vec<&TransitionChange> = transition
        .changes()
        .iter()
        .filter(|c| modes.contains(&c.transit_mode))
        .collect();
    match targets.as_slice() {
        [change] => Ok(id_matcher(change)),
        _ => Err(ExtractionError::Component(format!(
            "Expected 1 {what} layer but got {}",
            targets.len()
        ))),
    }
}

fn opening_app(instance: &ScenarioInstance) -> Result<SharedMatcher, ExtractionError> {
    single_change(
        transition(instance)?,
        "opening",
        [TransitionType::Open, TransitionType::ToFront],
    )
}

fn closing_app(instance: &ScenarioInstance) -> Result<SharedMatcher, ExtractionError> {
    single_change(
        transition(instance)?,
        "closing",
        [TransitionType::Close, TransitionType::ToBack],
    )
}

fn pip_app(instance: &ScenarioInstance) -> Result<SharedMatcher, ExtractionError> {
    if *instance.scenario() != ScenarioId::from_cuj(CujType::LauncherAppCloseToPip) {
        return Err(ExtractionError::Component(format!(
            "Can't get the PiP app for scenario {}",
            instance.scenario()
        )));
    }
    transition(instance)?
        .changes()
        .iter()
        .find(|c| c.transit_mode == TransitionType::ToBack)
        .map(id_matcher)
        .ok_or_else(|| ExtractionError::Component(String::from("Missing to back change")))
}

fn split_screen_primary_app(instance: &ScenarioInstance) -> Result<SharedMatcher, ExtractionError> {
    split_screen_app(instance, "SPLIT_SCREEN_PRIMARY_APP", 0)
}

fn split_screen_secondary_app(
    instance: &ScenarioInstance,
) -> Result<SharedMatcher, ExtractionError> {
    split_screen_app(instance, "SPLIT_SCREEN_SECONDARY_APP", 1)
}

fn split_screen_app(
    instance: &ScenarioInstance,
    role: &str,
    index: usize,
) -> Result<SharedMatcher, ExtractionError> {
    let transition = instance.associated_transition().ok_or_else(|| {
        ExtractionError::Component(format!(
            "Can only extract {role} from scenario with transition"
        ))
    })?;
    let scenario = instance.scenario();
    if *scenario == ScenarioId::from_cuj(CujType::SplitScreenEnter) {
        let apps = split_screen_opening_apps(instance, transition)?;
        Ok(SharedMatcher::clone(&apps[index]))
    } else if *scenario == ScenarioId::from_cuj(CujType::SplitScreenResize) {
        let changes = transition.changes();
        let change = if index == 0 { changes.first() } else { changes.last() };
        change
            .map(id_matcher)
            .ok_or_else(|| ExtractionError::Component(String::from("Transition has no changes")))
    } else {
        Err(ExtractionError::Component(format!(
            "Can't resolve {role} for scenario {scenario}"
        )))
    }
}

/// The two app tasks of a split pair.
///
/// The transition changes the root split task, both stage tasks and the two
/// app tasks. An app task is a change whose grandparent layer is also part
/// of the changes.
fn split_screen_opening_apps(
    instance: &ScenarioInstance,
    transition: &Transition,
) -> Result<[SharedMatcher; 2], ExtractionError> {
    let layers = instance
        .reader()
        .read_layers_trace()
        .ok_or(ExtractionError::MissingTrace("layers"))?;
    let entry = layers
        .last()
        .ok_or_else(|| ExtractionError::Component(String::from("Layers trace is empty")))?;
    let changed: Vec<i32> = transition.changes().iter().map(|c| c.layer_id).collect();
    let apps: Vec<SharedMatcher> = transition
        .changes()
        .iter()
        .filter(|change| {
            entry
                .layer_by_id(change.layer_id)
                .and_then(|layer| entry.ancestors(layer).nth(1))
                .is_some_and(|grandparent| changed.contains(&grandparent.id))
        })
        .map(id_matcher)
        .collect();
    match <[SharedMatcher; 2]>::try_from(apps) {
        Ok(pair) => Ok(pair),
        Err(apps) => Err(ExtractionError::Component(format!(
            "Expected to get 2 splitscreen apps but got {}",
            apps.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::NO_PARENT;
    use flicker_core::layers::{Layer, LayerTraceEntry, LayersTrace};
    use flicker_core::reader::TraceReader;
    use flicker_core::time::Timestamp;
    use flicker_core::transition::{ShellTransitionData, WmTransitionData};

    use crate::instance::TraceSlice;

    fn transition_with(kind: TransitionType, changes: Vec<TransitionChange>) -> Transition {
        let wm = WmTransitionData {
            create_time: Some(Timestamp::from_elapsed(10)),
            finish_time: Some(Timestamp::from_elapsed(20)),
            transition_type: Some(kind),
            changes: Some(changes),
            ..WmTransitionData::default()
        };
        Transition::new(1, wm, ShellTransitionData::default()).unwrap()
    }

    fn instance_of(
        scenario: ScenarioId,
        transition: Transition,
        reader: &TraceReader,
    ) -> ScenarioInstance {
        ScenarioInstance::new(
            scenario,
            TraceSlice {
                start: Timestamp::from_elapsed(10),
                end: Timestamp::from_elapsed(20),
                associated_transition: Some(transition),
                associated_cuj: None,
            },
            reader,
            Vec::new(),
        )
    }

    #[test]
    fn opening_and_closing_apps_use_change_ids() {
        let t = transition_with(
            TransitionType::ToFront,
            vec![
                TransitionChange::new(TransitionType::ToBack, 5, 0x50),
                TransitionChange::new(TransitionType::ToFront, 6, 0x60),
            ],
        );
        let inst = instance_of(ScenarioId::COMMON, t, &TraceReader::new());
        let opening = inst.resolve(&OPENING_APP).unwrap();
        assert_eq!(opening.to_window_identifier(), "windowId=60", "to-front window");
        assert_eq!(opening.to_layer_identifier(), "layerId=6", "to-front layer");
        let closing = inst.resolve(&CLOSING_APP).unwrap();
        assert_eq!(closing.to_layer_identifier(), "layerId=5", "to-back layer");
    }

    #[test]
    fn opening_app_requires_exactly_one_change() {
        let t = transition_with(
            TransitionType::Open,
            vec![
                TransitionChange::new(TransitionType::Open, 5, 0x50),
                TransitionChange::new(TransitionType::Open, 6, 0x60),
            ],
        );
        let inst = instance_of(ScenarioId::COMMON, t, &TraceReader::new());
        let err = inst.resolve(&OPENING_APP).unwrap_err();
        assert_eq!(err.to_string(), "Expected 1 opening layer but got 2", "cardinality error");
    }

    #[test]
    fn pip_app_only_for_close_to_pip() {
        let t = transition_with(
            TransitionType::Pip,
            vec![TransitionChange::new(TransitionType::ToBack, 9, 0x90)],
        );
        let reader = TraceReader::new();
        let pip = instance_of(
            ScenarioId::from_cuj(CujType::LauncherAppCloseToPip),
            t.clone(),
            &reader,
        );
        assert_eq!(
            pip.resolve(&PIP_APP).unwrap().to_layer_identifier(),
            "layerId=9",
            "to-back change"
        );
        let other = instance_of(ScenarioId::COMMON, t, &reader);
        assert!(other.resolve(&PIP_APP).is_err(), "other scenarios are rejected");
    }

    #[test]
    fn split_enter_finds_app_tasks_by_grandparent() {
        // root(1) -> stage(2) -> decor(4), app(3); root(1) -> stage(5) -> app(6)
        let entry = LayerTraceEntry::new(
            Timestamp::from_elapsed(15),
            Vec::new(),
            vec![
                Layer::new(1, NO_PARENT, "Task=1"),
                Layer::new(2, 1, "Task=2"),
                Layer::new(3, 2, "Task=3"),
                Layer::new(4, 2, "SplitDecorManager"),
                Layer::new(5, 1, "Task=5"),
                Layer::new(6, 5, "Task=6"),
            ],
        )
        .unwrap();
        let reader = TraceReader::new().with_layers(LayersTrace::new(vec![entry]).unwrap());
        let t = transition_with(
            TransitionType::ToFront,
            [1, 2, 3, 5, 6]
                .into_iter()
                .map(|id| TransitionChange::new(TransitionType::Change, id, id * 16))
                .collect(),
        );
        let inst = instance_of(ScenarioId::from_cuj(CujType::SplitScreenEnter), t, &reader);
        assert_eq!(
            inst.resolve(&SPLIT_SCREEN_PRIMARY_APP).unwrap().to_layer_identifier(),
            "layerId=3",
            "first app task"
        );
        assert_eq!(
            inst.resolve(&SPLIT_SCREEN_SECONDARY_APP).unwrap().to_layer_identifier(),
            "layerId=6",
            "second app task"
        );
    }

    #[test]
    fn split_exit_is_unsupported() {
        let t = transition_with(TransitionType::SplitDismiss, Vec::new());
        let inst = instance_of(
            ScenarioId::from_cuj(CujType::SplitScreenExit),
            t,
            &TraceReader::new(),
        );
        assert!(inst.resolve(&SPLIT_SCREEN_PRIMARY_APP).is_err(), "no rule for exit");
    }

    #[test]
    fn roles_by_name() {
        assert_eq!(by_name("Launcher"), Some(LAUNCHER), "fixed role");
        assert_eq!(by_name("OPENING_APP"), Some(OPENING_APP), "dynamic role");
        assert_eq!(by_name("nope"), None, "unknown");
    }
}
