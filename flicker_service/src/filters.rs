// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition transforms: filters and combinators over transition lists.
//!
//! Every transform has the same shape, [`TransitionsTransform`], so that a
//! [`TransitionMatcher`](crate::TransitionMatcher) can chain them. Transforms
//! that need to know what a change's layer is read the layers trace through
//! the reader they are given.

use flicker_core::component::{ComponentMatcher, ComponentNameMatcher};
use flicker_core::cuj::Cuj;
use flicker_core::layers::{Layer, LayerTraceEntry, LayersTrace};
use flicker_core::reader::Reader;
use flicker_core::time::Timestamp;
use flicker_core::transition::{
    Transition, TransitionChange, TransitionHandler, TransitionType, WmTransitionData,
};

use crate::error::ExtractionError;

/// A transform over the transitions considered for one journey.
pub type TransitionsTransform =
    fn(Vec<Transition>, &Cuj, &dyn Reader) -> Result<Vec<Transition>, ExtractionError>;

fn layers_trace(reader: &dyn Reader) -> Result<&LayersTrace, ExtractionError> {
    reader
        .read_layers_trace()
        .ok_or(ExtractionError::MissingTrace("layers"))
}

/// The first snapshot holding a layer with this id, and the layer.
fn find_layer(trace: &LayersTrace, id: i32) -> Option<(&LayerTraceEntry, &Layer)> {
    trace
        .entries()
        .iter()
        .find_map(|entry| entry.layer_by_id(id).map(|layer| (entry, layer)))
}

fn is_opening(change: &TransitionChange) -> bool {
    matches!(change.transit_mode, TransitionType::Open | TransitionType::ToFront)
}

fn is_closing(change: &TransitionChange) -> bool {
    matches!(change.transit_mode, TransitionType::Close | TransitionType::ToBack)
}

// ---------------------------------------------------------------------------
// Scenario filters
// ---------------------------------------------------------------------------

/// Leaves the list unchanged.
pub fn no_op(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    Ok(transitions)
}

/// Keeps transitions that open an app (cold or warm launch).
pub fn open_app(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    Ok(transitions
        .into_iter()
        .filter(|t| t.changes().iter().any(is_opening))
        .collect())
}

/// Ids of launcher layers and of the top-level tasks holding them.
fn launcher_layer_ids(trace: &LayersTrace) -> Vec<i32> {
    let launcher = ComponentNameMatcher::LAUNCHER.matcher();
    let aosp = ComponentNameMatcher::AOSP_LAUNCHER.matcher();
    let mut ids = Vec::new();
    for entry in trace.entries() {
        for layer in entry.layers() {
            if !launcher.layer_matches(entry, layer) && !aosp.layer_matches(entry, layer) {
                continue;
            }
            ids.push(layer.id);
            if let Some(task) = top_level_task(entry, layer) {
                ids.push(task.id);
            }
        }
    }
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// The outermost task in the unbroken chain of tasks above `layer`.
fn top_level_task<'a>(entry: &'a LayerTraceEntry, layer: &'a Layer) -> Option<&'a Layer> {
    let mut task = if layer.is_task() {
        layer
    } else {
        entry.ancestors(layer).find(|l| l.is_task())?
    };
    while let Some(parent) = entry.parent(task).filter(|p| p.is_task()) {
        task = parent;
    }
    Some(task)
}

/// Keeps transitions that close an app while the launcher comes to front.
///
/// # Errors
///
/// [`ExtractionError::MissingTrace`] without a layers trace.
pub fn close_app_to_launcher(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    let launcher = launcher_layer_ids(layers_trace(reader)?);
    Ok(transitions
        .into_iter()
        .filter(|t| {
            t.changes().iter().any(is_closing)
                && t.changes().iter().any(|c| {
                    c.transit_mode == TransitionType::ToFront && launcher.contains(&c.layer_id)
                })
        })
        .collect())
}

/// Returns `true` for exactly two changes: one to back, one to front.
fn is_quick_switch(transition: &Transition) -> bool {
    let changes = transition.changes();
    changes.len() == 2
        && changes.iter().any(|c| c.transit_mode == TransitionType::ToBack)
        && changes.iter().any(|c| c.transit_mode == TransitionType::ToFront)
}

/// Keeps transitions that swap one app to back and another to front.
pub fn quick_switch(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    Ok(transitions.into_iter().filter(is_quick_switch).collect())
}

fn precondition(ok: bool, message: impl FnOnce() -> String) -> Result<(), ExtractionError> {
    if ok {
        Ok(())
    } else {
        Err(ExtractionError::Precondition(message()))
    }
}

fn change_with(transition: &Transition, mode: TransitionType) -> Option<TransitionChange> {
    transition
        .changes()
        .iter()
        .copied()
        .find(|c| c.transit_mode == mode)
}

/// Combines the two halves of a quick switch into one transition.
///
/// A quick switch is recorded as two transitions: the first swaps the app
/// for the launcher, the second swaps the launcher for the next app. The
/// result keeps the first transition's id, creation, send and finish times,
/// and its changes are the first transition's closing change followed by the
/// second transition's opening change. A single transition is passed
/// through.
///
/// # Errors
///
/// [`ExtractionError::Precondition`] unless there are one or two
/// transitions, each with exactly two changes (one to back, one to front),
/// and the layer brought to front by the first is the one sent back by the
/// second.
pub fn quick_switch_merge(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    if transitions.len() == 1 {
        return Ok(transitions);
    }
    let [first, second] = transitions.as_slice() else {
        return Err(ExtractionError::Precondition(format!(
            "Expected 2 quick switch transitions but got {}",
            transitions.len()
        )));
    };
    precondition(first.changes().len() == 2, || {
        format!("Expected 2 changes in {first} but got {}", first.changes().len())
    })?;
    precondition(second.changes().len() == 2, || {
        format!("Expected 2 changes in {second} but got {}", second.changes().len())
    })?;
    let (Some(closing), Some(launcher_front), Some(launcher_back), Some(opening)) = (
        change_with(first, TransitionType::ToBack),
        change_with(first, TransitionType::ToFront),
        change_with(second, TransitionType::ToBack),
        change_with(second, TransitionType::ToFront),
    ) else {
        return Err(ExtractionError::Precondition(format!(
            "Expected one TO_BACK and one TO_FRONT change in {first} and {second}"
        )));
    };
    precondition(launcher_front.layer_id == launcher_back.layer_id, || {
        format!(
            "Expected the layer brought to front by {first} ({}) to be sent back by {second} ({})",
            launcher_front.layer_id, launcher_back.layer_id
        )
    })?;

    let wm = first.wm_data();
    let merged = Transition::new(
        first.id(),
        WmTransitionData {
            create_time: wm.create_time,
            send_time: wm.send_time,
            abort_time: None,
            finish_time: wm.finish_time,
            start_transaction_id: wm.start_transaction_id,
            finish_transaction_id: wm.finish_transaction_id,
            transition_type: wm.transition_type,
            changes: Some(vec![closing, opening]),
        },
        first.shell_data().clone(),
    )?;
    Ok(vec![merged])
}

/// Keeps transitions that move an app into picture-in-picture.
pub fn app_close_to_pip(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    Ok(transitions
        .into_iter()
        .filter(|t| t.transition_type() == TransitionType::Pip)
        .collect())
}

/// Returns `true` for a split-screen handler bringing a pair to front.
#[must_use]
pub fn is_splitscreen_enter(transition: &Transition) -> bool {
    transition.handler() == Some(TransitionHandler::SplitScreen)
        && transition.transition_type() == TransitionType::ToFront
}

/// Returns `true` for a split-screen dismissal.
#[must_use]
pub fn is_splitscreen_exit(transition: &Transition) -> bool {
    matches!(
        transition.transition_type(),
        TransitionType::SplitDismiss | TransitionType::SplitDismissSnap
    )
}

/// Returns `true` for a divider drag: two apps changing bounds.
///
/// There is no dedicated transition type for this.
#[must_use]
pub fn is_splitscreen_resize(transition: &Transition) -> bool {
    transition.transition_type() == TransitionType::Change
        && transition.changes().len() == 2
        && transition
            .changes()
            .iter()
            .all(|c| c.transit_mode == TransitionType::Change)
}

/// Keeps split-screen entries.
pub fn enter_split_screen(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    Ok(transitions.into_iter().filter(is_splitscreen_enter).collect())
}

/// Keeps split-screen exits.
pub fn exit_split_screen(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    Ok(transitions.into_iter().filter(is_splitscreen_exit).collect())
}

/// Keeps split-screen resizes.
pub fn resize_split_screen(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    Ok(transitions.into_iter().filter(is_splitscreen_resize).collect())
}

// ---------------------------------------------------------------------------
// Matcher stages
// ---------------------------------------------------------------------------

/// Keeps transitions belonging to the journey.
///
/// A transition belongs if it was created or sent between the journey's
/// begin and end, or if the journey began while it was playing.
pub fn in_cuj_range(
    transitions: Vec<Transition>,
    cuj: &Cuj,
    _reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    let within = |ts: Timestamp| cuj.start <= ts && ts <= cuj.end;
    Ok(transitions
        .into_iter()
        .filter(|t| {
            within(t.create_time())
                || within(t.send_time())
                || (t.send_time() <= cuj.start && cuj.start <= t.finish_time())
        })
        .collect())
}

/// Drops transitions that only open a runtime permission dialog.
///
/// # Errors
///
/// Fails without a layers trace, or when the opened layer is not in it.
pub fn permission_dialog(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    let mut kept = Vec::with_capacity(transitions.len());
    for t in transitions {
        if !is_permission_dialog_open(&t, reader)? {
            kept.push(t);
        }
    }
    Ok(kept)
}

fn is_permission_dialog_open(
    transition: &Transition,
    reader: &dyn Reader,
) -> Result<bool, ExtractionError> {
    let [change] = transition.changes() else {
        return Ok(false);
    };
    if transition.transition_type() != TransitionType::Open
        || change.transit_mode != TransitionType::Open
    {
        return Ok(false);
    }
    let (_, layer) = find_layer(layers_trace(reader)?, change.layer_id).ok_or_else(|| {
        ExtractionError::Precondition(format!(
            "Open layer from {transition} not found in layers trace"
        ))
    })?;
    Ok(layer.name.contains("permissioncontroller"))
}

/// Drops the second transition of a trampoline launch.
///
/// A trampoline activity opens in a task and immediately starts the real
/// target in the same task, producing two transitions. Only the first is
/// kept.
///
/// # Errors
///
/// Fails with more than two transitions left, or when a trampoline
/// candidate is ambiguous. Without a layers trace nothing is merged.
pub fn merge_trampoline(
    transitions: Vec<Transition>,
    _cuj: &Cuj,
    reader: &dyn Reader,
) -> Result<Vec<Transition>, ExtractionError> {
    if transitions.len() > 2 {
        return Err(ExtractionError::Precondition(format!(
            "Got to merging trampoline transitions with more than 2 transitions left: {}",
            transitions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    if let [first, second] = transitions.as_slice() {
        if is_trampolined_open(first, second, reader)? {
            return Ok(vec![first.clone()]);
        }
    }
    Ok(transitions)
}

fn is_trampolined_open(
    first: &Transition,
    second: &Transition,
    reader: &dyn Reader,
) -> Result<bool, ExtractionError> {
    let task_candidates: Vec<i32> = first
        .changes()
        .iter()
        .filter(|c| is_opening(c))
        .map(|c| c.layer_id)
        .collect();
    let task_id = match task_candidates.as_slice() {
        [] => return Ok(false),
        [id] => *id,
        _ => {
            return Err(ExtractionError::Precondition(String::from(
                "Unhandled case (more than 1 task candidate) in trampoline detection",
            )));
        }
    };
    // Without layers the task cannot be identified.
    let Some(layers) = reader.read_layers_trace() else {
        return Ok(false);
    };
    if !find_layer(layers, task_id).is_some_and(|(_, l)| l.name.contains("Task")) {
        return Ok(false);
    }

    let closing: Vec<i32> = second
        .changes()
        .iter()
        .filter(|c| c.transit_mode == TransitionType::Close)
        .map(|c| c.layer_id)
        .collect();
    let targets: Vec<i32> = second
        .changes()
        .iter()
        .filter(|c| is_opening(c))
        .map(|c| c.layer_id)
        .collect();
    let (&[trampolined], &[target]) = (closing.as_slice(), targets.as_slice()) else {
        if closing.is_empty() || targets.is_empty() {
            return Ok(false);
        }
        return Err(ExtractionError::Precondition(String::from(
            "Unhandled case (more than 1 trampolined or target candidate) in trampoline detection",
        )));
    };
    let in_task = |id| find_layer(layers, id).is_some_and(|(_, l)| l.parent_id == task_id);
    Ok(in_task(trampolined) && in_task(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::NO_PARENT;
    use flicker_core::cuj::CujType;
    use flicker_core::reader::TraceReader;
    use flicker_core::time::Timestamp;
    use flicker_core::transition::ShellTransitionData;

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_elapsed(ms * 1_000_000)
    }

    fn cuj(start: i64, end: i64) -> Cuj {
        Cuj {
            cuj: CujType::LauncherQuickSwitch,
            start: ts(start),
            end: ts(end),
            canceled: false,
            tag: None,
        }
    }

    fn transition(
        id: i32,
        kind: TransitionType,
        times: (i64, i64),
        changes: Vec<TransitionChange>,
    ) -> Transition {
        let wm = WmTransitionData {
            create_time: Some(ts(times.0)),
            send_time: Some(ts(times.0 + 1)),
            finish_time: Some(ts(times.1)),
            transition_type: Some(kind),
            changes: Some(changes),
            ..WmTransitionData::default()
        };
        Transition::new(id, wm, ShellTransitionData::default()).unwrap()
    }

    fn change(mode: TransitionType, layer: i32) -> TransitionChange {
        TransitionChange::new(mode, layer, layer * 16)
    }

    fn reader_with(layers: Vec<Layer>) -> TraceReader {
        let entry = LayerTraceEntry::new(ts(0), Vec::new(), layers).unwrap();
        TraceReader::new().with_layers(LayersTrace::new(vec![entry]).unwrap())
    }

    #[test]
    fn open_app_keeps_cold_and_warm_launches() {
        let all = vec![
            transition(1, TransitionType::Open, (10, 20), vec![change(TransitionType::Open, 1)]),
            transition(
                2,
                TransitionType::ToFront,
                (30, 40),
                vec![change(TransitionType::ToFront, 2)],
            ),
            transition(3, TransitionType::Close, (50, 60), vec![change(TransitionType::Close, 3)]),
        ];
        let kept = open_app(all, &cuj(0, 100), &TraceReader::new()).unwrap();
        let ids: Vec<i32> = kept.iter().map(Transition::id).collect();
        assert_eq!(ids, vec![1, 2], "close is dropped");
    }

    #[test]
    fn close_to_launcher_requires_launcher_to_front() {
        let reader = reader_with(vec![
            Layer::new(1, NO_PARENT, "Task=1"),
            Layer::new(
                2,
                1,
                "com.google.android.apps.nexuslauncher/com.google.android.apps.nexuslauncher.NexusLauncherActivity#2",
            ),
            Layer::new(3, NO_PARENT, "Task=3"),
        ]);
        let home = transition(
            1,
            TransitionType::ToFront,
            (10, 20),
            vec![change(TransitionType::ToBack, 3), change(TransitionType::ToFront, 1)],
        );
        let other = transition(
            2,
            TransitionType::ToFront,
            (30, 40),
            vec![change(TransitionType::ToBack, 1), change(TransitionType::ToFront, 3)],
        );
        let kept = close_app_to_launcher(vec![home, other], &cuj(0, 100), &reader).unwrap();
        assert_eq!(kept.len(), 1, "only the switch to the launcher task");
        assert_eq!(kept[0].id(), 1, "home transition");
        assert_eq!(
            close_app_to_launcher(Vec::new(), &cuj(0, 1), &TraceReader::new()),
            Err(ExtractionError::MissingTrace("layers")),
            "needs layers"
        );
    }

    fn quick_switch_halves() -> (Transition, Transition) {
        let first = transition(
            1,
            TransitionType::ToFront,
            (10, 20),
            vec![change(TransitionType::ToBack, 5), change(TransitionType::ToFront, 9)],
        );
        let second = transition(
            2,
            TransitionType::ToFront,
            (25, 40),
            vec![change(TransitionType::ToBack, 9), change(TransitionType::ToFront, 6)],
        );
        (first, second)
    }

    #[test]
    fn quick_switch_merge_combines_halves() {
        let (first, second) = quick_switch_halves();
        let merged =
            quick_switch_merge(
                vec![first.clone(), second],
                &cuj(0, 100),
                &TraceReader::new(),
            )
            .unwrap();
        assert_eq!(merged.len(), 1, "one transition");
        let t = &merged[0];
        assert_eq!(t.id(), 1, "first id");
        assert_eq!(t.create_time(), first.create_time(), "first creation");
        assert_eq!(t.send_time(), first.send_time(), "first send");
        assert_eq!(t.finish_time(), first.finish_time(), "first finish");
        assert_eq!(
            t.changes(),
            &[change(TransitionType::ToBack, 5), change(TransitionType::ToFront, 6)],
            "closing of first, opening of second"
        );
    }

    #[test]
    fn quick_switch_merge_checks_preconditions() {
        let (first, _) = quick_switch_halves();
        let unrelated = transition(
            2,
            TransitionType::ToFront,
            (25, 40),
            vec![change(TransitionType::ToBack, 7), change(TransitionType::ToFront, 6)],
        );
        let err = quick_switch_merge(
            vec![first.clone(), unrelated],
            &cuj(0, 100),
            &TraceReader::new(),
        )
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Precondition(_)), "layer mismatch: {err}");

        let three = transition(
            3,
            TransitionType::Open,
            (50, 60),
            vec![change(TransitionType::Open, 1)],
        );
        let err = quick_switch_merge(vec![first.clone(), three], &cuj(0, 100), &TraceReader::new())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Precondition(_)), "change count: {err}");

        let single = quick_switch_merge(vec![first], &cuj(0, 100), &TraceReader::new()).unwrap();
        assert_eq!(single.len(), 1, "single transition passes through");
    }

    #[test]
    fn splitscreen_classification() {
        let resize = transition(
            1,
            TransitionType::Change,
            (0, 1),
            vec![change(TransitionType::Change, 1), change(TransitionType::Change, 2)],
        );
        assert!(is_splitscreen_resize(&resize), "two changing apps");
        let not_resize = transition(
            2,
            TransitionType::Change,
            (0, 1),
            vec![change(TransitionType::Change, 1)],
        );
        assert!(!is_splitscreen_resize(&not_resize), "one change only");
        let exit = transition(3, TransitionType::SplitDismissSnap, (0, 1), Vec::new());
        assert!(is_splitscreen_exit(&exit), "dismiss snap exits");
        assert!(!is_splitscreen_enter(&exit), "no split handler");
    }

    #[test]
    fn cuj_range() {
        let inside = transition(1, TransitionType::Open, (10, 20), Vec::new());
        let spanning = transition(2, TransitionType::Open, (0, 50), Vec::new());
        let outside = transition(3, TransitionType::Open, (60, 70), Vec::new());
        let kept = in_cuj_range(
            vec![inside, spanning, outside],
            &cuj(5, 30),
            &TraceReader::new(),
        )
        .unwrap();
        let ids: Vec<i32> = kept.iter().map(Transition::id).collect();
        assert_eq!(ids, vec![1, 2], "created inside, or journey starts while playing");
    }

    #[test]
    fn permission_dialog_is_dropped() {
        let reader = reader_with(vec![
            Layer::new(
                1,
                NO_PARENT,
                "com.android.permissioncontroller/.GrantPermissionsActivity#1",
            ),
            Layer::new(2, NO_PARENT, "com.app/.Main#2"),
        ]);
        let dialog = transition(
            1,
            TransitionType::Open,
            (10, 20),
            vec![change(TransitionType::Open, 1)],
        );
        let app = transition(
            2,
            TransitionType::Open,
            (10, 20),
            vec![change(TransitionType::Open, 2)],
        );
        let kept = permission_dialog(vec![dialog, app], &cuj(0, 100), &reader).unwrap();
        assert_eq!(kept.len(), 1, "dialog dropped");
        assert_eq!(kept[0].id(), 2, "app kept");
    }

    #[test]
    fn trampoline_keeps_first_transition() {
        let reader = reader_with(vec![
            Layer::new(1, NO_PARENT, "Task=1"),
            Layer::new(2, 1, "com.app/.Trampoline#2"),
            Layer::new(3, 1, "com.app/.Target#3"),
        ]);
        let open_task = transition(
            1,
            TransitionType::Open,
            (10, 20),
            vec![change(TransitionType::Open, 1)],
        );
        let bounce = transition(
            2,
            TransitionType::Open,
            (21, 30),
            vec![change(TransitionType::Close, 2), change(TransitionType::Open, 3)],
        );
        let kept = merge_trampoline(vec![open_task, bounce], &cuj(0, 100), &reader).unwrap();
        assert_eq!(kept.len(), 1, "bounce removed");
        assert_eq!(kept[0].id(), 1, "task launch kept");

        let many = (1..=3)
            .map(|id| transition(id, TransitionType::Open, (id.into(), 50), Vec::new()))
            .collect();
        assert!(
            merge_trampoline(many, &cuj(0, 100), &reader).is_err(),
            "more than two transitions"
        );
    }
}
