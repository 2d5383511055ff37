// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shell transitions.
//!
//! A [`Transition`] is assembled from two partial records that arrive
//! independently: the window-manager side ([`WmTransitionData`]: creation,
//! send, finish, type and changes) and the shell side
//! ([`ShellTransitionData`]: dispatch, merge and the handler that played it).
//! Partial records with the same id are combined with [`Transition::merge`],
//! where every field takes the value of the later record if it has one.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::time::Timestamp;
use crate::trace::TraceEntry;

coded_enum! {
    /// The kind of a transition, or the transit mode of one of its changes.
    pub enum TransitionType {
        Undefined = -1 => "UNDEFINED",
        None = 0 => "NONE",
        Open = 1 => "OPEN",
        Close = 2 => "CLOSE",
        ToFront = 3 => "TO_FRONT",
        ToBack = 4 => "TO_BACK",
        Relaunch = 5 => "RELAUNCH",
        Change = 6 => "CHANGE",
        KeyguardGoingAway = 7 => "KEYGUARD_GOING_AWAY",
        KeyguardOcclude = 8 => "KEYGUARD_OCCLUDE",
        KeyguardUnocclude = 9 => "KEYGUARD_UNOCCLUDE",
        Pip = 10 => "PIP",
        Wake = 11 => "WAKE",
        Sleep = 12 => "SLEEP",
        FirstCustom = 1000 => "FIRST_CUSTOM",
        ExitPip = 1001 => "EXIT_PIP",
        ExitPipToSplit = 1002 => "EXIT_PIP_TO_SPLIT",
        RemovePip = 1003 => "REMOVE_PIP",
        SplitScreenPairOpen = 1004 => "SPLIT_SCREEN_PAIR_OPEN",
        SplitScreenOpenToSide = 1005 => "SPLIT_SCREEN_OPEN_TO_SIDE",
        SplitDismissSnap = 1007 => "SPLIT_DISMISS_SNAP",
        SplitDismiss = 1008 => "SPLIT_DISMISS",
        Maximize = 1009 => "MAXIMIZE",
        RestoreFromMaximize = 1010 => "RESTORE_FROM_MAXIMIZE",
    }
}

impl TransitionType {
    /// Returns `true` for OPEN and TO_FRONT.
    #[must_use]
    pub const fn is_opening(self) -> bool {
        matches!(self, Self::Open | Self::ToFront)
    }

    /// Returns `true` for CLOSE and TO_BACK.
    #[must_use]
    pub const fn is_closing(self) -> bool {
        matches!(self, Self::Close | Self::ToBack)
    }
}

coded_enum! {
    /// The shell component that played a transition.
    pub enum TransitionHandler {
        Unknown = -1 => "UNKNOWN",
        Default = 0 => "DEFAULT",
        OneShot = 1 => "ONESHOT",
        Recents = 2 => "RECENTS",
        SplitScreen = 3 => "SPLIT_SCREEN",
        Pip = 4 => "PIP",
        Mixed = 5 => "MIXED",
        Keyguard = 6 => "KEYGUARD",
        Freeform = 7 => "FREEFORM",
        Unfold = 8 => "UNFOLD",
    }
}

/// One window taking part in a transition.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionChange {
    /// What happens to the window.
    pub transit_mode: TransitionType,
    /// Id of the window's layer.
    pub layer_id: i32,
    /// Token of the window container.
    pub window_id: i32,
}

impl TransitionChange {
    /// Creates a change.
    #[must_use]
    pub const fn new(transit_mode: TransitionType, layer_id: i32, window_id: i32) -> Self {
        Self {
            transit_mode,
            layer_id,
            window_id,
        }
    }
}

impl fmt::Debug for TransitionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(layer={}, window={:x})",
            self.transit_mode, self.layer_id, self.window_id
        )
    }
}

/// Window-manager side of a transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WmTransitionData {
    /// When the transition was created.
    pub create_time: Option<Timestamp>,
    /// When it was sent to the shell.
    pub send_time: Option<Timestamp>,
    /// When it was aborted by the window manager.
    pub abort_time: Option<Timestamp>,
    /// When it finished playing.
    pub finish_time: Option<Timestamp>,
    /// Start transaction id.
    pub start_transaction_id: Option<u64>,
    /// Finish transaction id.
    pub finish_transaction_id: Option<u64>,
    /// Transition type.
    pub transition_type: Option<TransitionType>,
    /// Participating windows.
    pub changes: Option<Vec<TransitionChange>>,
}

impl WmTransitionData {
    /// Combines two partial records, `later` winning on every field it sets.
    #[must_use]
    pub fn merge(&self, later: &Self) -> Self {
        Self {
            create_time: later.create_time.or(self.create_time),
            send_time: later.send_time.or(self.send_time),
            abort_time: later.abort_time.or(self.abort_time),
            finish_time: later.finish_time.or(self.finish_time),
            start_transaction_id: later.start_transaction_id.or(self.start_transaction_id),
            finish_transaction_id: later.finish_transaction_id.or(self.finish_transaction_id),
            transition_type: later.transition_type.or(self.transition_type),
            changes: later.changes.clone().or_else(|| self.changes.clone()),
        }
    }
}

/// Shell side of a transition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShellTransitionData {
    /// When the shell started playing it.
    pub dispatch_time: Option<Timestamp>,
    /// When the shell asked to merge it into another transition.
    pub merge_request_time: Option<Timestamp>,
    /// When it was merged.
    pub merge_time: Option<Timestamp>,
    /// When the shell aborted it.
    pub abort_time: Option<Timestamp>,
    /// Which handler played it.
    pub handler: Option<TransitionHandler>,
    /// Id of the transition it was merged into.
    pub merged_into: Option<i32>,
}

impl ShellTransitionData {
    /// Combines two partial records, `later` winning on every field it sets.
    #[must_use]
    pub fn merge(&self, later: &Self) -> Self {
        Self {
            dispatch_time: later.dispatch_time.or(self.dispatch_time),
            merge_request_time: later.merge_request_time.or(self.merge_request_time),
            merge_time: later.merge_time.or(self.merge_time),
            abort_time: later.abort_time.or(self.abort_time),
            handler: later.handler.or(self.handler),
            merged_into: later.merged_into.or(self.merged_into),
        }
    }
}

/// A transition assembled from its window-manager and shell records.
#[derive(Clone, PartialEq)]
pub struct Transition {
    id: i32,
    wm: WmTransitionData,
    shell: ShellTransitionData,
    timestamp: Timestamp,
}

impl Transition {
    /// Assembles a transition.
    ///
    /// # Errors
    ///
    /// [`Error::MissingTimestamp`] if neither record carries a timestamp.
    pub fn new(id: i32, wm: WmTransitionData, shell: ShellTransitionData) -> Result<Self> {
        let timestamp = wm
            .create_time
            .or(wm.send_time)
            .or(shell.dispatch_time)
            .or(shell.merge_request_time)
            .or(shell.merge_time)
            .or(shell.abort_time)
            .or(wm.finish_time)
            .or(wm.abort_time)
            .ok_or(Error::MissingTimestamp(id))?;
        Ok(Self {
            id,
            wm,
            shell,
            timestamp,
        })
    }

    /// Transition id, shared by its partial records.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Window-manager record.
    #[must_use]
    pub fn wm_data(&self) -> &WmTransitionData {
        &self.wm
    }

    /// Shell record.
    #[must_use]
    pub fn shell_data(&self) -> &ShellTransitionData {
        &self.shell
    }

    /// Creation time, [`Timestamp::MIN`] if unknown.
    #[must_use]
    pub fn create_time(&self) -> Timestamp {
        self.wm.create_time.unwrap_or(Timestamp::MIN)
    }

    /// Send time, [`Timestamp::MIN`] if unknown.
    #[must_use]
    pub fn send_time(&self) -> Timestamp {
        self.wm.send_time.unwrap_or(Timestamp::MIN)
    }

    /// Dispatch time, [`Timestamp::MIN`] if unknown.
    #[must_use]
    pub fn dispatch_time(&self) -> Timestamp {
        self.shell.dispatch_time.unwrap_or(Timestamp::MIN)
    }

    /// Finish time, falling back to the abort time, then [`Timestamp::MAX`].
    #[must_use]
    pub fn finish_time(&self) -> Timestamp {
        self.wm
            .finish_time
            .or(self.wm.abort_time)
            .unwrap_or(Timestamp::MAX)
    }

    /// Window-manager abort time.
    #[must_use]
    pub fn abort_time(&self) -> Option<Timestamp> {
        self.wm.abort_time
    }

    /// Shell merge-request time.
    #[must_use]
    pub fn merge_request_time(&self) -> Option<Timestamp> {
        self.shell.merge_request_time
    }

    /// Shell merge time.
    #[must_use]
    pub fn merge_time(&self) -> Option<Timestamp> {
        self.shell.merge_time
    }

    /// Shell abort time.
    #[must_use]
    pub fn shell_abort_time(&self) -> Option<Timestamp> {
        self.shell.abort_time
    }

    /// Start transaction id, `-1` if unknown.
    #[must_use]
    pub fn start_transaction_id(&self) -> i64 {
        self.wm
            .start_transaction_id
            .and_then(|id| i64::try_from(id).ok())
            .unwrap_or(-1)
    }

    /// Finish transaction id, `-1` if unknown.
    #[must_use]
    pub fn finish_transaction_id(&self) -> i64 {
        self.wm
            .finish_transaction_id
            .and_then(|id| i64::try_from(id).ok())
            .unwrap_or(-1)
    }

    /// Transition type, [`TransitionType::Undefined`] if unknown.
    #[must_use]
    pub fn transition_type(&self) -> TransitionType {
        self.wm.transition_type.unwrap_or(TransitionType::Undefined)
    }

    /// Participating windows.
    #[must_use]
    pub fn changes(&self) -> &[TransitionChange] {
        self.wm.changes.as_deref().unwrap_or(&[])
    }

    /// Handler that played the transition.
    #[must_use]
    pub fn handler(&self) -> Option<TransitionHandler> {
        self.shell.handler
    }

    /// Id of the transition this one was merged into.
    #[must_use]
    pub fn merged_into(&self) -> Option<i32> {
        self.shell.merged_into
    }

    /// Returns `true` once the window manager reported the finish.
    #[must_use]
    pub fn played(&self) -> bool {
        self.wm.finish_time.is_some()
    }

    /// Returns `true` if either side aborted the transition.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.wm.abort_time.is_some() || self.shell.abort_time.is_some()
    }

    /// Returns `true` if the transition never finished or was aborted.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        !self.played() || self.aborted()
    }

    /// Combines this record with a later one for the same transition.
    ///
    /// # Errors
    ///
    /// [`Error::MismatchedTransitionIds`] if the ids differ.
    pub fn merge(&self, later: &Self) -> Result<Self> {
        if self.id != later.id {
            return Err(Error::MismatchedTransitionIds {
                left: self.id,
                right: later.id,
            });
        }
        Self::new(
            self.id,
            self.wm.merge(&later.wm),
            self.shell.merge(&later.shell),
        )
    }
}

impl TraceEntry for Transition {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.id)
            .field("type", &self.transition_type())
            .field("played", &self.played())
            .field("aborted", &self.aborted())
            .field("create_time", &self.create_time())
            .field("send_time", &self.send_time())
            .field("finish_time", &self.finish_time())
            .field("handler", &self.handler())
            .field("changes", &self.changes())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transition#{}({})", self.id, self.transition_type())
    }
}

/// All transitions recorded during a run, ordered by first timestamp.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionsTrace {
    entries: Vec<Transition>,
}

impl TransitionsTrace {
    /// Builds a trace, sorting transitions by first timestamp.
    #[must_use]
    pub fn new(mut entries: Vec<Transition>) -> Self {
        entries.sort_by_key(|t| t.timestamp);
        Self { entries }
    }

    /// Merges partial records sharing an id, in arrival order.
    ///
    /// # Errors
    ///
    /// Propagates [`Transition::merge`] failures.
    pub fn merge_partial_transitions(partials: Vec<Transition>) -> Result<Self> {
        let mut merged: BTreeMap<i32, Transition> = BTreeMap::new();
        for t in partials {
            let combined = match merged.remove(&t.id) {
                Some(prev) => prev.merge(&t)?,
                None => t,
            };
            merged.insert(combined.id, combined);
        }
        Ok(Self::new(merged.into_values().collect()))
    }

    /// Transitions in timestamp order.
    #[must_use]
    pub fn entries(&self) -> &[Transition] {
        &self.entries
    }

    /// Looks up a transition by id.
    #[must_use]
    pub fn by_id(&self, id: i32) -> Option<&Transition> {
        self.entries.iter().find(|t| t.id == id)
    }

    /// Transitions whose lifetime overlaps `[start, end]`.
    #[must_use]
    pub fn slice(&self, start: Timestamp, end: Timestamp) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|t| t.timestamp <= end && t.finish_time() >= start)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use proptest::prelude::*;

    fn ts(n: i64) -> Timestamp {
        Timestamp::from_elapsed(n)
    }

    fn wm(create: Option<i64>, finish: Option<i64>) -> WmTransitionData {
        WmTransitionData {
            create_time: create.map(ts),
            finish_time: finish.map(ts),
            ..WmTransitionData::default()
        }
    }

    #[test]
    fn requires_a_timestamp() {
        let err = Transition::new(1, WmTransitionData::default(), ShellTransitionData::default())
            .unwrap_err();
        assert_eq!(err, Error::MissingTimestamp(1), "no timestamp at all");
    }

    #[test]
    fn defaults_for_missing_fields() {
        let t = Transition::new(
            1,
            WmTransitionData::default(),
            ShellTransitionData {
                dispatch_time: Some(ts(5)),
                ..ShellTransitionData::default()
            },
        )
        .unwrap();
        assert_eq!(t.timestamp(), ts(5), "dispatch is the first timestamp");
        assert!(t.create_time().is_min(), "create defaults to min");
        assert!(t.finish_time().is_max(), "finish defaults to max");
        assert_eq!(t.start_transaction_id(), -1, "unknown transaction");
        assert_eq!(t.transition_type(), TransitionType::Undefined, "unknown type");
        assert!(t.changes().is_empty(), "no changes");
        assert!(t.is_incomplete(), "never played");
    }

    #[test]
    fn finish_falls_back_to_abort() {
        let t = Transition::new(
            1,
            WmTransitionData {
                create_time: Some(ts(1)),
                abort_time: Some(ts(9)),
                ..WmTransitionData::default()
            },
            ShellTransitionData::default(),
        )
        .unwrap();
        assert_eq!(t.finish_time(), ts(9), "abort used as finish");
        assert!(t.aborted() && t.is_incomplete(), "aborted is incomplete");
    }

    #[test]
    fn merge_takes_later_values() {
        let a = Transition::new(7, wm(Some(1), None), ShellTransitionData::default()).unwrap();
        let b = Transition::new(
            7,
            WmTransitionData {
                finish_time: Some(ts(10)),
                changes: Some(vec![TransitionChange::new(TransitionType::Open, 3, 4)]),
                ..WmTransitionData::default()
            },
            ShellTransitionData {
                handler: Some(TransitionHandler::Default),
                ..ShellTransitionData::default()
            },
        )
        .unwrap();
        let m = a.merge(&b).unwrap();
        assert_eq!(m.create_time(), ts(1), "kept from earlier");
        assert_eq!(m.finish_time(), ts(10), "taken from later");
        assert_eq!(m.changes().len(), 1, "changes from later");
        assert_eq!(m.handler(), Some(TransitionHandler::Default), "handler");
        assert!(!m.is_incomplete(), "played");
    }

    #[test]
    fn merge_rejects_mismatched_ids() {
        let a = Transition::new(1, wm(Some(1), None), ShellTransitionData::default()).unwrap();
        let b = Transition::new(2, wm(Some(2), None), ShellTransitionData::default()).unwrap();
        assert_eq!(
            a.merge(&b).unwrap_err(),
            Error::MismatchedTransitionIds { left: 1, right: 2 },
            "ids must match"
        );
    }

    #[test]
    fn partial_transitions_are_grouped_by_id() {
        let partials = vec![
            Transition::new(2, wm(Some(20), None), ShellTransitionData::default()).unwrap(),
            Transition::new(1, wm(Some(10), None), ShellTransitionData::default()).unwrap(),
            Transition::new(2, wm(None, Some(30)), ShellTransitionData::default()).unwrap(),
        ];
        let trace = TransitionsTrace::merge_partial_transitions(partials).unwrap();
        assert_eq!(trace.entries().len(), 2, "two ids");
        assert_eq!(trace.entries()[0].id(), 1, "ordered by timestamp");
        assert_eq!(trace.by_id(2).unwrap().finish_time(), ts(30), "merged finish");
    }

    #[test]
    fn latest_partial_wins() {
        let shell = |handler, merged_into| ShellTransitionData {
            handler: Some(handler),
            merged_into: Some(merged_into),
            ..ShellTransitionData::default()
        };
        let record = |tx, handler, merged_into| {
            let wm = WmTransitionData {
                create_time: Some(ts(1)),
                start_transaction_id: Some(tx),
                ..WmTransitionData::default()
            };
            Transition::new(4, wm, shell(handler, merged_into)).unwrap()
        };
        let partials = vec![
            record(10, TransitionHandler::Default, 1),
            record(11, TransitionHandler::Pip, 2),
            record(12, TransitionHandler::SplitScreen, 3),
        ];
        let trace = TransitionsTrace::merge_partial_transitions(partials).unwrap();
        let t = trace.by_id(4).unwrap();
        assert_eq!(t.start_transaction_id(), 12, "last transaction");
        assert_eq!(t.handler(), Some(TransitionHandler::SplitScreen), "last handler");
        assert_eq!(t.merged_into(), Some(3), "last merge target");
    }

    #[test]
    fn codes_round_trip() {
        for t in TransitionType::ALL {
            assert_eq!(TransitionType::from_code(t.code()), Some(*t), "{t}");
        }
        assert_eq!(TransitionType::SplitDismissSnap.name(), "SPLIT_DISMISS_SNAP");
    }

    fn arb_time() -> impl Strategy<Value = Option<Timestamp>> {
        proptest::option::of((1..1000_i64).prop_map(Timestamp::from_elapsed))
    }

    fn arb_change() -> impl Strategy<Value = TransitionChange> {
        (
            proptest::sample::select(TransitionType::ALL),
            0..50_i32,
            0..50_i32,
        )
            .prop_map(|(mode, layer, window)| TransitionChange::new(mode, layer, window))
    }

    fn arb_wm() -> impl Strategy<Value = WmTransitionData> {
        (
            (arb_time(), arb_time(), arb_time(), arb_time()),
            proptest::option::of(0..100_u64),
            proptest::option::of(0..100_u64),
            proptest::option::of(proptest::sample::select(TransitionType::ALL)),
            proptest::option::of(proptest::collection::vec(arb_change(), 0..3)),
        )
            .prop_map(|((create, send, abort, finish), start_tx, finish_tx, kind, changes)| {
                WmTransitionData {
                    create_time: create,
                    send_time: send,
                    abort_time: abort,
                    finish_time: finish,
                    start_transaction_id: start_tx,
                    finish_transaction_id: finish_tx,
                    transition_type: kind,
                    changes,
                }
            })
    }

    fn arb_shell() -> impl Strategy<Value = ShellTransitionData> {
        (
            (arb_time(), arb_time(), arb_time(), arb_time()),
            proptest::option::of(proptest::sample::select(TransitionHandler::ALL)),
            proptest::option::of(0..10_i32),
        )
            .prop_map(|((dispatch, merge_request, merge, abort), handler, merged_into)| {
                ShellTransitionData {
                    dispatch_time: dispatch,
                    merge_request_time: merge_request,
                    merge_time: merge,
                    abort_time: abort,
                    handler,
                    merged_into,
                }
            })
    }

    fn arb_partial() -> impl Strategy<Value = Transition> {
        (arb_wm(), arb_shell())
            .prop_filter_map("a partial needs a timestamp", |(wm, shell)| {
                Transition::new(9, wm, shell).ok()
            })
    }

    proptest! {
        #[test]
        fn merge_is_associative(a in arb_partial(), b in arb_partial(), c in arb_partial()) {
            let left = a.merge(&b).unwrap().merge(&c).unwrap();
            let right = a.merge(&b.merge(&c).unwrap()).unwrap();
            prop_assert_eq!(left.wm_data(), right.wm_data());
            prop_assert_eq!(left.shell_data(), right.shell_data());
            prop_assert_eq!(left.timestamp(), right.timestamp());
            prop_assert_eq!(left, right);
        }
    }
}
