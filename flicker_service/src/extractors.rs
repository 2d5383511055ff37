// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenario extractors: finding the time windows a scenario occupies.

use std::fmt;

use flicker_core::cuj::{Cuj, CujType};
use flicker_core::reader::Reader;
use flicker_core::time::Timestamp;
use flicker_core::trace::TraceEntry;
use flicker_core::transition::Transition;

use crate::error::ExtractionError;
use crate::filters::{
    TransitionsTransform, in_cuj_range, merge_trampoline, no_op, permission_dialog,
};
use crate::instance::TraceSlice;

/// Finds the windows of a trace in which a scenario happens.
pub trait ScenarioExtractor: fmt::Debug + Send + Sync {
    /// Extracts the windows, ordered by start.
    ///
    /// # Errors
    ///
    /// Fails when a needed trace is missing or the trace does not have the
    /// shape the scenario expects.
    fn extract(&self, reader: &dyn Reader) -> Result<Vec<TraceSlice>, ExtractionError>;
}

// ---------------------------------------------------------------------------
// Entire trace
// ---------------------------------------------------------------------------

/// Yields one window covering everything that was captured.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntireTraceExtractor;

impl ScenarioExtractor for EntireTraceExtractor {
    fn extract(&self, reader: &dyn Reader) -> Result<Vec<TraceSlice>, ExtractionError> {
        let wm = reader.read_wm_trace().filter(|t| !t.is_empty());
        let layers = reader.read_layers_trace().filter(|t| !t.is_empty());
        let bounds = [
            wm.map(|t| (t.start(), t.end())),
            layers.map(|t| (t.start(), t.end())),
        ];
        let mut present = bounds.into_iter().flatten();
        let (mut start, mut end) = present.next().ok_or(ExtractionError::MissingTrace("layers"))?;
        for (s, e) in present {
            start = start.min(s);
            end = end.max(e);
        }
        Ok(vec![TraceSlice {
            start,
            end,
            associated_transition: None,
            associated_cuj: None,
        }])
    }
}

// ---------------------------------------------------------------------------
// Transition matching
// ---------------------------------------------------------------------------

/// Associates a journey with the transition that played it.
///
/// Complete transitions go through the main transform, then the journey
/// range, permission dialog and trampoline stages, then the final transform.
#[derive(Clone, Copy, Debug)]
pub struct TransitionMatcher {
    main_transform: TransitionsTransform,
    final_transform: TransitionsTransform,
    associated_transition_required: bool,
}

impl TransitionMatcher {
    /// A matcher requiring exactly one transition to survive `main_transform`.
    #[must_use]
    pub const fn new(main_transform: TransitionsTransform) -> Self {
        Self {
            main_transform,
            final_transform: no_op,
            associated_transition_required: true,
        }
    }

    /// Applies `final_transform` after the built-in stages.
    #[must_use]
    pub const fn with_final_transform(mut self, final_transform: TransitionsTransform) -> Self {
        self.final_transform = final_transform;
        self
    }

    /// Accepts journeys with no matching transition.
    #[must_use]
    pub const fn transition_optional(mut self) -> Self {
        self.associated_transition_required = false;
        self
    }

    /// Returns `true` if a journey without transition fails extraction.
    #[must_use]
    pub const fn associated_transition_required(&self) -> bool {
        self.associated_transition_required
    }

    /// Finds the transition for `cuj`.
    ///
    /// # Errors
    ///
    /// When a transition is required: [`ExtractionError::MissingTrace`]
    /// without a transitions trace, [`ExtractionError::NoAssociatedTransition`]
    /// if a stage leaves nothing and [`ExtractionError::TooManyTransitions`] if
    /// more than one transition survives. Stage errors are propagated either
    /// way.
    pub fn match_transition(
        &self,
        cuj: &Cuj,
        reader: &dyn Reader,
    ) -> Result<Option<Transition>, ExtractionError> {
        let required = self.associated_transition_required;
        let Some(trace) = reader.read_transitions_trace() else {
            return if required {
                Err(ExtractionError::MissingTrace("transitions"))
            } else {
                Ok(None)
            };
        };

        let mut transitions: Vec<Transition> = trace
            .entries()
            .iter()
            .filter(|t| !t.is_incomplete())
            .cloned()
            .collect();
        let nothing_left = || ExtractionError::NoAssociatedTransition(cuj.cuj.name().to_string());
        if required && transitions.is_empty() {
            return Err(nothing_left());
        }

        let stages: [TransitionsTransform; 5] = [
            self.main_transform,
            in_cuj_range,
            permission_dialog,
            merge_trampoline,
            self.final_transform,
        ];
        for stage in stages {
            transitions = stage(transitions, cuj, reader)?;
            if required && transitions.is_empty() {
                return Err(nothing_left());
            }
        }

        if required && transitions.len() > 1 {
            return Err(ExtractionError::TooManyTransitions {
                cuj: cuj.cuj.name().to_string(),
                count: transitions.len(),
            });
        }
        Ok(transitions.into_iter().next())
    }
}

// ---------------------------------------------------------------------------
// Journey tagged extraction
// ---------------------------------------------------------------------------

/// Rewrites a journey before it is matched, given the full traces.
pub type CujAdjustment = fn(Cuj, &dyn Reader) -> Result<Cuj, ExtractionError>;

/// Yields one window per journey of the target type.
///
/// Each window spans the journey and its associated transition, widened to
/// the window-manager snapshots surrounding the transition.
#[derive(Clone, Copy, Debug)]
pub struct TaggedScenarioExtractor {
    target: CujType,
    matcher: TransitionMatcher,
    adjust_cuj: Option<CujAdjustment>,
}

impl TaggedScenarioExtractor {
    /// Extracts `target` journeys, associating them through `matcher`.
    #[must_use]
    pub const fn new(target: CujType, matcher: TransitionMatcher) -> Self {
        Self {
            target,
            matcher,
            adjust_cuj: None,
        }
    }

    /// Rewrites every journey with `adjust` before matching.
    #[must_use]
    pub const fn with_cuj_adjustment(mut self, adjust: CujAdjustment) -> Self {
        self.adjust_cuj = Some(adjust);
        self
    }

    /// The journey type extracted.
    #[must_use]
    pub const fn target(&self) -> CujType {
        self.target
    }
}

impl ScenarioExtractor for TaggedScenarioExtractor {
    fn extract(&self, reader: &dyn Reader) -> Result<Vec<TraceSlice>, ExtractionError> {
        let cujs = reader
            .read_cuj_trace()
            .ok_or(ExtractionError::MissingTrace("cuj"))?;

        let mut slices = Vec::new();
        for cuj in cujs.entries().iter().filter(|c| c.cuj == self.target) {
            if cuj.canceled {
                tracing::debug!(cuj = %cuj.cuj, start = %cuj.start, "skipping canceled journey");
                continue;
            }
            let cuj = match self.adjust_cuj {
                Some(adjust) => adjust(cuj.clone(), reader)?,
                None => cuj.clone(),
            };
            let transition = self.matcher.match_transition(&cuj, reader)?;
            let (start, end) = match &transition {
                Some(t) => (
                    per_clock(cuj.start, transition_start(t, reader), i64::min),
                    per_clock(cuj.end, transition_end(t, reader), i64::max),
                ),
                None => (cuj.start, cuj.end),
            };
            slices.push(TraceSlice {
                start,
                end,
                associated_transition: transition,
                associated_cuj: Some(cuj),
            });
        }
        slices.sort_by_key(|s| s.start);
        Ok(slices)
    }
}

/// The window-manager snapshot preceding the transition's creation.
fn transition_start(transition: &Transition, reader: &dyn Reader) -> Timestamp {
    let created = transition.create_time();
    let snapshot = reader
        .read_wm_trace()
        .and_then(|wm| wm.entry_at_or_before(created))
        .map(TraceEntry::timestamp);
    snapshot.map_or(created, |s| fill_missing(s, created))
}

/// The window-manager snapshot following the transition's finish.
fn transition_end(transition: &Transition, reader: &dyn Reader) -> Timestamp {
    let finished = transition.finish_time();
    let snapshot = reader.read_wm_trace().and_then(|wm| {
        wm.entries()
            .iter()
            .map(TraceEntry::timestamp)
            .find(|ts| *ts >= finished)
    });
    snapshot.map_or(finished, |s| fill_missing(s, finished))
}

/// `primary`, with clocks it did not record taken from `fallback`.
fn fill_missing(primary: Timestamp, fallback: Timestamp) -> Timestamp {
    let pick = |p: i64, f: i64| if p == 0 { f } else { p };
    Timestamp::new(
        pick(primary.elapsed_nanos(), fallback.elapsed_nanos()),
        pick(primary.system_uptime_nanos(), fallback.system_uptime_nanos()),
        pick(primary.unix_nanos(), fallback.unix_nanos()),
    )
}

/// Combines two timestamps clock by clock. A clock recorded by only one side
/// is kept as is.
fn per_clock(a: Timestamp, b: Timestamp, combine: fn(i64, i64) -> i64) -> Timestamp {
    let clock = |x: i64, y: i64| match (x, y) {
        (0, v) | (v, 0) => v,
        (x, y) => combine(x, y),
    };
    Timestamp::new(
        clock(a.elapsed_nanos(), b.elapsed_nanos()),
        clock(a.system_uptime_nanos(), b.system_uptime_nanos()),
        clock(a.unix_nanos(), b.unix_nanos()),
    )
}

/// Widens a picture-in-picture journey to the enclosing close-to-home one.
///
/// Closing an app to picture-in-picture starts as a close to home, which
/// begins earlier than the nested picture-in-picture journey.
///
/// # Errors
///
/// [`ExtractionError::MissingTrace`] without a journey trace.
pub fn widen_to_close_to_home(cuj: Cuj, reader: &dyn Reader) -> Result<Cuj, ExtractionError> {
    let cujs = reader
        .read_cuj_trace()
        .ok_or(ExtractionError::MissingTrace("cuj"))?;
    let home = cujs.entries().iter().find(|c| {
        c.cuj == CujType::LauncherAppCloseToHome && c.start <= cuj.start && cuj.start <= c.end
    });
    Ok(match home {
        Some(home) => Cuj {
            start: home.start,
            ..cuj
        },
        None => cuj,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::cuj::CujTrace;
    use flicker_core::reader::TraceReader;
    use flicker_core::transition::{
        ShellTransitionData, TransitionChange, TransitionType, TransitionsTrace, WmTransitionData,
    };
    use flicker_core::wm::{WindowManagerState, WindowManagerTrace};

    use crate::filters::open_app;

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_elapsed(ms * 1_000_000)
    }

    fn cuj(kind: CujType, start: i64, end: i64) -> Cuj {
        Cuj {
            cuj: kind,
            start: ts(start),
            end: ts(end),
            canceled: false,
            tag: None,
        }
    }

    fn open(id: i32, create: i64, finish: Option<i64>) -> Transition {
        let wm = WmTransitionData {
            create_time: Some(ts(create)),
            send_time: Some(ts(create + 1)),
            finish_time: finish.map(ts),
            transition_type: Some(TransitionType::Open),
            changes: Some(vec![TransitionChange::new(TransitionType::ToFront, id, id)]),
            ..WmTransitionData::default()
        };
        Transition::new(id, wm, ShellTransitionData::default()).unwrap()
    }

    fn wm_trace(at: &[i64]) -> WindowManagerTrace {
        WindowManagerTrace::new(
            at.iter()
                .map(|ms| WindowManagerState::new(ts(*ms), Vec::new()).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn launch_reader(cujs: Vec<Cuj>, transitions: Vec<Transition>) -> TraceReader {
        TraceReader::new()
            .with_wm(wm_trace(&[0, 40, 90, 160, 300]))
            .with_cuj(CujTrace::new(cujs))
            .with_transitions(TransitionsTrace::new(transitions))
    }

    const LAUNCH: TaggedScenarioExtractor = TaggedScenarioExtractor::new(
        CujType::LauncherAppLaunchFromIcon,
        TransitionMatcher::new(open_app),
    );

    #[test]
    fn window_spans_journey_and_surrounding_snapshots() {
        let reader = launch_reader(
            vec![cuj(CujType::LauncherAppLaunchFromIcon, 50, 150)],
            vec![open(1, 60, Some(140))],
        );
        let slices = LAUNCH.extract(&reader).unwrap();
        assert_eq!(slices.len(), 1, "one journey");
        let slice = &slices[0];
        assert_eq!(slice.start, ts(40), "snapshot before creation");
        assert_eq!(slice.end, ts(160), "snapshot after finish");
        assert_eq!(slice.associated_transition.as_ref().map(Transition::id), Some(1), "matched");
    }

    #[test]
    fn canceled_journeys_are_skipped() {
        let mut canceled = cuj(CujType::LauncherAppLaunchFromIcon, 50, 150);
        canceled.canceled = true;
        let reader = launch_reader(vec![canceled], vec![open(1, 60, Some(140))]);
        assert_eq!(LAUNCH.extract(&reader).unwrap(), Vec::new(), "nothing extracted");
    }

    #[test]
    fn incomplete_transitions_are_not_matched() {
        let reader = launch_reader(
            vec![cuj(CujType::LauncherAppLaunchFromIcon, 50, 150)],
            vec![open(1, 60, Some(140)), open(2, 70, None)],
        );
        let slices = LAUNCH.extract(&reader).unwrap();
        assert_eq!(slices.len(), 1, "the incomplete one is ignored");
    }

    #[test]
    fn required_transition_must_be_unique() {
        let reader = launch_reader(
            vec![cuj(CujType::LauncherAppLaunchFromIcon, 50, 150)],
            vec![open(1, 60, Some(100)), open(2, 110, Some(140))],
        );
        assert_eq!(
            LAUNCH.extract(&reader),
            Err(ExtractionError::TooManyTransitions {
                cuj: String::from("CUJ_LAUNCHER_APP_LAUNCH_FROM_ICON"),
                count: 2,
            }),
            "two launches in one journey"
        );

        let reader = launch_reader(
            vec![cuj(CujType::LauncherAppLaunchFromIcon, 50, 150)],
            Vec::new(),
        );
        assert!(
            matches!(LAUNCH.extract(&reader), Err(ExtractionError::NoAssociatedTransition(_))),
            "no launch at all"
        );
    }

    #[test]
    fn optional_transition_falls_back_to_journey() {
        let extractor = TaggedScenarioExtractor::new(
            CujType::LauncherAppLaunchFromIcon,
            TransitionMatcher::new(open_app).transition_optional(),
        );
        let reader = launch_reader(
            vec![cuj(CujType::LauncherAppLaunchFromIcon, 50, 150)],
            Vec::new(),
        );
        let slices = extractor.extract(&reader).unwrap();
        assert_eq!((slices[0].start, slices[0].end), (ts(50), ts(150)), "journey bounds");
        assert!(slices[0].associated_transition.is_none(), "no transition");
    }

    #[test]
    fn missing_journey_trace_fails() {
        assert_eq!(
            LAUNCH.extract(&TraceReader::new()),
            Err(ExtractionError::MissingTrace("cuj")),
            "journeys are required"
        );
    }

    #[test]
    fn entire_trace_covers_all_snapshots() {
        let reader = TraceReader::new().with_wm(wm_trace(&[10, 20, 30]));
        let slices = EntireTraceExtractor.extract(&reader).unwrap();
        assert_eq!((slices[0].start, slices[0].end), (ts(10), ts(30)), "first to last");
        assert!(EntireTraceExtractor.extract(&TraceReader::new()).is_err(), "nothing captured");
    }

    #[test]
    fn pip_journey_is_widened() {
        let reader = TraceReader::new().with_cuj(CujTrace::new(vec![
            cuj(CujType::LauncherAppCloseToHome, 10, 100),
            cuj(CujType::LauncherAppCloseToPip, 30, 90),
        ]));
        let widened =
            widen_to_close_to_home(cuj(CujType::LauncherAppCloseToPip, 30, 90), &reader).unwrap();
        assert_eq!((widened.start, widened.end), (ts(10), ts(90)), "starts with the close to home");
    }

    #[test]
    fn per_clock_keeps_unshared_clocks() {
        let a = Timestamp::new(5, 0, 100);
        let b = Timestamp::new(3, 7, 0);
        assert_eq!(
            per_clock(a, b, i64::min),
            Timestamp::new(3, 7, 100),
            "min elapsed, others kept"
        );
    }
}
