// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Assertions over window-manager snapshots.

use std::collections::BTreeSet;
use std::fmt;

use flicker_core::component::{ComponentMatcher, SharedMatcher};
use flicker_core::geometry::Region;
use flicker_core::time::Timestamp;
use flicker_core::wm::{WindowContainer, WindowManagerState, WindowManagerTrace, WindowingMode};

use crate::FlickerSubject;
use crate::check::check;
use crate::error::{AssertionError, CheckResult, Fact};
use crate::region::{RegionInterner, RegionSubject};
use crate::trace::TraceSubject;

/// Assertions over one window-manager snapshot.
#[derive(Clone, Copy)]
pub struct WindowManagerStateSubject<'a> {
    state: &'a WindowManagerState,
    interner: Option<&'a dyn RegionInterner>,
}

impl fmt::Debug for WindowManagerStateSubject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowManagerStateSubject({})", self.state.timestamp())
    }
}

impl FlickerSubject for WindowManagerStateSubject<'_> {
    fn timestamp(&self) -> Timestamp {
        self.state.timestamp()
    }
}

impl<'a> WindowManagerStateSubject<'a> {
    /// Wraps a snapshot.
    #[must_use]
    pub fn new(state: &'a WindowManagerState) -> Self {
        Self {
            state,
            interner: None,
        }
    }

    /// Routes the regions this subject builds through `interner`.
    #[must_use]
    pub fn with_interner(self, interner: &'a dyn RegionInterner) -> Self {
        Self {
            interner: Some(interner),
            ..self
        }
    }

    /// The snapshot under test.
    #[must_use]
    pub fn state(&self) -> &'a WindowManagerState {
        self.state
    }

    fn app_windows(&self, matcher: &dyn ComponentMatcher) -> Vec<&'a WindowContainer> {
        matcher
            .matching_windows(self.state)
            .into_iter()
            .filter(|w| self.state.is_app_window(w))
            .collect()
    }

    fn non_app_windows(&self, matcher: &dyn ComponentMatcher) -> Vec<&'a WindowContainer> {
        matcher
            .matching_windows(self.state)
            .into_iter()
            .filter(|w| !self.state.is_app_window(w))
            .collect()
    }

    /// The focused window, found by title.
    #[must_use]
    pub fn focused_window(&self) -> Option<&'a WindowContainer> {
        let title = self.state.focused_window();
        if title.is_empty() {
            return None;
        }
        self.state.windows().find(|w| w.title == title)
    }

    /// Fails unless some window matches.
    pub fn contains(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        if !matcher.matching_windows(self.state).is_empty() {
            return Ok(self);
        }
        Err(self.missing(matcher))
    }

    /// Fails if any window or activity matches.
    pub fn not_contains(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        let windows = matcher.matching_windows(self.state);
        let activities = matcher.matching_activities(self.state);
        if windows.is_empty() && activities.is_empty() {
            return Ok(self);
        }
        Err(
            AssertionError::invalid_element(&matcher.to_window_identifier(), false)
                .at(self.timestamp())
                .with_facts(windows.iter().chain(&activities).map(|w| Fact::new("Found", w))),
        )
    }

    /// Fails unless an app window matches.
    pub fn contains_app_window(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        if !self.app_windows(matcher).is_empty() {
            return Ok(self);
        }
        Err(self.missing(matcher))
    }

    fn missing(&self, matcher: &dyn ComponentMatcher) -> AssertionError {
        AssertionError::invalid_element(&matcher.to_window_identifier(), true).at(self.timestamp())
    }

    fn visibility(
        &self,
        matcher: &dyn ComponentMatcher,
        candidates: &[&WindowContainer],
        expect_visible: bool,
    ) -> CheckResult<&Self> {
        let visible: Vec<&&WindowContainer> = candidates.iter().filter(|w| w.visible).collect();
        if visible.is_empty() != expect_visible {
            return Ok(self);
        }
        let err =
            AssertionError::incorrect_visibility(&matcher.to_window_identifier(), expect_visible)
                .at(self.timestamp());
        Err(if expect_visible {
            err.with_facts(candidates.iter().map(|w| Fact::new("Is invisible", w)))
        } else {
            err.with_facts(visible.iter().map(|w| Fact::new("Is visible", w)))
        })
    }

    /// Fails unless a matching app window exists and is visible.
    pub fn is_app_window_visible(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        self.contains_app_window(matcher)?;
        self.visibility(matcher, &self.app_windows(matcher), true)
    }

    /// Fails if a matching app window is visible.
    pub fn is_app_window_invisible(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        self.visibility(matcher, &self.app_windows(matcher), false)
    }

    /// Fails unless a matching non-app window exists and is visible.
    pub fn is_non_app_window_visible(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        let windows = self.non_app_windows(matcher);
        if windows.is_empty() {
            return Err(self.missing(matcher));
        }
        self.visibility(matcher, &windows, true)
    }

    /// Fails if a matching non-app window is visible.
    pub fn is_non_app_window_invisible(
        &self,
        matcher: &dyn ComponentMatcher,
    ) -> CheckResult<&Self> {
        self.visibility(matcher, &self.non_app_windows(matcher), false)
    }

    /// Fails unless the top-most visible app window matches.
    pub fn is_app_window_on_top(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        let top = self.state.top_visible_app_window();
        if top.is_some_and(|w| matcher.window_matches(self.state, w)) {
            return Ok(self);
        }
        Err(AssertionError::failed("App window not on top")
            .at(self.timestamp())
            .with_fact(Fact::new("Expected", matcher.to_window_identifier()))
            .with_fact(Fact::new(
                "Actual",
                top.map_or_else(|| String::from("<none>"), |w| w.title.clone()),
            )))
    }

    /// Fails if the top-most visible app window matches.
    pub fn is_app_window_not_on_top(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        let top = self.state.top_visible_app_window();
        match top {
            Some(w) if matcher.window_matches(self.state, w) => Err(AssertionError::failed(
                "App window on top",
            )
            .at(self.timestamp())
            .with_fact(Fact::new("Not expected", matcher.to_window_identifier()))
            .with_fact(Fact::new("Actual", &w.title))),
            _ => Ok(self),
        }
    }

    /// Fails unless a matching window is in picture-in-picture.
    pub fn is_pinned(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        self.contains(matcher)?;
        let pinned = matcher
            .matching_windows(self.state)
            .into_iter()
            .any(|w| self.state.effective_windowing_mode(w) == WindowingMode::Pinned);
        check("Windowing mode", pinned, self.timestamp())
            .with_fact(Fact::new("Window", matcher.to_window_identifier()))
            .is_equal(true)?;
        Ok(self)
    }

    /// Fails if a matching window is in picture-in-picture.
    pub fn is_not_pinned(&self, matcher: &dyn ComponentMatcher) -> CheckResult<&Self> {
        let pinned = matcher
            .matching_windows(self.state)
            .into_iter()
            .any(|w| self.state.effective_windowing_mode(w) == WindowingMode::Pinned);
        check("Windowing mode", pinned, self.timestamp())
            .with_fact(Fact::new("Window", matcher.to_window_identifier()))
            .is_equal(false)?;
        Ok(self)
    }

    /// Fails unless the keyguard is showing.
    pub fn is_keyguard_showing(&self) -> CheckResult<&Self> {
        check(
            "Keyguard showing",
            self.state.is_keyguard_showing(),
            self.timestamp(),
        )
        .is_equal(true)?;
        Ok(self)
    }

    /// Fails unless at most one window matches.
    pub fn has_at_most_one_window_matching(
        &self,
        matcher: &dyn ComponentMatcher,
    ) -> CheckResult<&Self> {
        let count = matcher.matching_windows(self.state).len();
        check("Number of windows", count, self.timestamp())
            .with_fact(Fact::new("Window", matcher.to_window_identifier()))
            .is_lower_or_equal(1)?;
        Ok(self)
    }

    /// The area covered by the visible windows matching `matcher`.
    ///
    /// # Errors
    ///
    /// Fails if no window matches.
    pub fn visible_region(&self, matcher: &dyn ComponentMatcher) -> CheckResult<RegionSubject> {
        let windows = matcher.matching_windows(self.state);
        if windows.is_empty() {
            return Err(self.missing(matcher));
        }
        let frames = windows.iter().filter(|w| w.visible).map(|w| w.frame);
        Ok(RegionSubject::interned(Region::from_rects(frames), self.timestamp(), self.interner))
    }
}

/// Assertions over a window-manager trace.
pub type WindowManagerTraceSubject<'a> = TraceSubject<WindowManagerStateSubject<'a>>;

impl<'a> TraceSubject<WindowManagerStateSubject<'a>> {
    /// Wraps every snapshot of `trace`.
    #[must_use]
    pub fn of_wm(trace: &'a WindowManagerTrace) -> Self {
        Self::from_subjects(trace.entries().iter().map(WindowManagerStateSubject::new).collect())
    }

    fn add_window_check(
        &mut self,
        name: &str,
        matcher: &SharedMatcher,
        optional: bool,
        f: fn(&WindowManagerStateSubject<'_>, &dyn ComponentMatcher) -> CheckResult,
    ) -> &mut Self {
        let m = SharedMatcher::clone(matcher);
        let name = format!("{name}({})", m.to_window_identifier());
        self.invoke(name, optional, move |s| f(s, m.as_ref()))
    }

    /// Registers "a matching window exists".
    pub fn contains(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("contains", matcher, false, |s, m| s.contains(m).map(drop))
    }

    /// Registers an optional "no matching window exists".
    pub fn not_contains_optional(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("notContains", matcher, true, |s, m| s.not_contains(m).map(drop))
    }

    /// Registers "no matching window exists".
    pub fn not_contains(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("notContains", matcher, false, |s, m| s.not_contains(m).map(drop))
    }

    /// Registers "a matching app window is visible".
    pub fn is_app_window_visible(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("isAppWindowVisible", matcher, false, |s, m| {
            s.is_app_window_visible(m).map(drop)
        })
    }

    /// Registers "no matching app window is visible".
    pub fn is_app_window_invisible(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("isAppWindowInvisible", matcher, false, |s, m| {
            s.is_app_window_invisible(m).map(drop)
        })
    }

    /// Registers an optional "no matching app window is visible".
    pub fn is_app_window_invisible_optional(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("isAppWindowInvisible", matcher, true, |s, m| {
            s.is_app_window_invisible(m).map(drop)
        })
    }

    /// Registers "the top visible app window matches".
    pub fn is_app_window_on_top(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("isAppWindowOnTop", matcher, false, |s, m| {
            s.is_app_window_on_top(m).map(drop)
        })
    }

    /// Registers "the top visible app window does not match".
    pub fn is_app_window_not_on_top(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("isAppWindowNotOnTop", matcher, false, |s, m| {
            s.is_app_window_not_on_top(m).map(drop)
        })
    }

    /// Registers "a matching window is pinned".
    pub fn is_pinned(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("isPinned", matcher, false, |s, m| s.is_pinned(m).map(drop))
    }

    /// Registers "no matching window is pinned".
    pub fn is_not_pinned(&mut self, matcher: &SharedMatcher) -> &mut Self {
        self.add_window_check("isNotPinned", matcher, false, |s, m| s.is_not_pinned(m).map(drop))
    }

    /// Fails if a visible window, other than those matched by `ignore`, is
    /// shown for a single entry.
    ///
    /// # Errors
    ///
    /// Names the first such window.
    pub fn visible_windows_shown_more_than_one_consecutive_entry(
        &self,
        ignore: &[SharedMatcher],
    ) -> CheckResult {
        self.visible_entries_shown_more_than_one_consecutive_time(|s| {
            let state = s.state();
            state
                .visible_windows()
                .filter(|w| !ignore.iter().any(|m| m.window_matches(state, w)))
                .map(|w| w.title.clone())
                .collect::<BTreeSet<String>>()
        })
    }

    /// Fails unless the focused window changes during the trace, ending on
    /// a window matched by `to` when given.
    ///
    /// # Errors
    ///
    /// Reports the first and last focused windows.
    pub fn focus_changes(&self, to: Option<&dyn ComponentMatcher>) -> CheckResult {
        let focus = |s: &WindowManagerStateSubject<'_>| s.state().focused_window().to_owned();
        let (Some(first), Some(last)) = (self.first(), self.last()) else {
            return Err(AssertionError::failed("No entries found"));
        };
        let changed = self
            .subjects()
            .windows(2)
            .any(|pair| focus(&pair[0]) != focus(&pair[1]));
        let ends_on_target = to.is_none_or(|m| {
            last.focused_window()
                .is_some_and(|w| m.window_matches(last.state(), w))
        });
        if changed && ends_on_target {
            return Ok(());
        }
        let mut err = AssertionError::failed("Focus did not change as expected")
            .at(last.timestamp())
            .with_fact(Fact::new("Initial focus", focus(first)))
            .with_fact(Fact::new("Final focus", focus(last)));
        if let Some(m) = to {
            err = err.with_fact(Fact::new("Expected focus", m.to_window_identifier()));
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_core::NO_PARENT;
    use flicker_core::component::{ComponentNameMatcher, FullComponentIdMatcher};
    use flicker_core::geometry::Rect;
    use flicker_core::wm::ContainerKind;
    use std::sync::Arc;

    const SCREEN: Rect = Rect::new(0, 0, 100, 200);

    fn state(at: i64, app_visible: bool, pinned: bool) -> WindowManagerState {
        let mut task = WindowContainer::new(ContainerKind::Task, 10, 1, "Task");
        if pinned {
            task = task.with_windowing_mode(WindowingMode::Pinned);
        }
        let mut app = WindowContainer::new(
            ContainerKind::Window,
            12,
            11,
            "com.app/com.app.Main",
        )
        .with_z(2);
        if app_visible {
            app = app.shown(SCREEN);
        }
        let focus = if app_visible { "com.app/com.app.Main" } else { "StatusBar" };
        WindowManagerState::new(
            Timestamp::from_elapsed(at),
            vec![
                WindowContainer::new(ContainerKind::Display, 1, NO_PARENT, "Display").shown(SCREEN),
                task,
                WindowContainer::new(ContainerKind::Activity, 11, 10, "com.app/.Main"),
                app,
                WindowContainer::new(ContainerKind::Window, 20, 1, "StatusBar")
                    .shown(SCREEN)
                    .with_z(5),
            ],
        )
        .unwrap()
        .with_focus("com.app/.Main", focus)
    }

    fn app() -> SharedMatcher {
        Arc::new(ComponentNameMatcher::new("com.app", "com.app.Main"))
    }

    #[test]
    fn app_window_checks() {
        let s = state(1, true, false);
        let subject = WindowManagerStateSubject::new(&s);
        assert!(subject.is_app_window_visible(app().as_ref()).is_ok(), "visible");
        assert!(subject.is_app_window_on_top(app().as_ref()).is_ok(), "on top");
        let bar: SharedMatcher = ComponentNameMatcher::STATUS_BAR.shared();
        assert!(subject.is_non_app_window_visible(bar.as_ref()).is_ok(), "bar is not an app");
        assert!(subject.contains_app_window(bar.as_ref()).is_err(), "bar has no activity");
        let region = subject.visible_region(app().as_ref()).unwrap();
        assert!(region.covers_exactly(&Region::from_rect(SCREEN)).is_ok(), "frame");
    }

    #[test]
    fn task_id_matcher_sees_nested_window() {
        let s = state(1, false, true);
        let subject = WindowManagerStateSubject::new(&s);
        let task = FullComponentIdMatcher::new(10, 0);
        assert!(subject.is_pinned(&task).is_ok(), "pinned through task");
        assert!(subject.is_app_window_invisible(&task).is_ok(), "hidden");
        assert!(subject.has_at_most_one_window_matching(&task).is_ok(), "one window");
    }

    #[test]
    fn becomes_visible_and_focus_changes() {
        let trace = WindowManagerTrace::new(vec![
            state(1, false, false),
            state(2, false, false),
            state(3, true, false),
        ])
        .unwrap();
        let mut subject = WindowManagerTraceSubject::of_wm(&trace);
        subject
            .is_app_window_invisible(&app())
            .then()
            .is_app_window_visible(&app());
        assert!(subject.for_all_entries().is_ok(), "invisible then visible");
        assert!(subject.focus_changes(Some(app().as_ref())).is_ok(), "focus moved to app");
        let bar = ComponentNameMatcher::STATUS_BAR.matcher();
        let err = subject.focus_changes(Some(&bar)).unwrap_err();
        assert_eq!(err.fact("Final focus"), Some("com.app/com.app.Main"), "ended on app");
    }
}
