// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The assertion template library.
//!
//! A template is a stateless, named check that knows which component roles it
//! needs. Evaluating it on a scenario instance resolves those roles and
//! registers closures on a [`FlickerTest`]; the closures run later against
//! the instance's subjects.

use std::fmt;
use std::sync::Arc;

use flicker_core::component::{self, ComponentMatcher, ComponentNameMatcher, SharedMatcher};
use flicker_core::geometry::{Rect, Region};
use flicker_core::layers::Layer;
use flicker_subject::{
    AssertionError, CheckResult, FlickerSubject, LayerTraceEntrySubject, RegionSubject,
};

use crate::components::{ComponentTemplate, SPLIT_SCREEN_DIVIDER};
use crate::error::FlickerError;
use crate::flicker_test::FlickerTest;
use crate::instance::ScenarioInstance;

/// A reusable verification unit.
///
/// Templates are compared by [`id`](Self::id) alone.
pub trait AssertionTemplate: fmt::Debug + Send + Sync {
    /// Stable identifier, unique within a scenario.
    fn id(&self) -> String;

    /// Registers this template's checks for `instance` on `test`.
    ///
    /// # Errors
    ///
    /// Fails when a component role cannot be resolved for the instance.
    fn evaluate(
        &self,
        instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError>;
}

impl PartialEq for dyn AssertionTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

// ---------------------------------------------------------------------------
// Component checks
// ---------------------------------------------------------------------------

/// Checks parameterized by a single component role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "variant names describe the check")]
pub enum ComponentCheck {
    AppLayerBecomesVisible,
    AppLayerBecomesInvisible,
    AppWindowBecomesVisible,
    AppWindowBecomesInvisible,
    AppWindowBecomesTopWindow,
    LayerBecomesVisible,
    LayerBecomesInvisible,
    AppLayerIsVisibleAtStart,
    AppLayerIsVisibleAtEnd,
    AppLayerIsInvisibleAtStart,
    AppLayerIsInvisibleAtEnd,
    AppWindowIsVisibleAtStart,
    AppWindowIsVisibleAtEnd,
    AppWindowIsInvisibleAtStart,
    AppWindowIsInvisibleAtEnd,
    AppWindowIsTopWindowAtStart,
    AppWindowOnTopAtStart,
    AppWindowOnTopAtEnd,
    AppLayerCoversFullScreenAtStart,
    AppLayerCoversFullScreenAtEnd,
    AppLayerIsVisibleAlways,
    AppWindowIsVisibleAlways,
    LayerReduces,
    WindowRemainInsideVisibleBounds,
    WindowBecomesPinned,
    HasAtMostOneWindowMatching,
}

impl ComponentCheck {
    /// Binds the check to a component role.
    #[must_use]
    pub const fn of(self, component: ComponentTemplate) -> ComponentAssertion {
        ComponentAssertion {
            check: self,
            component,
        }
    }
}

impl fmt::Display for ComponentCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A [`ComponentCheck`] bound to a role. Its id is `Check(ROLE)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentAssertion {
    check: ComponentCheck,
    component: ComponentTemplate,
}

impl ComponentAssertion {
    /// The check.
    #[must_use]
    pub const fn check(&self) -> ComponentCheck {
        self.check
    }

    /// The role checked.
    #[must_use]
    pub const fn component(&self) -> ComponentTemplate {
        self.component
    }
}

impl AssertionTemplate for ComponentAssertion {
    fn id(&self) -> String {
        format!("{}({})", self.check, self.component.name())
    }

    fn evaluate(
        &self,
        instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        use ComponentCheck as C;

        let c = instance.resolve(&self.component)?;
        let name = self.id();
        match self.check {
            C::AppLayerBecomesVisible => test.assert_layers(name, move |s| {
                s.not_contains_optional(&c)
                    .then()
                    .is_invisible_optional(&c)
                    .then()
                    .is_visible(&c);
                Ok(())
            }),
            C::AppLayerBecomesInvisible | C::LayerBecomesInvisible => {
                test.assert_layers(name, move |s| {
                    s.is_visible(&c).then().is_invisible(&c);
                    Ok(())
                });
            }
            C::LayerBecomesVisible => test.assert_layers(name, move |s| {
                s.is_invisible(&c).then().is_visible(&c);
                Ok(())
            }),
            C::AppWindowBecomesVisible => test.assert_wm(name, move |s| {
                s.not_contains_optional(&c)
                    .then()
                    .is_app_window_invisible_optional(&c)
                    .then()
                    .is_app_window_visible(&c);
                Ok(())
            }),
            C::AppWindowBecomesInvisible => test.assert_wm(name, move |s| {
                s.is_app_window_visible(&c).then().is_app_window_invisible(&c);
                Ok(())
            }),
            C::AppWindowBecomesTopWindow => test.assert_wm(name, move |s| {
                s.is_app_window_not_on_top(&c).then().is_app_window_on_top(&c);
                Ok(())
            }),
            C::AppLayerIsVisibleAtStart => {
                test.assert_layers_start(name, move |s| s.is_visible(c.as_ref()).map(drop));
            }
            C::AppLayerIsVisibleAtEnd => {
                test.assert_layers_end(name, move |s| s.is_visible(c.as_ref()).map(drop));
            }
            C::AppLayerIsInvisibleAtStart => {
                test.assert_layers_start(name, move |s| s.is_invisible(c.as_ref()).map(drop));
            }
            C::AppLayerIsInvisibleAtEnd => {
                test.assert_layers_end(name, move |s| s.is_invisible(c.as_ref()).map(drop));
            }
            C::AppWindowIsVisibleAtStart => test.assert_wm_start(name, move |s| {
                s.is_app_window_visible(c.as_ref()).map(drop)
            }),
            C::AppWindowIsVisibleAtEnd => test.assert_wm_end(name, move |s| {
                s.is_app_window_visible(c.as_ref()).map(drop)
            }),
            C::AppWindowIsInvisibleAtStart => test.assert_wm_start(name, move |s| {
                s.is_app_window_invisible(c.as_ref()).map(drop)
            }),
            C::AppWindowIsInvisibleAtEnd => test.assert_wm_end(name, move |s| {
                s.is_app_window_invisible(c.as_ref()).map(drop)
            }),
            C::AppWindowIsTopWindowAtStart | C::AppWindowOnTopAtStart => {
                test.assert_wm_start(name, move |s| s.is_app_window_on_top(c.as_ref()).map(drop));
            }
            C::AppWindowOnTopAtEnd => {
                test.assert_wm_end(name, move |s| s.is_app_window_on_top(c.as_ref()).map(drop));
            }
            C::AppLayerCoversFullScreenAtStart => {
                test.assert_layers_start(name, move |s| covers_full_screen(s, c.as_ref()));
            }
            C::AppLayerCoversFullScreenAtEnd => {
                test.assert_layers_end(name, move |s| covers_full_screen(s, c.as_ref()));
            }
            C::AppLayerIsVisibleAlways => test.assert_layers(name, move |s| {
                s.is_visible(&c);
                Ok(())
            }),
            C::AppWindowIsVisibleAlways => test.assert_wm(name, move |s| {
                s.is_app_window_visible(&c);
                Ok(())
            }),
            C::LayerReduces => test.assert_layers(name, move |s| {
                let m = c.as_ref();
                let regions = s
                    .subjects()
                    .iter()
                    .filter(|e| e.layer(m).is_some_and(Layer::is_visible))
                    .map(|e| e.visible_region(Some(m)))
                    .collect::<CheckResult<Vec<RegionSubject>>>()?;
                for pair in regions.windows(2) {
                    pair[1].not_bigger_than(pair[0].region())?;
                }
                Ok(())
            }),
            C::WindowRemainInsideVisibleBounds => test.assert_wm(name, move |s| {
                for state in s.subjects() {
                    let Some(display) = state.state().display_bounds() else {
                        continue;
                    };
                    state
                        .visible_region(c.as_ref())?
                        .covers_at_most(&Region::from(display))?;
                }
                Ok(())
            }),
            C::WindowBecomesPinned => test.assert_wm(name, move |s| {
                s.is_not_pinned(&c).then().is_pinned(&c);
                Ok(())
            }),
            C::HasAtMostOneWindowMatching => test.assert_wm(name, move |s| {
                for state in s.subjects() {
                    state.has_at_most_one_window_matching(c.as_ref())?;
                }
                Ok(())
            }),
        }
        Ok(())
    }
}

fn covers_full_screen(
    entry: &LayerTraceEntrySubject<'_>,
    component: &dyn ComponentMatcher,
) -> CheckResult {
    let display = entry
        .entry()
        .physical_display_bounds()
        .ok_or_else(|| AssertionError::failed("No display found").at(entry.timestamp()))?;
    entry
        .visible_region(Some(component))?
        .covers_exactly(&Region::from(display))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Trace-wide templates
// ---------------------------------------------------------------------------

const NOTIFICATION_SHADE: ComponentTemplate =
    ComponentTemplate::fixed("NotificationShade", ComponentNameMatcher::NOTIFICATION_SHADE);
const VOLUME_DIALOG: ComponentTemplate =
    ComponentTemplate::fixed("VolumeDialog", ComponentNameMatcher::VOLUME_DIALOG);

/// Every display that is on is covered by visible layers, in every entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntireScreenCoveredAlways;

impl AssertionTemplate for EntireScreenCoveredAlways {
    fn id(&self) -> String {
        String::from("EntireScreenCoveredAlways")
    }

    fn evaluate(
        &self,
        _instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        test.assert_layers(self.id(), |s| {
            for entry in s.subjects() {
                for display in entry.entry().displays().iter().filter(|d| d.is_on) {
                    entry
                        .visible_region(None)?
                        .covers_at_least(&Region::from(display.bounds))?;
                }
            }
            Ok(())
        });
        Ok(())
    }
}

fn resolve_all(
    instance: &ScenarioInstance,
    templates: &[ComponentTemplate],
) -> Result<Vec<SharedMatcher>, FlickerError> {
    templates
        .iter()
        .map(|t| instance.resolve(t).map_err(FlickerError::from))
        .collect()
}

/// No layer is visible for a single entry only.
///
/// Splash screens and snapshots are always ignored.
#[derive(Clone, Debug, Default)]
pub struct VisibleLayersShownMoreThanOneConsecutiveEntry {
    ignore: Vec<ComponentTemplate>,
}

impl VisibleLayersShownMoreThanOneConsecutiveEntry {
    /// Also ignores the given roles.
    #[must_use]
    pub fn ignoring(ignore: impl Into<Vec<ComponentTemplate>>) -> Self {
        Self { ignore: ignore.into() }
    }

    /// Ignores the notification shade and the volume dialog, which may
    /// show for one entry with only view level changes.
    #[must_use]
    pub fn ignoring_system_overlays() -> Self {
        Self::ignoring([NOTIFICATION_SHADE, VOLUME_DIALOG])
    }
}

impl AssertionTemplate for VisibleLayersShownMoreThanOneConsecutiveEntry {
    fn id(&self) -> String {
        String::from("VisibleLayersShownMoreThanOneConsecutiveEntry")
    }

    fn evaluate(
        &self,
        instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        let mut ignore = flicker_subject::transient_layers();
        ignore.extend(resolve_all(instance, &self.ignore)?);
        test.assert_layers(self.id(), move |s| {
            s.visible_layers_shown_more_than_one_consecutive_entry(&ignore)
        });
        Ok(())
    }
}

/// No window is visible for a single entry only.
#[derive(Clone, Debug, Default)]
pub struct VisibleWindowsShownMoreThanOneConsecutiveEntry {
    ignore: Vec<ComponentTemplate>,
}

impl VisibleWindowsShownMoreThanOneConsecutiveEntry {
    /// Ignores the given roles.
    #[must_use]
    pub fn ignoring(ignore: impl Into<Vec<ComponentTemplate>>) -> Self {
        Self { ignore: ignore.into() }
    }
}

impl AssertionTemplate for VisibleWindowsShownMoreThanOneConsecutiveEntry {
    fn id(&self) -> String {
        String::from("VisibleWindowsShownMoreThanOneConsecutiveEntry")
    }

    fn evaluate(
        &self,
        instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        let mut ignore: Vec<SharedMatcher> = vec![
            ComponentNameMatcher::SPLASH_SCREEN.shared(),
            ComponentNameMatcher::SNAPSHOT.shared(),
        ];
        ignore.extend(resolve_all(instance, &self.ignore)?);
        test.assert_wm(self.id(), move |s| {
            s.visible_windows_shown_more_than_one_consecutive_entry(&ignore)
        });
        Ok(())
    }
}

/// The keyguard is showing in the first window-manager entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScreenLockedAtStart;

impl AssertionTemplate for ScreenLockedAtStart {
    fn id(&self) -> String {
        String::from("ScreenLockedAtStart")
    }

    fn evaluate(
        &self,
        _instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        test.assert_wm_start(self.id(), |s| s.is_keyguard_showing().map(drop));
        Ok(())
    }
}

/// Focus moves during the instance, to `to` when given.
#[derive(Clone, Copy, Debug, Default)]
pub struct FocusChanges {
    to: Option<ComponentTemplate>,
}

impl FocusChanges {
    /// Focus changes to anything.
    #[must_use]
    pub const fn any() -> Self {
        Self { to: None }
    }

    /// Focus ends on `component`.
    #[must_use]
    pub const fn to(component: ComponentTemplate) -> Self {
        Self {
            to: Some(component),
        }
    }
}

impl AssertionTemplate for FocusChanges {
    fn id(&self) -> String {
        match self.to {
            Some(to) => format!("FocusChanges(to={})", to.name()),
            None => String::from("FocusChanges"),
        }
    }

    fn evaluate(
        &self,
        instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        let to = self.to.map(|t| instance.resolve(&t)).transpose()?;
        test.assert_wm(self.id(), move |s| s.focus_changes(to.as_deref()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Split screen
// ---------------------------------------------------------------------------

/// A split app appears, then snaps to its side of the divider.
#[derive(Clone, Copy, Debug)]
pub struct SplitAppLayerBoundsBecomesVisible {
    component: ComponentTemplate,
    is_primary: bool,
}

impl SplitAppLayerBoundsBecomesVisible {
    /// Checks `component`, placed on the primary side when `is_primary`.
    #[must_use]
    pub const fn new(component: ComponentTemplate, is_primary: bool) -> Self {
        Self {
            component,
            is_primary,
        }
    }
}

impl AssertionTemplate for SplitAppLayerBoundsBecomesVisible {
    fn id(&self) -> String {
        format!(
            "SplitAppLayerBoundsBecomesVisible({}, primary={})",
            self.component.name(),
            self.is_primary
        )
    }

    fn evaluate(
        &self,
        instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        let app = instance.resolve(&self.component)?;
        let divider = instance.resolve(&SPLIT_SCREEN_DIVIDER)?;
        let either: SharedMatcher = Arc::new(component::or([
            SharedMatcher::clone(&divider),
            SharedMatcher::clone(&app),
        ]));
        let is_primary = self.is_primary;
        test.assert_layers(self.id(), move |s| {
            s.not_contains_optional(&either)
                .then()
                .is_invisible(&either)
                .then()
                .invoke("splitAppLayerBoundsSnapToDivider", false, move |e| {
                    snaps_to_divider(e, app.as_ref(), divider.as_ref(), is_primary)
                });
            Ok(())
        });
        Ok(())
    }
}

/// The app covers at most its half of the display, split at the divider.
fn snaps_to_divider(
    entry: &LayerTraceEntrySubject<'_>,
    app: &dyn ComponentMatcher,
    divider: &dyn ComponentMatcher,
    is_primary: bool,
) -> CheckResult {
    let display = entry
        .entry()
        .displays()
        .iter()
        .find(|d| d.is_on && !d.is_virtual)
        .ok_or_else(|| AssertionError::failed("No active display found").at(entry.timestamp()))?;
    let screen = display.bounds;
    let split = entry.visible_region(Some(divider))?.region().bounds();
    let side = match (screen.width() > screen.height(), is_primary) {
        (true, true) => Rect::new(split.center_x(), screen.top, screen.right, screen.bottom),
        (true, false) => Rect::new(screen.left, screen.top, split.center_x(), screen.bottom),
        (false, true) => Rect::new(screen.left, split.center_y(), screen.right, screen.bottom),
        (false, false) => Rect::new(screen.left, screen.top, screen.right, split.center_y()),
    };
    entry
        .visible_region(Some(app))?
        .covers_at_most(&Region::from(side))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Custom
// ---------------------------------------------------------------------------

type Evaluate = fn(&ScenarioInstance, &mut FlickerTest) -> Result<(), FlickerError>;

/// A template defined by a function, for checks outside the library.
#[derive(Clone, Copy)]
pub struct CustomAssertion {
    id: &'static str,
    evaluate: Evaluate,
}

impl fmt::Debug for CustomAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomAssertion({})", self.id)
    }
}

impl CustomAssertion {
    /// A template named `id` that runs `evaluate`.
    #[must_use]
    pub const fn new(id: &'static str, evaluate: Evaluate) -> Self {
        Self { id, evaluate }
    }
}

impl AssertionTemplate for CustomAssertion {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn evaluate(
        &self,
        instance: &ScenarioInstance,
        test: &mut FlickerTest,
    ) -> Result<(), FlickerError> {
        (self.evaluate)(instance, test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{LAUNCHER, OPENING_APP, SPLIT_SCREEN_PRIMARY_APP};

    #[test]
    fn ids_name_the_role() {
        assert_eq!(
            ComponentCheck::AppLayerBecomesVisible.of(OPENING_APP).id(),
            "AppLayerBecomesVisible(OPENING_APP)",
            "check and role"
        );
        assert_eq!(FocusChanges::to(OPENING_APP).id(), "FocusChanges(to=OPENING_APP)", "target");
        assert_eq!(FocusChanges::any().id(), "FocusChanges", "no target");
        assert_eq!(
            SplitAppLayerBoundsBecomesVisible::new(SPLIT_SCREEN_PRIMARY_APP, true).id(),
            "SplitAppLayerBoundsBecomesVisible(SPLIT_SCREEN_PRIMARY_APP, primary=true)",
            "side included"
        );
    }

    #[test]
    fn missing_window_fails_inside_bounds_check() {
        use flicker_core::reader::TraceReader;
        use flicker_core::time::Timestamp;
        use flicker_core::wm::{WindowManagerState, WindowManagerTrace};

        use crate::assertion::ScenarioAssertion;
        use crate::instance::TraceSlice;
        use crate::scenario::{AssertionInvocationGroup, ScenarioId};

        let at = Timestamp::from_elapsed;
        let states = [10, 20]
            .into_iter()
            .map(|t| {
                WindowManagerState::new(at(t), flicker_fixtures::display_containers()).unwrap()
            })
            .collect();
        let reader = TraceReader::new().with_wm(WindowManagerTrace::new(states).unwrap());
        let slice = TraceSlice {
            start: at(10),
            end: at(20),
            associated_transition: None,
            associated_cuj: None,
        };
        let instance = ScenarioInstance::new(ScenarioId::COMMON, slice, &reader, Vec::new());
        let result = ScenarioAssertion::new(
            &instance,
            Arc::new(ComponentCheck::WindowRemainInsideVisibleBounds.of(LAUNCHER)),
            AssertionInvocationGroup::Blocking,
        )
        .execute();
        assert_eq!(result.errors.len(), 1, "absent launcher window is a failure");
    }

    #[test]
    fn templates_compare_by_id() {
        let a: Arc<dyn AssertionTemplate> = Arc::new(
            ComponentCheck::LayerBecomesVisible.of(LAUNCHER),
        );
        let b: Arc<dyn AssertionTemplate> = Arc::new(
            CustomAssertion::new("LayerBecomesVisible(Launcher)", |_, _| Ok(())),
        );
        let c: Arc<dyn AssertionTemplate> = Arc::new(EntireScreenCoveredAlways);
        assert!(*a == *b, "same id");
        assert!(*a != *c, "different id");
    }
}
