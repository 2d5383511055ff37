// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The assertion sets registered for the built-in scenarios.
//!
//! Every assertion in these sets is [`Blocking`](AssertionInvocationGroup::Blocking).
//! Sets are built by composition; a template already present (by id) is not
//! added twice.

use std::sync::Arc;

use crate::components::{
    CLOSING_APP, LAUNCHER, OPENING_APP, PIP_APP, PIP_DISMISS_OVERLAY, SPLIT_SCREEN_DIVIDER,
    SPLIT_SCREEN_PRIMARY_APP, SPLIT_SCREEN_SECONDARY_APP,
};
use crate::instance::AssertionSet;
use crate::scenario::AssertionInvocationGroup;
use crate::templates::{
    AssertionTemplate, ComponentCheck as C, EntireScreenCoveredAlways, FocusChanges,
    ScreenLockedAtStart, SplitAppLayerBoundsBecomesVisible,
    VisibleLayersShownMoreThanOneConsecutiveEntry, VisibleWindowsShownMoreThanOneConsecutiveEntry,
};

/// Accumulates templates, dropping repeated ids.
#[derive(Debug, Default)]
pub struct AssertionSetBuilder {
    set: AssertionSet,
}

impl AssertionSetBuilder {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `template` as blocking unless its id is present.
    #[must_use]
    pub fn with(self, template: impl AssertionTemplate + 'static) -> Self {
        self.with_group(template, AssertionInvocationGroup::Blocking)
    }

    /// Adds `template` in `group` unless its id is present.
    #[must_use]
    pub fn with_group(
        mut self,
        template: impl AssertionTemplate + 'static,
        group: AssertionInvocationGroup,
    ) -> Self {
        self.push(Arc::new(template), group);
        self
    }

    /// Adds every entry of `set` whose id is not present.
    #[must_use]
    pub fn with_all(mut self, set: AssertionSet) -> Self {
        for (template, group) in set {
            self.push(template, group);
        }
        self
    }

    fn push(&mut self, template: Arc<dyn AssertionTemplate>, group: AssertionInvocationGroup) {
        let id = template.id();
        if self.set.iter().all(|(t, _)| t.id() != id) {
            self.set.push((template, group));
        }
    }

    /// The finished set.
    #[must_use]
    pub fn build(self) -> AssertionSet {
        self.set
    }
}

/// Checks for a whole trace: the screen stays covered and nothing flashes.
///
/// The notification shade and volume dialog are allowed to show for a
/// single entry.
#[must_use]
pub fn entire_trace() -> AssertionSet {
    AssertionSetBuilder::new()
        .with(EntireScreenCoveredAlways)
        .with(VisibleWindowsShownMoreThanOneConsecutiveEntry::default())
        .with(VisibleLayersShownMoreThanOneConsecutiveEntry::ignoring_system_overlays())
        .build()
}

/// Checks shared by every scenario.
#[must_use]
pub fn common() -> AssertionSet {
    AssertionSetBuilder::new()
        .with(EntireScreenCoveredAlways)
        .with(VisibleWindowsShownMoreThanOneConsecutiveEntry::default())
        .with(VisibleLayersShownMoreThanOneConsecutiveEntry::default())
        .build()
}

/// An app comes to front.
#[must_use]
pub fn app_launch() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(common())
        .with(C::AppLayerIsInvisibleAtStart.of(OPENING_APP))
        .with(C::AppLayerIsVisibleAtEnd.of(OPENING_APP))
        .with(C::AppLayerBecomesVisible.of(OPENING_APP))
        .with(C::AppWindowBecomesVisible.of(OPENING_APP))
        .with(C::AppWindowBecomesTopWindow.of(OPENING_APP))
        .build()
}

/// An app goes away.
#[must_use]
pub fn app_close() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(common())
        .with(C::AppLayerIsVisibleAtStart.of(CLOSING_APP))
        .with(C::AppLayerIsInvisibleAtEnd.of(CLOSING_APP))
        .with(C::AppWindowIsVisibleAtStart.of(CLOSING_APP))
        .with(C::AppWindowIsInvisibleAtEnd.of(CLOSING_APP))
        .with(C::AppLayerBecomesInvisible.of(CLOSING_APP))
        .with(C::AppWindowBecomesInvisible.of(CLOSING_APP))
        .with(C::AppWindowIsTopWindowAtStart.of(CLOSING_APP))
        .build()
}

/// An app launches over the launcher.
#[must_use]
pub fn app_launch_from_home() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(app_launch())
        .with(C::AppLayerIsVisibleAtStart.of(LAUNCHER))
        .with(C::AppLayerIsInvisibleAtEnd.of(LAUNCHER))
        .build()
}

/// An app launches from the lock screen.
#[must_use]
pub fn app_launch_from_lock() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(app_launch())
        .with(FocusChanges::to(OPENING_APP))
        .with(ScreenLockedAtStart)
        .build()
}

/// An app launches from a notification.
#[must_use]
pub fn app_launch_from_notification() -> AssertionSet {
    app_launch()
}

/// An app closes, revealing the launcher.
#[must_use]
pub fn app_close_to_home() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(app_close())
        .with(C::AppLayerIsInvisibleAtStart.of(LAUNCHER))
        .with(C::AppLayerIsVisibleAtEnd.of(LAUNCHER))
        .with(C::AppWindowIsInvisibleAtStart.of(LAUNCHER))
        .with(C::AppWindowIsVisibleAtEnd.of(LAUNCHER))
        .with(C::AppWindowBecomesTopWindow.of(LAUNCHER))
        .build()
}

/// An app is swiped up into recents.
#[must_use]
pub fn app_swipe_to_recents() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(common())
        .with(C::AppLayerIsVisibleAtStart.of(CLOSING_APP))
        .with(C::AppWindowIsVisibleAtStart.of(CLOSING_APP))
        .build()
}

/// Swiping along the navigation bar swaps two apps.
#[must_use]
pub fn launcher_quick_switch() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(app_launch())
        .with_all(app_close())
        .with(C::AppLayerCoversFullScreenAtStart.of(CLOSING_APP))
        .with(C::AppLayerCoversFullScreenAtEnd.of(OPENING_APP))
        .with(C::AppWindowOnTopAtStart.of(CLOSING_APP))
        .with(C::AppWindowOnTopAtEnd.of(OPENING_APP))
        .build()
}

/// An app shrinks into picture-in-picture.
#[must_use]
pub fn app_close_to_pip() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(common())
        .with(C::LayerReduces.of(PIP_APP))
        .with(FocusChanges::any())
        .with(C::AppWindowIsVisibleAlways.of(PIP_APP))
        .with(C::WindowRemainInsideVisibleBounds.of(PIP_APP))
        .with(C::WindowBecomesPinned.of(PIP_APP))
        .with(C::LayerBecomesVisible.of(LAUNCHER))
        .with(C::HasAtMostOneWindowMatching.of(PIP_DISMISS_OVERLAY))
        .build()
}

/// Two apps enter split screen.
#[must_use]
pub fn enter_splitscreen() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(common())
        .with(C::LayerBecomesVisible.of(SPLIT_SCREEN_DIVIDER))
        .with(C::AppLayerIsVisibleAtEnd.of(SPLIT_SCREEN_PRIMARY_APP))
        .with(C::AppLayerBecomesVisible.of(SPLIT_SCREEN_SECONDARY_APP))
        .with(SplitAppLayerBoundsBecomesVisible::new(SPLIT_SCREEN_PRIMARY_APP, true))
        .with(SplitAppLayerBoundsBecomesVisible::new(SPLIT_SCREEN_SECONDARY_APP, false))
        .with(C::AppWindowBecomesVisible.of(SPLIT_SCREEN_PRIMARY_APP))
        .with(C::AppWindowBecomesVisible.of(SPLIT_SCREEN_SECONDARY_APP))
        .build()
}

/// Split screen is dismissed, one app stays.
#[must_use]
pub fn exit_splitscreen() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(common())
        .with(C::LayerBecomesInvisible.of(SPLIT_SCREEN_DIVIDER))
        .with(C::AppLayerBecomesInvisible.of(SPLIT_SCREEN_PRIMARY_APP))
        .with(C::AppLayerIsVisibleAlways.of(SPLIT_SCREEN_SECONDARY_APP))
        .with(C::AppWindowBecomesInvisible.of(SPLIT_SCREEN_PRIMARY_APP))
        .with(C::AppWindowIsVisibleAlways.of(SPLIT_SCREEN_SECONDARY_APP))
        .build()
}

/// The divider is dragged; both apps stay visible.
#[must_use]
pub fn resize_splitscreen() -> AssertionSet {
    AssertionSetBuilder::new()
        .with_all(common())
        .with(C::AppLayerIsVisibleAlways.of(SPLIT_SCREEN_PRIMARY_APP))
        .with(C::AppLayerIsVisibleAlways.of(SPLIT_SCREEN_SECONDARY_APP))
        .with(C::AppWindowIsVisibleAlways.of(SPLIT_SCREEN_PRIMARY_APP))
        .with(C::AppWindowIsVisibleAlways.of(SPLIT_SCREEN_SECONDARY_APP))
        .build()
}

/// Lock screen transitions; only the shared checks apply.
#[must_use]
pub fn lockscreen() -> AssertionSet {
    common()
}
