// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The built-in scenario table.

use flicker_core::cuj::CujType;

use crate::assertion_sets;
use crate::config::{FlickerConfig, FlickerConfigEntry};
use crate::error::ConfigError;
use crate::extractors::{
    EntireTraceExtractor, TaggedScenarioExtractor, TransitionMatcher, widen_to_close_to_home,
};
use crate::filters::{
    app_close_to_pip, close_app_to_launcher, enter_split_screen, exit_split_screen, no_op,
    open_app, quick_switch, quick_switch_merge, resize_split_screen,
};
use crate::instance::AssertionSet;
use crate::scenario::ScenarioId;

const OPEN_APP: TransitionMatcher = TransitionMatcher::new(open_app);
const CLOSE_TO_LAUNCHER: TransitionMatcher = TransitionMatcher::new(close_app_to_launcher);
const NO_TRANSITION: TransitionMatcher = TransitionMatcher::new(no_op).transition_optional();

/// Scenarios detected by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlickerServiceConfig;

impl FlickerServiceConfig {
    /// Every built-in scenario, including the disabled ones.
    ///
    /// `COMMON` covers the whole trace. Each other scenario is tagged by the
    /// journey of the same name. Journeys without dedicated checks are
    /// registered disabled with the shared set.
    #[must_use]
    pub fn default_entries() -> Vec<FlickerConfigEntry> {
        let mut entries = vec![FlickerConfigEntry::new(
            ScenarioId::COMMON,
            EntireTraceExtractor,
            assertion_sets::common(),
        )];
        entries.extend([
            tagged(
                CujType::LauncherAppLaunchFromIcon,
                OPEN_APP,
                assertion_sets::app_launch_from_home(),
            ),
            tagged(
                CujType::LauncherAppCloseToHome,
                CLOSE_TO_LAUNCHER,
                assertion_sets::app_close_to_home(),
            ),
            tagged(
                CujType::NotificationAppStart,
                OPEN_APP,
                assertion_sets::app_launch_from_notification(),
            ),
            tagged(
                CujType::LauncherQuickSwitch,
                TransitionMatcher::new(quick_switch).with_final_transform(quick_switch_merge),
                assertion_sets::launcher_quick_switch(),
            ),
            tagged(
                CujType::LauncherAppLaunchFromRecents,
                OPEN_APP,
                assertion_sets::app_launch_from_home(),
            ),
            tagged(
                CujType::LockscreenLaunchCamera,
                OPEN_APP,
                assertion_sets::app_launch_from_lock(),
            ),
            FlickerConfigEntry::new(
                ScenarioId::from_cuj(CujType::LauncherAppCloseToPip),
                TaggedScenarioExtractor::new(
                    CujType::LauncherAppCloseToPip,
                    TransitionMatcher::new(app_close_to_pip),
                )
                .with_cuj_adjustment(widen_to_close_to_home),
                assertion_sets::app_close_to_pip(),
            ),
            tagged(
                CujType::LauncherAppLaunchFromWidget,
                OPEN_APP,
                assertion_sets::app_launch_from_home(),
            ),
            tagged(
                CujType::LauncherAppSwipeToRecents,
                CLOSE_TO_LAUNCHER,
                assertion_sets::app_swipe_to_recents(),
            ),
            tagged(
                CujType::LauncherCloseAllAppsToHome,
                CLOSE_TO_LAUNCHER,
                assertion_sets::app_close_to_home(),
            ),
            tagged(
                CujType::SplitScreenEnter,
                TransitionMatcher::new(enter_split_screen),
                assertion_sets::enter_splitscreen(),
            ),
            tagged(
                CujType::SplitScreenExit,
                TransitionMatcher::new(exit_split_screen),
                assertion_sets::exit_splitscreen(),
            ),
            tagged(
                CujType::SplitScreenResize,
                TransitionMatcher::new(resize_split_screen),
                assertion_sets::resize_splitscreen(),
            ),
            tagged(
                CujType::ShadeAppLaunchFromHistoryButton,
                OPEN_APP,
                assertion_sets::app_launch(),
            ),
            tagged(CujType::ShadeAppLaunchFromMediaPlayer, OPEN_APP, assertion_sets::app_launch()),
            tagged(CujType::ShadeAppLaunchFromQsTile, OPEN_APP, assertion_sets::app_launch()),
            tagged(
                CujType::ShadeAppLaunchFromSettingsButton,
                OPEN_APP,
                assertion_sets::app_launch(),
            ),
            tagged(CujType::StatusBarAppLaunchFromCallChip, OPEN_APP, assertion_sets::app_launch()),
            tagged(
                CujType::LockscreenTransitionFromAod,
                NO_TRANSITION,
                assertion_sets::lockscreen(),
            ),
            tagged(CujType::LockscreenTransitionToAod, NO_TRANSITION, assertion_sets::lockscreen()),
            tagged(CujType::LockscreenUnlockAnimation, NO_TRANSITION, assertion_sets::lockscreen()),
        ]);

        let covered: Vec<ScenarioId> = entries.iter().map(|e| e.scenario_id.clone()).collect();
        entries.extend(
            CujType::ALL
                .iter()
                .filter(|cuj| !covered.contains(&ScenarioId::from_cuj(**cuj)))
                .map(|cuj| tagged(*cuj, NO_TRANSITION, assertion_sets::common()).disabled()),
        );
        entries
    }

    /// A registry holding the enabled built-in scenarios.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in table is inconsistent.
    pub fn registry() -> Result<FlickerConfig, ConfigError> {
        let mut config = FlickerConfig::new();
        config.use_entries(Self::default_entries())?;
        Ok(config)
    }
}

fn tagged(
    cuj: CujType,
    matcher: TransitionMatcher,
    assertions: AssertionSet,
) -> FlickerConfigEntry {
    FlickerConfigEntry::new(
        ScenarioId::from_cuj(cuj),
        TaggedScenarioExtractor::new(cuj, matcher),
        assertions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_registers_cleanly() {
        let config = FlickerServiceConfig::registry().unwrap();
        assert!(config.contains(&ScenarioId::COMMON), "common scenario");
        assert!(
            config.contains(&ScenarioId::from_cuj(CujType::LauncherQuickSwitch)),
            "quick switch"
        );
        assert!(
            !config.contains(&ScenarioId::from_cuj(CujType::NotificationShadeExpandCollapse)),
            "shade scenarios are disabled"
        );
        assert_eq!(config.len(), 22, "common plus the enabled journeys");
    }

    #[test]
    fn every_journey_has_an_entry() {
        let entries = FlickerServiceConfig::default_entries();
        assert_eq!(entries.len(), CujType::ALL.len() + 1, "one per journey plus common");
        let disabled = entries.iter().filter(|e| !e.enabled).count();
        assert_eq!(disabled, CujType::ALL.len() - 21, "the rest are disabled");
    }
}
