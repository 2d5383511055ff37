// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Critical user journey (CUJ) markers.
//!
//! The platform's jank instrumentation logs begin, end and cancel events
//! for each CUJ. [`CujTrace::from_events`] pairs every begin event with the
//! next end or cancel event of the same type; unmatched events are dropped.

use alloc::string::String;
use alloc::vec::Vec;

use crate::time::Timestamp;

coded_enum! {
    /// A journey instrumented by the platform.
    pub enum CujType {
        NotificationShadeExpandCollapse = 0 => "CUJ_NOTIFICATION_SHADE_EXPAND_COLLAPSE",
        NotificationShadeExpandCollapseLock = 1 => "CUJ_NOTIFICATION_SHADE_EXPAND_COLLAPSE_LOCK",
        NotificationShadeScrollFling = 2 => "CUJ_NOTIFICATION_SHADE_SCROLL_FLING",
        NotificationShadeRowExpand = 3 => "CUJ_NOTIFICATION_SHADE_ROW_EXPAND",
        NotificationShadeRowSwipe = 4 => "CUJ_NOTIFICATION_SHADE_ROW_SWIPE",
        NotificationShadeQsExpandCollapse = 5 => "CUJ_NOTIFICATION_SHADE_QS_EXPAND_COLLAPSE",
        NotificationShadeQsScrollSwipe = 6 => "CUJ_NOTIFICATION_SHADE_QS_SCROLL_SWIPE",
        LauncherAppLaunchFromRecents = 7 => "CUJ_LAUNCHER_APP_LAUNCH_FROM_RECENTS",
        LauncherAppLaunchFromIcon = 8 => "CUJ_LAUNCHER_APP_LAUNCH_FROM_ICON",
        LauncherAppCloseToHome = 9 => "CUJ_LAUNCHER_APP_CLOSE_TO_HOME",
        LauncherAppCloseToPip = 10 => "CUJ_LAUNCHER_APP_CLOSE_TO_PIP",
        LauncherQuickSwitch = 11 => "CUJ_LAUNCHER_QUICK_SWITCH",
        NotificationHeadsUpAppear = 12 => "CUJ_NOTIFICATION_HEADS_UP_APPEAR",
        NotificationHeadsUpDisappear = 13 => "CUJ_NOTIFICATION_HEADS_UP_DISAPPEAR",
        NotificationAdd = 14 => "CUJ_NOTIFICATION_ADD",
        NotificationRemove = 15 => "CUJ_NOTIFICATION_REMOVE",
        NotificationAppStart = 16 => "CUJ_NOTIFICATION_APP_START",
        LockscreenPasswordAppear = 17 => "CUJ_LOCKSCREEN_PASSWORD_APPEAR",
        LockscreenPatternAppear = 18 => "CUJ_LOCKSCREEN_PATTERN_APPEAR",
        LockscreenPinAppear = 19 => "CUJ_LOCKSCREEN_PIN_APPEAR",
        LockscreenPasswordDisappear = 20 => "CUJ_LOCKSCREEN_PASSWORD_DISAPPEAR",
        LockscreenPatternDisappear = 21 => "CUJ_LOCKSCREEN_PATTERN_DISAPPEAR",
        LockscreenPinDisappear = 22 => "CUJ_LOCKSCREEN_PIN_DISAPPEAR",
        LockscreenTransitionFromAod = 23 => "CUJ_LOCKSCREEN_TRANSITION_FROM_AOD",
        LockscreenTransitionToAod = 24 => "CUJ_LOCKSCREEN_TRANSITION_TO_AOD",
        LauncherOpenAllApps = 25 => "CUJ_LAUNCHER_OPEN_ALL_APPS",
        LauncherAllAppsScroll = 26 => "CUJ_LAUNCHER_ALL_APPS_SCROLL",
        LauncherAppLaunchFromWidget = 27 => "CUJ_LAUNCHER_APP_LAUNCH_FROM_WIDGET",
        SettingsPageScroll = 28 => "CUJ_SETTINGS_PAGE_SCROLL",
        LockscreenUnlockAnimation = 29 => "CUJ_LOCKSCREEN_UNLOCK_ANIMATION",
        ShadeAppLaunchFromHistoryButton = 30 => "CUJ_SHADE_APP_LAUNCH_FROM_HISTORY_BUTTON",
        ShadeAppLaunchFromMediaPlayer = 31 => "CUJ_SHADE_APP_LAUNCH_FROM_MEDIA_PLAYER",
        ShadeAppLaunchFromQsTile = 32 => "CUJ_SHADE_APP_LAUNCH_FROM_QS_TILE",
        ShadeAppLaunchFromSettingsButton = 33 => "CUJ_SHADE_APP_LAUNCH_FROM_SETTINGS_BUTTON",
        StatusBarAppLaunchFromCallChip = 34 => "CUJ_STATUS_BAR_APP_LAUNCH_FROM_CALL_CHIP",
        PipTransition = 35 => "CUJ_PIP_TRANSITION",
        WallpaperTransition = 36 => "CUJ_WALLPAPER_TRANSITION",
        UserSwitch = 37 => "CUJ_USER_SWITCH",
        SplashscreenAvd = 38 => "CUJ_SPLASHSCREEN_AVD",
        SplashscreenExitAnim = 39 => "CUJ_SPLASHSCREEN_EXIT_ANIM",
        ScreenOff = 40 => "CUJ_SCREEN_OFF",
        ScreenOffShowAod = 41 => "CUJ_SCREEN_OFF_SHOW_AOD",
        OneHandedEnterTransition = 42 => "CUJ_ONE_HANDED_ENTER_TRANSITION",
        OneHandedExitTransition = 43 => "CUJ_ONE_HANDED_EXIT_TRANSITION",
        UnfoldAnim = 44 => "CUJ_UNFOLD_ANIM",
        SuwLoadingToShowInfoWithActions = 45 => "CUJ_SUW_LOADING_TO_SHOW_INFO_WITH_ACTIONS",
        SuwShowFunctionScreenWithActions = 46 => "CUJ_SUW_SHOW_FUNCTION_SCREEN_WITH_ACTIONS",
        SuwLoadingToNextFlow = 47 => "CUJ_SUW_LOADING_TO_NEXT_FLOW",
        SuwLoadingScreenForStatus = 48 => "CUJ_SUW_LOADING_SCREEN_FOR_STATUS",
        SplitScreenEnter = 49 => "CUJ_SPLIT_SCREEN_ENTER",
        SplitScreenExit = 50 => "CUJ_SPLIT_SCREEN_EXIT",
        LockscreenLaunchCamera = 51 => "CUJ_LOCKSCREEN_LAUNCH_CAMERA",
        SplitScreenResize = 52 => "CUJ_SPLIT_SCREEN_RESIZE",
        SettingsSlider = 53 => "CUJ_SETTINGS_SLIDER",
        TakeScreenshot = 54 => "CUJ_TAKE_SCREENSHOT",
        VolumeControl = 55 => "CUJ_VOLUME_CONTROL",
        BiometricPromptTransition = 56 => "CUJ_BIOMETRIC_PROMPT_TRANSITION",
        SettingsToggle = 57 => "CUJ_SETTINGS_TOGGLE",
        ShadeDialogOpen = 58 => "CUJ_SHADE_DIALOG_OPEN",
        UserDialogOpen = 59 => "CUJ_USER_DIALOG_OPEN",
        TaskbarExpand = 60 => "CUJ_TASKBAR_EXPAND",
        TaskbarCollapse = 61 => "CUJ_TASKBAR_COLLAPSE",
        ShadeClearAll = 62 => "CUJ_SHADE_CLEAR_ALL",
        LauncherUnlockEntranceAnimation = 63 => "CUJ_LAUNCHER_UNLOCK_ENTRANCE_ANIMATION",
        LockscreenOcclusion = 64 => "CUJ_LOCKSCREEN_OCCLUSION",
        RecentsScrolling = 65 => "CUJ_RECENTS_SCROLLING",
        LauncherAppSwipeToRecents = 66 => "CUJ_LAUNCHER_APP_SWIPE_TO_RECENTS",
        LauncherCloseAllAppsSwipe = 67 => "CUJ_LAUNCHER_CLOSE_ALL_APPS_SWIPE",
        LauncherCloseAllAppsToHome = 68 => "CUJ_LAUNCHER_CLOSE_ALL_APPS_TO_HOME",
        ImeInsetsAnimation = 69 => "CUJ_IME_INSETS_ANIMATION",
    }
}

/// What a logged CUJ event marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CujEventKind {
    /// The journey started.
    Begin,
    /// The journey completed.
    End,
    /// The journey was abandoned.
    Cancel,
}

impl CujEventKind {
    /// Parses an event-log tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "jank_cuj_events_begin_request" => Some(Self::Begin),
            "jank_cuj_events_end_request" => Some(Self::End),
            "jank_cuj_events_cancel_request" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// One logged CUJ event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CujEvent {
    /// When the event was logged.
    pub timestamp: Timestamp,
    /// Which journey.
    pub cuj: CujType,
    /// Begin, end or cancel.
    pub kind: CujEventKind,
    /// Free-form tag attached to begin events.
    pub tag: Option<String>,
}

impl CujEvent {
    /// Creates an event without a tag.
    #[must_use]
    pub fn new(timestamp: Timestamp, cuj: CujType, kind: CujEventKind) -> Self {
        Self {
            timestamp,
            cuj,
            kind,
            tag: None,
        }
    }
}

/// A complete (or canceled) journey.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cuj {
    /// Which journey.
    pub cuj: CujType,
    /// Begin event time.
    pub start: Timestamp,
    /// End or cancel event time.
    pub end: Timestamp,
    /// Whether the journey was canceled rather than completed.
    pub canceled: bool,
    /// Tag of the begin event.
    pub tag: Option<String>,
}

/// All journeys of a run, ordered by start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CujTrace {
    entries: Vec<Cuj>,
}

impl CujTrace {
    /// Builds a trace from already paired journeys.
    #[must_use]
    pub fn new(mut entries: Vec<Cuj>) -> Self {
        entries.sort_by_key(|c| c.start);
        Self { entries }
    }

    /// Pairs begin events with the next end or cancel event of the same type.
    ///
    /// Events may arrive out of order; they are sorted by timestamp first.
    #[must_use]
    pub fn from_events(mut events: Vec<CujEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        let mut used = alloc::vec![false; events.len()];
        let mut entries = Vec::new();
        for (i, begin) in events.iter().enumerate() {
            if begin.kind != CujEventKind::Begin {
                continue;
            }
            let closing = events
                .iter()
                .enumerate()
                .skip(i + 1)
                .find(|(j, e)| !used[*j] && e.cuj == begin.cuj && e.kind != CujEventKind::Begin);
            if let Some((j, end)) = closing {
                used[j] = true;
                entries.push(Cuj {
                    cuj: begin.cuj,
                    start: begin.timestamp,
                    end: end.timestamp,
                    canceled: end.kind == CujEventKind::Cancel,
                    tag: begin.tag.clone(),
                });
            }
        }
        Self { entries }
    }

    /// Journeys in start order.
    #[must_use]
    pub fn entries(&self) -> &[Cuj] {
        &self.entries
    }

    /// Journeys overlapping `[start, end]`.
    #[must_use]
    pub fn slice(&self, start: Timestamp, end: Timestamp) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|c| c.start <= end && c.end >= start)
                .cloned()
                .collect(),
        }
    }
}
