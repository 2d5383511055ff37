// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component matching.
//!
//! A [`ComponentMatcher`] answers "is this window, activity or layer the
//! component I am looking for?". Matching against a collection succeeds if
//! any element matches.
//!
//! - [`ComponentNameMatcher`] matches by name: a window title, activity name
//!   or layer name must *contain* the identifier derived from a package and
//!   class. System components use the class name alone.
//! - [`FullComponentIdMatcher`] matches a window token / layer id pair, or
//!   anything nested below it. This identifies tasks and containers whose
//!   names are not stable but whose ids are known from a transition.
//! - [`OrComponentMatcher`] matches if any of its parts does.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::layers::{Layer, LayerTraceEntry};
use crate::wm::{WindowContainer, WindowManagerState};

// ---------------------------------------------------------------------------
// ComponentName
// ---------------------------------------------------------------------------

/// A package and class pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentName {
    /// Package, empty for system components.
    pub package_name: String,
    /// Fully qualified class, or a bare window name for system components.
    pub class_name: String,
}

impl ComponentName {
    /// Creates a component name.
    #[must_use]
    pub fn new(package_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            class_name: class_name.into(),
        }
    }

    /// The class with the package prefix shortened to `.`, when it has one.
    fn short_class_name(&self) -> &str {
        let pkg = self.package_name.as_str();
        match self.class_name.strip_prefix(pkg) {
            Some(rest) if !pkg.is_empty() && rest.starts_with('.') => rest,
            _ => &self.class_name,
        }
    }

    /// Activity name form: `pkg/.Cls` (or the non-empty half).
    #[must_use]
    pub fn to_activity_name(&self) -> String {
        match (self.package_name.is_empty(), self.class_name.is_empty()) {
            (false, false) => format!("{}/{}", self.package_name, self.short_class_name()),
            (false, true) => self.package_name.clone(),
            _ => self.class_name.clone(),
        }
    }

    /// Window name form: `pkg/cls` (or the non-empty half).
    #[must_use]
    pub fn to_window_name(&self) -> String {
        match (self.package_name.is_empty(), self.class_name.is_empty()) {
            (false, false) => format!("{}/{}", self.package_name, self.class_name),
            (false, true) => self.package_name.clone(),
            _ => self.class_name.clone(),
        }
    }

    /// Layer name form: the window name, with a trailing `#` when it
    /// contains a `/` and no `#` yet.
    #[must_use]
    pub fn to_layer_name(&self) -> String {
        let mut name = self.to_window_name();
        if name.contains('/') && !name.contains('#') {
            name.push('#');
        }
        name
    }

    /// `pkg/` followed by the shortened class.
    #[must_use]
    pub fn to_short_window_name(&self) -> String {
        format!("{}/{}", self.package_name, self.short_class_name())
    }

    /// Recovers a component name from a layer name.
    ///
    /// `pkg/cls#12` yields `(pkg, cls)`; names without `/` are treated as a
    /// bare class.
    #[must_use]
    pub fn from_layer_name(layer_name: &str) -> Self {
        match layer_name.split_once('/') {
            Some((pkg, rest)) => {
                let rest = rest.split('/').next().unwrap_or(rest);
                let cls = match rest.rsplit_once('#') {
                    Some((cls, id)) if id.chars().all(|c| c.is_ascii_digit()) => cls,
                    _ => rest,
                };
                Self::new(pkg, cls)
            }
            None => Self::new("", layer_name),
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_window_name())
    }
}

// ---------------------------------------------------------------------------
// Matcher trait
// ---------------------------------------------------------------------------

/// Identifies a component in window-manager and compositor snapshots.
pub trait ComponentMatcher: fmt::Debug + Send + Sync {
    /// Returns `true` if `window` is (part of) the component.
    fn window_matches(&self, state: &WindowManagerState, window: &WindowContainer) -> bool;

    /// Returns `true` if `activity` is (part of) the component.
    fn activity_matches(&self, state: &WindowManagerState, activity: &WindowContainer) -> bool;

    /// Returns `true` if `layer` is (part of) the component.
    fn layer_matches(&self, entry: &LayerTraceEntry, layer: &Layer) -> bool;

    /// Identifier used when reporting activity checks.
    fn to_activity_identifier(&self) -> String;

    /// Identifier used when reporting window checks.
    fn to_window_identifier(&self) -> String;

    /// Identifier used when reporting layer checks.
    fn to_layer_identifier(&self) -> String;

    /// Returns `true` if any of `windows` matches.
    fn window_matches_any_of(
        &self,
        state: &WindowManagerState,
        windows: &[&WindowContainer],
    ) -> bool {
        windows.iter().any(|w| self.window_matches(state, w))
    }

    /// Returns `true` if any of `layers` matches.
    fn layer_matches_any_of(&self, entry: &LayerTraceEntry, layers: &[&Layer]) -> bool {
        layers.iter().any(|l| self.layer_matches(entry, l))
    }

    /// All matching layers of a snapshot.
    fn matching_layers<'a>(&self, entry: &'a LayerTraceEntry) -> Vec<&'a Layer> {
        entry
            .layers()
            .iter()
            .filter(|l| self.layer_matches(entry, l))
            .collect()
    }

    /// All matching windows of a snapshot, top-most first.
    fn matching_windows<'a>(&self, state: &'a WindowManagerState) -> Vec<&'a WindowContainer> {
        state
            .windows()
            .filter(|w| self.window_matches(state, w))
            .collect()
    }

    /// All matching activities of a snapshot.
    fn matching_activities<'a>(&self, state: &'a WindowManagerState) -> Vec<&'a WindowContainer> {
        state
            .activities()
            .filter(|a| self.activity_matches(state, a))
            .collect()
    }
}

/// Shared handle to a matcher.
pub type SharedMatcher = Arc<dyn ComponentMatcher>;

/// Combines matchers so that any of them matching is enough.
#[must_use]
pub fn or(matchers: impl IntoIterator<Item = SharedMatcher>) -> OrComponentMatcher {
    OrComponentMatcher {
        components: matchers.into_iter().collect(),
    }
}

// ---------------------------------------------------------------------------
// Name matcher
// ---------------------------------------------------------------------------

/// Matches components by name containment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentNameMatcher {
    component: ComponentName,
}

macro_rules! system_components {
    ($($(#[$meta:meta])* $name:ident => ($pkg:literal, $cls:literal),)*) => {
        impl ComponentNameMatcher {
            $(
                $(#[$meta])*
                pub const $name: ComponentNameConst = ComponentNameConst::new($pkg, $cls);
            )*
        }
    };
}

/// A compile-time component name, turned into a matcher with
/// [`ComponentNameConst::matcher`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentNameConst {
    package_name: &'static str,
    class_name: &'static str,
}

impl ComponentNameConst {
    const fn new(package_name: &'static str, class_name: &'static str) -> Self {
        Self {
            package_name,
            class_name,
        }
    }

    /// Builds the matcher.
    #[must_use]
    pub fn matcher(self) -> ComponentNameMatcher {
        ComponentNameMatcher::new(self.package_name, self.class_name)
    }

    /// Builds a shared matcher.
    #[must_use]
    pub fn shared(self) -> SharedMatcher {
        Arc::new(self.matcher())
    }
}

system_components! {
    /// Navigation bar.
    NAV_BAR => ("", "NavigationBar0"),
    /// Task bar.
    TASK_BAR => ("", "Taskbar"),
    /// Status bar.
    STATUS_BAR => ("", "StatusBar"),
    /// Rotation animation layer.
    ROTATION => ("", "RotationLayer"),
    /// Back gesture surface.
    BACK_SURFACE => ("", "BackColorSurface"),
    /// Input method window.
    IME => ("", "InputMethod"),
    /// Input method snapshot surface.
    IME_SNAPSHOT => ("", "IME-snapshot-surface"),
    /// Splash screen starting window.
    SPLASH_SCREEN => ("", "Splash Screen"),
    /// Snapshot starting window.
    SNAPSHOT => ("", "SnapshotStartingWindow"),
    /// Secondary display home handle.
    SECONDARY_HOME_HANDLE => ("", "SecondaryHomeHandle"),
    /// Transition snapshot layer.
    TRANSITION_SNAPSHOT => ("", "transition snapshot"),
    /// Letterbox surface.
    LETTERBOX => ("", "Letterbox"),
    /// Wallpaper buffer-queue wrapper.
    WALLPAPER_BBQ_WRAPPER => ("", "Wallpaper BBQ wrapper"),
    /// Picture-in-picture content overlay.
    PIP_CONTENT_OVERLAY => ("", "PipContentOverlay"),
    /// Back gesture handler.
    EDGE_BACK_GESTURE_HANDLER => ("", "EdgeBackGestureHandler"),
    /// Screen-off color fade.
    COLOR_FADE => ("", "ColorFade"),
    /// Wallpaper token.
    WALLPAPER_WINDOW_TOKEN => ("", "WallpaperWindowToken"),
    /// Notification shade.
    NOTIFICATION_SHADE => ("", "NotificationShade"),
    /// Volume dialog.
    VOLUME_DIALOG => ("", "VolumeDialog"),
    /// Floating rotation button.
    FLOATING_ROTATION_BUTTON => ("", "FloatingRotationButton"),
    /// Pixel launcher.
    LAUNCHER => (
        "com.google.android.apps.nexuslauncher",
        "com.google.android.apps.nexuslauncher.NexusLauncherActivity"
    ),
    /// AOSP launcher.
    AOSP_LAUNCHER => (
        "com.android.launcher3",
        "com.android.launcher3.uioverrides.QuickstepLauncher"
    ),
    /// Split-screen divider.
    SPLIT_DIVIDER => ("", "StageCoordinatorSplitDivider"),
    /// Default task display area.
    DEFAULT_TASK_DISPLAY_AREA => ("", "DefaultTaskDisplayArea"),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '$'
}

impl ComponentNameMatcher {
    /// Creates a matcher for a package and class.
    #[must_use]
    pub fn new(package_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            component: ComponentName::new(package_name, class_name),
        }
    }

    /// Creates a matcher for a system component known by class alone.
    #[must_use]
    pub fn system(class_name: impl Into<String>) -> Self {
        Self::new("", class_name)
    }

    /// The matched component.
    #[must_use]
    pub fn component(&self) -> &ComponentName {
        &self.component
    }

    /// Parses a flattened `pkg/cls` string. A class starting with `.` is
    /// relative to the package.
    ///
    /// # Errors
    ///
    /// [`Error::MissingSeparator`] if there is no `/` or nothing follows it.
    pub fn unflatten_from_string(s: &str) -> Result<Self> {
        let (pkg, cls) = split_flattened(s)?;
        Ok(Self::new(pkg, qualify(pkg, cls)))
    }

    /// Parses a flattened `pkg/cls` embedded in surrounding text, such as
    /// `ActivityRecord{1a2b u0 pkg/cls t12}` or `pkg/cls#34`.
    ///
    /// The package is the run of name characters (ASCII letters, digits,
    /// `.`, `_`, `$`) ending at the `/`; the class is the run starting after
    /// it.
    ///
    /// # Errors
    ///
    /// [`Error::MissingSeparator`] if there is no `/` or nothing follows it.
    pub fn unflatten_from_string_with_junk(s: &str) -> Result<Self> {
        let (pkg, cls) = split_flattened(s)?;
        let pkg_start = pkg.rfind(|c| !is_name_char(c)).map_or(0, |i| i + 1);
        let pkg = &pkg[pkg_start..];
        let cls_end = cls.find(|c| !is_name_char(c)).unwrap_or(cls.len());
        let cls = &cls[..cls_end];
        Ok(Self::new(pkg, qualify(pkg, cls)))
    }

    fn activity_record_matches(&self, name: &str) -> bool {
        name.starts_with("ActivityRecord{") && name.contains(&self.component.to_short_window_name())
    }
}

fn split_flattened(s: &str) -> Result<(&str, &str)> {
    match s.split_once('/') {
        Some((pkg, cls)) if !cls.is_empty() => Ok((pkg, cls)),
        _ => Err(Error::MissingSeparator(s.to_string())),
    }
}

fn qualify(pkg: &str, cls: &str) -> String {
    if cls.starts_with('.') {
        format!("{pkg}{cls}")
    } else {
        cls.to_string()
    }
}

impl ComponentMatcher for ComponentNameMatcher {
    fn window_matches(&self, _state: &WindowManagerState, window: &WindowContainer) -> bool {
        window.title.contains(&self.component.to_window_name())
    }

    fn activity_matches(&self, _state: &WindowManagerState, activity: &WindowContainer) -> bool {
        activity.title.contains(&self.component.to_activity_name())
    }

    fn layer_matches(&self, _entry: &LayerTraceEntry, layer: &Layer) -> bool {
        layer.name.contains(&self.component.to_layer_name())
            || self.activity_record_matches(&layer.name)
    }

    fn to_activity_identifier(&self) -> String {
        self.component.to_activity_name()
    }

    fn to_window_identifier(&self) -> String {
        self.component.to_window_name()
    }

    fn to_layer_identifier(&self) -> String {
        self.component.to_layer_name()
    }
}

impl fmt::Display for ComponentNameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.component, f)
    }
}

// ---------------------------------------------------------------------------
// Id matcher
// ---------------------------------------------------------------------------

/// Matches a window token / layer id pair, or anything nested below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FullComponentIdMatcher {
    /// Window container token.
    pub window_id: i32,
    /// Layer id.
    pub layer_id: i32,
}

impl FullComponentIdMatcher {
    /// Creates an id matcher.
    #[must_use]
    pub const fn new(window_id: i32, layer_id: i32) -> Self {
        Self {
            window_id,
            layer_id,
        }
    }

    fn container_matches(&self, state: &WindowManagerState, container: &WindowContainer) -> bool {
        container.token == self.window_id
            || state.ancestors(container).any(|c| c.token == self.window_id)
    }
}

impl ComponentMatcher for FullComponentIdMatcher {
    fn window_matches(&self, state: &WindowManagerState, window: &WindowContainer) -> bool {
        self.container_matches(state, window)
    }

    fn activity_matches(&self, state: &WindowManagerState, activity: &WindowContainer) -> bool {
        self.container_matches(state, activity)
    }

    fn layer_matches(&self, entry: &LayerTraceEntry, layer: &Layer) -> bool {
        layer.id == self.layer_id || entry.ancestors(layer).any(|l| l.id == self.layer_id)
    }

    fn to_activity_identifier(&self) -> String {
        format!("windowId={:x}", self.window_id)
    }

    fn to_window_identifier(&self) -> String {
        format!("windowId={:x}", self.window_id)
    }

    fn to_layer_identifier(&self) -> String {
        format!("layerId={}", self.layer_id)
    }
}

// ---------------------------------------------------------------------------
// Or matcher
// ---------------------------------------------------------------------------

/// Matches if any component matches.
#[derive(Clone, Debug)]
pub struct OrComponentMatcher {
    components: Vec<SharedMatcher>,
}

impl OrComponentMatcher {
    /// The combined matchers.
    #[must_use]
    pub fn components(&self) -> &[SharedMatcher] {
        &self.components
    }

    fn join(&self, f: impl Fn(&dyn ComponentMatcher) -> String) -> String {
        let parts: Vec<String> = self.components.iter().map(|c| f(c.as_ref())).collect();
        parts.join(" or ")
    }
}

impl ComponentMatcher for OrComponentMatcher {
    fn window_matches(&self, state: &WindowManagerState, window: &WindowContainer) -> bool {
        self.components.iter().any(|c| c.window_matches(state, window))
    }

    fn activity_matches(&self, state: &WindowManagerState, activity: &WindowContainer) -> bool {
        self.components
            .iter()
            .any(|c| c.activity_matches(state, activity))
    }

    fn layer_matches(&self, entry: &LayerTraceEntry, layer: &Layer) -> bool {
        self.components.iter().any(|c| c.layer_matches(entry, layer))
    }

    fn to_activity_identifier(&self) -> String {
        self.join(|c| c.to_activity_identifier())
    }

    fn to_window_identifier(&self) -> String {
        self.join(|c| c.to_window_identifier())
    }

    fn to_layer_identifier(&self) -> String {
        self.join(|c| c.to_layer_identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NO_PARENT;
    use crate::geometry::Rect;
    use crate::layers::DisplayInfo;
    use crate::time::Timestamp;
    use crate::wm::ContainerKind;
    use alloc::vec;
    use proptest::prelude::*;

    fn launcher_entry() -> LayerTraceEntry {
        LayerTraceEntry::new(
            Timestamp::from_elapsed(1),
            vec![DisplayInfo::physical(0, Rect::new(0, 0, 100, 100))],
            vec![
                Layer::new(1, NO_PARENT, "Task=4"),
                Layer::new(
                    2,
                    1,
                    "com.google.android.apps.nexuslauncher/com.google.android.apps.nexuslauncher.NexusLauncherActivity#2",
                ),
                Layer::new(3, 2, "child surface"),
                Layer::new(4, NO_PARENT, "StatusBar#4"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn name_forms() {
        let c = ComponentName::new("com.example", "com.example.ui.Main");
        assert_eq!(c.to_window_name(), "com.example/com.example.ui.Main");
        assert_eq!(c.to_activity_name(), "com.example/.ui.Main");
        assert_eq!(c.to_layer_name(), "com.example/com.example.ui.Main#");
        assert_eq!(c.to_short_window_name(), "com.example/.ui.Main");
        let sys = ComponentName::new("", "StatusBar");
        assert_eq!(sys.to_layer_name(), "StatusBar", "no separator, no hash");
    }

    #[test]
    fn from_layer_name_strips_id() {
        let c = ComponentName::from_layer_name("com.example/com.example.Main#42");
        assert_eq!(c, ComponentName::new("com.example", "com.example.Main"));
        let sys = ComponentName::from_layer_name("StatusBar#4");
        assert_eq!(sys.class_name, "StatusBar#4", "bare class kept as is");
    }

    #[test]
    fn name_matcher_matches_layers_by_containment() {
        let e = launcher_entry();
        let launcher = ComponentNameMatcher::LAUNCHER.matcher();
        let ids: Vec<i32> = launcher.matching_layers(&e).iter().map(|l| l.id).collect();
        assert_eq!(ids, [2], "only the launcher layer");
        let bar = ComponentNameMatcher::STATUS_BAR.matcher();
        assert!(bar.layer_matches(&e, e.layer_by_id(4).unwrap()), "system component");
    }

    #[test]
    fn id_matcher_matches_descendants() {
        let e = launcher_entry();
        let task = FullComponentIdMatcher::new(0x10, 1);
        let ids: Vec<i32> = task.matching_layers(&e).iter().map(|l| l.id).collect();
        assert_eq!(ids, [1, 2, 3], "task and everything below");
    }

    #[test]
    fn id_matcher_matches_nested_windows() {
        let state = WindowManagerState::new(
            Timestamp::from_elapsed(1),
            vec![
                WindowContainer::new(ContainerKind::Task, 7, NO_PARENT, "Task"),
                WindowContainer::new(ContainerKind::Activity, 8, 7, "a/.B"),
                WindowContainer::new(ContainerKind::Window, 9, 8, "a/a.B"),
            ],
        )
        .unwrap();
        let m = FullComponentIdMatcher::new(7, 0);
        assert_eq!(m.matching_windows(&state).len(), 1, "window under task");
        assert_eq!(m.matching_activities(&state).len(), 1, "activity under task");
    }

    #[test]
    fn or_matcher_joins_identifiers() {
        let m = or([
            ComponentNameMatcher::SPLASH_SCREEN.shared(),
            ComponentNameMatcher::SNAPSHOT.shared(),
        ]);
        assert_eq!(
            m.to_layer_identifier(),
            "Splash Screen or SnapshotStartingWindow",
            "joined"
        );
    }

    #[test]
    fn unflatten_relative_class() {
        let m = ComponentNameMatcher::unflatten_from_string("com.example/.Main").unwrap();
        assert_eq!(m.component().class_name, "com.example.Main", "qualified");
    }

    #[test]
    fn unflatten_requires_separator() {
        for s in ["no-separator", "trailing/", ""] {
            assert!(
                matches!(
                    ComponentNameMatcher::unflatten_from_string(s),
                    Err(Error::MissingSeparator(_))
                ),
                "{s}"
            );
        }
    }

    #[test]
    fn unflatten_with_junk_examples() {
        let m = ComponentNameMatcher::unflatten_from_string_with_junk(
            "ActivityRecord{6f1 u0 com.android.launcher3/com.android.launcher3.uioverrides.QuickstepLauncher t12}",
        )
        .unwrap();
        assert_eq!(m, ComponentNameMatcher::AOSP_LAUNCHER.matcher(), "digits kept");
        let m = ComponentNameMatcher::unflatten_from_string_with_junk(
            "com.example/.Main#17",
        )
        .unwrap();
        assert_eq!(m.component().class_name, "com.example.Main", "id stripped");
        assert_eq!(m.component().package_name, "com.example", "no junk");
    }

    proptest! {
        #[test]
        fn unflatten_round_trips(
            pkg in "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}",
            cls in "[A-Z][a-zA-Z]{0,10}",
        ) {
            let flat = format!("{pkg}/{pkg}.{cls}");
            let m = ComponentNameMatcher::unflatten_from_string(&flat).unwrap();
            prop_assert_eq!(m.to_window_identifier(), flat);
        }

        #[test]
        fn unflatten_fails_without_separator(s in "[^/]*") {
            prop_assert!(ComponentNameMatcher::unflatten_from_string(&s).is_err());
        }
    }
}
