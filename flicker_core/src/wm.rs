// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window-manager hierarchy snapshots.
//!
//! A [`WindowManagerState`] owns every container of one snapshot (displays,
//! task display areas, tasks, activities, window tokens and windows) in an
//! arena linked by parent token. Containers are stored depth-first with
//! siblings ordered top-most first, so the first matching window of any
//! query is the one drawn above the others.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Reverse;
use core::fmt;

use crate::NO_PARENT;
use crate::error::Result;
use crate::geometry::Rect;
use crate::hierarchy::{Hierarchy, reorder};
use crate::time::Timestamp;
use crate::trace::{Trace, TraceEntry};

/// The role of a node in the window hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A logical display.
    Display,
    /// An area of a display that hosts tasks.
    TaskDisplayArea,
    /// A task (stack of activities).
    Task,
    /// An activity record.
    Activity,
    /// A non-activity window token.
    WindowToken,
    /// A window surface.
    Window,
}

/// How a container is laid out on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowingMode {
    /// Inherits the mode of its parent.
    #[default]
    Undefined,
    /// Covers the whole display area.
    Fullscreen,
    /// Picture-in-picture.
    Pinned,
    /// Freely positioned.
    Freeform,
    /// One of several side-by-side windows.
    MultiWindow,
}

/// A node of the window hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowContainer {
    /// Unique token within the snapshot.
    pub token: i32,
    /// Token of the parent, [`NO_PARENT`] for roots.
    pub parent_token: i32,
    /// Node role.
    pub kind: ContainerKind,
    /// Window title, or the component name for activities.
    pub title: String,
    /// Whether the window manager considers the container visible.
    pub visible: bool,
    /// Requested windowing mode.
    pub windowing_mode: WindowingMode,
    /// On-screen frame.
    pub frame: Rect,
    /// Id of the compositor layer backing this container, `-1` if unknown.
    pub layer_id: i32,
    /// Z order among siblings, higher is drawn on top.
    pub z: i32,
}

impl WindowContainer {
    /// Creates an invisible container with an empty frame.
    #[must_use]
    pub fn new(
        kind: ContainerKind,
        token: i32,
        parent_token: i32,
        title: impl Into<String>,
    ) -> Self {
        Self {
            token,
            parent_token,
            kind,
            title: title.into(),
            visible: false,
            windowing_mode: WindowingMode::Undefined,
            frame: Rect::EMPTY,
            layer_id: -1,
            z: 0,
        }
    }

    /// Marks the container visible with the given frame.
    #[must_use]
    pub fn shown(mut self, frame: Rect) -> Self {
        self.visible = true;
        self.frame = frame;
        self
    }

    /// Sets the frame without changing visibility.
    #[must_use]
    pub fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }

    /// Sets the windowing mode.
    #[must_use]
    pub fn with_windowing_mode(mut self, mode: WindowingMode) -> Self {
        self.windowing_mode = mode;
        self
    }

    /// Sets the backing layer id.
    #[must_use]
    pub fn with_layer_id(mut self, layer_id: i32) -> Self {
        self.layer_id = layer_id;
        self
    }

    /// Sets the z order.
    #[must_use]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    /// Returns `true` for root containers.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_token == NO_PARENT
    }

    /// Returns `true` for window surfaces.
    #[must_use]
    pub fn is_window(&self) -> bool {
        self.kind == ContainerKind::Window
    }
}

impl fmt::Display for WindowContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x} {}", self.token, self.title)
    }
}

/// A snapshot of the window hierarchy plus global window-manager state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowManagerState {
    timestamp: Timestamp,
    containers: Vec<WindowContainer>,
    index: BTreeMap<i32, usize>,
    focused_app: String,
    focused_window: String,
    keyguard_showing: bool,
}

/// A sequence of window-manager snapshots.
pub type WindowManagerTrace = Trace<WindowManagerState>;

impl WindowManagerState {
    /// Builds a snapshot from a flat container list.
    ///
    /// # Errors
    ///
    /// Fails on duplicate tokens, unknown parents or parent cycles.
    pub fn new(timestamp: Timestamp, containers: Vec<WindowContainer>) -> Result<Self> {
        let nodes: Vec<(i32, i32)> = containers
            .iter()
            .map(|c| (c.token, c.parent_token))
            .collect();
        let tree = Hierarchy::build(&nodes, |i| Reverse(containers[i].z))?;
        let containers = reorder(containers, &tree.depth_first());
        let index = containers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.token, i))
            .collect();
        Ok(Self {
            timestamp,
            containers,
            index,
            focused_app: String::new(),
            focused_window: String::new(),
            keyguard_showing: false,
        })
    }

    /// Records the focused activity and window names.
    #[must_use]
    pub fn with_focus(mut self, app: impl Into<String>, window: impl Into<String>) -> Self {
        self.focused_app = app.into();
        self.focused_window = window.into();
        self
    }

    /// Records whether the keyguard is showing.
    #[must_use]
    pub fn with_keyguard_showing(mut self, showing: bool) -> Self {
        self.keyguard_showing = showing;
        self
    }

    /// When the snapshot was taken.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Name of the focused activity, empty if none.
    #[must_use]
    pub fn focused_app(&self) -> &str {
        &self.focused_app
    }

    /// Title of the focused window, empty if none.
    #[must_use]
    pub fn focused_window(&self) -> &str {
        &self.focused_window
    }

    /// Whether the lock screen is up.
    #[must_use]
    pub fn is_keyguard_showing(&self) -> bool {
        self.keyguard_showing
    }

    /// All containers, depth-first, top-most sibling first.
    #[must_use]
    pub fn containers(&self) -> &[WindowContainer] {
        &self.containers
    }

    /// Looks up a container by token.
    #[must_use]
    pub fn container(&self, token: i32) -> Option<&WindowContainer> {
        self.index.get(&token).map(|&i| &self.containers[i])
    }

    /// The parent of `container`, if any.
    #[must_use]
    pub fn parent(&self, container: &WindowContainer) -> Option<&WindowContainer> {
        if container.is_root() {
            None
        } else {
            self.container(container.parent_token)
        }
    }

    /// Parent, grandparent and so on up to the root.
    pub fn ancestors<'a>(
        &'a self,
        container: &'a WindowContainer,
    ) -> impl Iterator<Item = &'a WindowContainer> + 'a {
        core::iter::successors(self.parent(container), move |c| self.parent(c))
    }

    /// Containers of one kind, top-most first.
    pub fn of_kind(&self, kind: ContainerKind) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.containers.iter().filter(move |c| c.kind == kind)
    }

    /// All window surfaces, top-most first.
    pub fn windows(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.of_kind(ContainerKind::Window)
    }

    /// Visible window surfaces.
    pub fn visible_windows(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.windows().filter(|w| w.visible)
    }

    /// Returns `true` if `window` belongs to an activity.
    #[must_use]
    pub fn is_app_window(&self, window: &WindowContainer) -> bool {
        self.ancestors(window)
            .any(|c| c.kind == ContainerKind::Activity)
    }

    /// Windows that belong to an activity.
    pub fn app_windows(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.windows().filter(|w| self.is_app_window(w))
    }

    /// Windows that do not belong to any activity (bars, wallpaper, ...).
    pub fn non_app_windows(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.windows().filter(|w| !self.is_app_window(w))
    }

    /// Visible windows that belong to an activity.
    pub fn visible_app_windows(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.app_windows().filter(|w| w.visible)
    }

    /// The top-most visible app window.
    #[must_use]
    pub fn top_visible_app_window(&self) -> Option<&WindowContainer> {
        self.visible_app_windows().next()
    }

    /// All activities.
    pub fn activities(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.of_kind(ContainerKind::Activity)
    }

    /// All tasks.
    pub fn tasks(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.of_kind(ContainerKind::Task)
    }

    /// The windowing mode of `container`, inherited from the nearest ancestor
    /// that defines one.
    #[must_use]
    pub fn effective_windowing_mode(&self, container: &WindowContainer) -> WindowingMode {
        core::iter::once(container)
            .chain(self.ancestors(container))
            .map(|c| c.windowing_mode)
            .find(|m| *m != WindowingMode::Undefined)
            .unwrap_or(WindowingMode::Undefined)
    }

    /// Windows shown in picture-in-picture.
    pub fn pinned_windows(&self) -> impl Iterator<Item = &WindowContainer> + '_ {
        self.windows()
            .filter(|w| self.effective_windowing_mode(w) == WindowingMode::Pinned)
    }

    /// Frame of the first display.
    #[must_use]
    pub fn display_bounds(&self) -> Option<Rect> {
        self.of_kind(ContainerKind::Display).next().map(|d| d.frame)
    }
}

impl TraceEntry for WindowManagerState {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use ContainerKind::{Activity, Display, Task, Window, WindowToken};

    const SCREEN: Rect = Rect::new(0, 0, 1080, 2400);

    fn state() -> WindowManagerState {
        WindowManagerState::new(
            Timestamp::from_elapsed(10),
            vec![
                WindowContainer::new(Window, 50, 40, "com.example/com.example.Main").shown(SCREEN),
                WindowContainer::new(Activity, 40, 30, "com.example/.Main").shown(SCREEN),
                WindowContainer::new(Task, 30, 1, "Task").with_z(2),
                WindowContainer::new(WindowToken, 60, 1, "bar").with_z(5),
                WindowContainer::new(Window, 61, 60, "StatusBar").shown(Rect::new(0, 0, 1080, 80)),
                WindowContainer::new(Task, 70, 1, "Pip task")
                    .with_z(3)
                    .with_windowing_mode(WindowingMode::Pinned),
                WindowContainer::new(Activity, 71, 70, "com.pip/.Video"),
                WindowContainer::new(Window, 72, 71, "com.pip/com.pip.Video"),
                WindowContainer::new(Display, 1, NO_PARENT, "Display").with_frame(SCREEN),
            ],
        )
        .unwrap()
        .with_focus("com.example/.Main", "com.example/com.example.Main")
    }

    #[test]
    fn windows_are_listed_top_most_first() {
        let s = state();
        let titles: Vec<&str> = s.windows().map(|w| w.title.as_str()).collect();
        assert_eq!(
            titles,
            ["StatusBar", "com.pip/com.pip.Video", "com.example/com.example.Main"],
            "z order"
        );
    }

    #[test]
    fn app_and_non_app_windows() {
        let s = state();
        assert_eq!(s.app_windows().count(), 2, "two activity windows");
        assert_eq!(s.non_app_windows().count(), 1, "status bar");
        let top = s.top_visible_app_window().unwrap();
        assert_eq!(top.token, 50, "pip window is invisible");
    }

    #[test]
    fn windowing_mode_is_inherited() {
        let s = state();
        let pinned: Vec<i32> = s.pinned_windows().map(|w| w.token).collect();
        assert_eq!(pinned, [72], "inherits from task");
    }

    #[test]
    fn focus_and_display() {
        let s = state();
        assert_eq!(s.focused_app(), "com.example/.Main", "focused app");
        assert_eq!(s.display_bounds(), Some(SCREEN), "display frame");
        assert!(!s.is_keyguard_showing(), "unlocked");
    }

    #[test]
    fn ancestors_walk_to_display() {
        let s = state();
        let w = s.container(50).unwrap();
        let up: Vec<i32> = s.ancestors(w).map(|c| c.token).collect();
        assert_eq!(up, [40, 30, 1], "window, activity, task, display");
    }
}
