// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canned traces for tests.
//!
//! [`app_launch`] is a complete capture of an app launched from the
//! launcher. The helpers at the top level build the small pieces tests
//! usually need: millisecond timestamps, displays, layers and windows.

use flicker_core::NO_PARENT;
use flicker_core::geometry::Rect;
use flicker_core::layers::{DisplayInfo, Layer};
use flicker_core::time::Timestamp;
use flicker_core::wm::{ContainerKind, WindowContainer};

pub mod app_launch;

/// Screen size of the canned device.
pub const DISPLAY: Rect = Rect::new(0, 0, 1080, 2400);

/// A timestamp `ms` milliseconds after boot, on the elapsed clock only.
#[must_use]
pub fn ms(ms: i64) -> Timestamp {
    Timestamp::from_elapsed(ms * 1_000_000)
}

/// The canned physical display.
#[must_use]
pub fn display() -> DisplayInfo {
    DisplayInfo::physical(0, DISPLAY)
}

/// A layer drawing a buffer over `rect`, or nothing when `rect` is `None`.
#[must_use]
pub fn layer(id: i32, parent_id: i32, name: &str, rect: Option<Rect>) -> Layer {
    let layer = Layer::new(id, parent_id, name);
    match rect {
        Some(rect) => layer.with_buffer(rect),
        None => layer,
    }
}

/// The display and task display area every window hangs from.
///
/// Tokens 1 and 2 are taken.
#[must_use]
pub fn display_containers() -> Vec<WindowContainer> {
    vec![
        WindowContainer::new(
            ContainerKind::Display,
            1,
            NO_PARENT,
            "Built-in Screen",
        )
        .shown(DISPLAY),
        WindowContainer::new(ContainerKind::TaskDisplayArea, 2, 1, "DefaultTaskDisplayArea")
            .shown(DISPLAY),
    ]
}

/// A task holding one activity with one window titled `component`.
///
/// Uses tokens `task`, `task + 1` and `task + 2`. `z` orders the task among
/// its siblings.
#[must_use]
pub fn app_task(task: i32, component: &str, z: i32, visible: bool) -> Vec<WindowContainer> {
    let containers = [
        WindowContainer::new(ContainerKind::Task, task, 2, format!("Task={task}")),
        WindowContainer::new(ContainerKind::Activity, task + 1, task, component),
        WindowContainer::new(ContainerKind::Window, task + 2, task + 1, component),
    ];
    containers
        .into_iter()
        .map(|c| {
            let c = if visible { c.shown(DISPLAY) } else { c.with_frame(DISPLAY) };
            if c.kind == ContainerKind::Task { c.with_z(z) } else { c }
        })
        .collect()
}
