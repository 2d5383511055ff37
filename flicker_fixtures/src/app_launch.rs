// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An app launched from the launcher icon.
//!
//! Snapshots are taken at 10, 40, 90, 160 and 300 ms. The journey runs from
//! 50 to 150 ms and the open transition from 60 to 140 ms, so the scenario
//! window spans the snapshots at 40 and 160 ms.
//!
//! | ms  | launcher | app            |
//! |-----|----------|----------------|
//! | 10  | visible  | no buffer      |
//! | 40  | visible  | no buffer      |
//! | 90  | visible  | visible        |
//! | 160 | gone     | visible        |
//! | 300 | gone     | visible        |
//!
//! A second transition at 200 ms never finished and must be skipped.

use flicker_core::NO_PARENT;
use flicker_core::cuj::{CujEvent, CujEventKind, CujTrace, CujType};
use flicker_core::geometry::Rect;
use flicker_core::layers::{LayerTraceEntry, LayersTrace};
use flicker_core::reader::TraceReader;
use flicker_core::transition::{
    ShellTransitionData, Transition, TransitionChange, TransitionType, TransitionsTrace,
    WmTransitionData,
};
use flicker_core::wm::{WindowManagerState, WindowManagerTrace};

use crate::{DISPLAY, app_task, display, display_containers, layer, ms};

/// Window title and layer name prefix of the launched app.
pub const APP_COMPONENT: &str = "com.example.app/com.example.app.MainActivity";
/// Window title and layer name prefix of the launcher.
pub const LAUNCHER_COMPONENT: &str =
    "com.google.android.apps.nexuslauncher/com.google.android.apps.nexuslauncher.NexusLauncherActivity";

/// Layer id, and window token, of the launcher task.
pub const LAUNCHER_TASK: i32 = 10;
/// Layer id, and window token, of the launched app's task.
pub const APP_TASK: i32 = 20;
/// Id of the transition opening the app.
pub const OPEN_TRANSITION: i32 = 1;
/// Id of the transition that never finished.
pub const INCOMPLETE_TRANSITION: i32 = 2;

const SNAPSHOTS: [i64; 5] = [10, 40, 90, 160, 300];

fn layers_at(t: i64) -> Result<LayerTraceEntry, flicker_core::Error> {
    let launcher_shown = t < 150;
    let app_shown = t >= 90;
    let launcher_name = format!("{LAUNCHER_COMPONENT}#{}", LAUNCHER_TASK + 1);
    let app_name = format!("{APP_COMPONENT}#{}", APP_TASK + 1);
    let status_bar = Rect::new(0, 0, DISPLAY.right, 80);
    let nav_bar = Rect::new(0, DISPLAY.bottom - 120, DISPLAY.right, DISPLAY.bottom);
    let layers = vec![
        layer(1, NO_PARENT, "Display 0 name=\"Built-in Screen\"#1", None),
        layer(LAUNCHER_TASK, 1, &format!("Task={LAUNCHER_TASK}#{LAUNCHER_TASK}"), None).with_z(1),
        layer(LAUNCHER_TASK + 1, LAUNCHER_TASK, &launcher_name, launcher_shown.then_some(DISPLAY)),
        layer(APP_TASK, 1, &format!("Task={APP_TASK}#{APP_TASK}"), None).with_z(2),
        layer(APP_TASK + 1, APP_TASK, &app_name, app_shown.then_some(DISPLAY)),
        layer(30, 1, "StatusBar#30", Some(status_bar)).with_z(10),
        layer(31, 1, "NavigationBar0#31", Some(nav_bar)).with_z(11),
    ];
    LayerTraceEntry::new(ms(t), vec![display()], layers)
}

fn wm_at(t: i64) -> Result<WindowManagerState, flicker_core::Error> {
    let app_shown = t >= 90;
    let launcher_shown = t < 150;
    let mut containers = display_containers();
    containers.extend(app_task(LAUNCHER_TASK, LAUNCHER_COMPONENT, 1, launcher_shown));
    containers.extend(app_task(APP_TASK, APP_COMPONENT, 2, app_shown));
    let focused = if app_shown { APP_COMPONENT } else { LAUNCHER_COMPONENT };
    Ok(WindowManagerState::new(ms(t), containers)?.with_focus(focused, focused))
}

/// The transition opening the app over the launcher.
///
/// # Errors
///
/// Never, unless the canned data is edited into an invalid shape.
pub fn open_transition() -> Result<Transition, flicker_core::Error> {
    let wm = WmTransitionData {
        create_time: Some(ms(60)),
        send_time: Some(ms(62)),
        finish_time: Some(ms(140)),
        start_transaction_id: Some(101),
        finish_transaction_id: Some(102),
        transition_type: Some(TransitionType::Open),
        changes: Some(vec![
            TransitionChange::new(TransitionType::Open, APP_TASK, APP_TASK),
            TransitionChange::new(TransitionType::ToBack, LAUNCHER_TASK, LAUNCHER_TASK),
        ]),
        ..WmTransitionData::default()
    };
    let shell = ShellTransitionData {
        dispatch_time: Some(ms(63)),
        ..ShellTransitionData::default()
    };
    Transition::new(OPEN_TRANSITION, wm, shell)
}

fn incomplete_transition() -> Result<Transition, flicker_core::Error> {
    let wm = WmTransitionData {
        create_time: Some(ms(200)),
        send_time: Some(ms(201)),
        transition_type: Some(TransitionType::Open),
        changes: Some(vec![TransitionChange::new(TransitionType::Open, 40, 40)]),
        ..WmTransitionData::default()
    };
    Transition::new(INCOMPLETE_TRANSITION, wm, ShellTransitionData::default())
}

fn cujs() -> CujTrace {
    CujTrace::from_events(vec![
        CujEvent::new(ms(50), CujType::LauncherAppLaunchFromIcon, CujEventKind::Begin),
        CujEvent::new(ms(150), CujType::LauncherAppLaunchFromIcon, CujEventKind::End),
    ])
}

/// The complete capture.
///
/// # Errors
///
/// Never, unless the canned data is edited into an invalid shape.
pub fn reader() -> Result<TraceReader, flicker_core::Error> {
    let layers = SNAPSHOTS
        .iter()
        .map(|&t| layers_at(t))
        .collect::<Result<Vec<_>, _>>()?;
    let wm = SNAPSHOTS
        .iter()
        .map(|&t| wm_at(t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TraceReader::new()
        .with_layers(LayersTrace::new(layers)?)
        .with_wm(WindowManagerTrace::new(wm)?)
        .with_transitions(TransitionsTrace::new(vec![
            open_transition()?,
            incomplete_transition()?,
        ]))
        .with_cuj(cujs()))
}
