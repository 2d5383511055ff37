// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for flicker runs.
//!
//! This crate provides [`RunSink`](flicker_service::RunSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] writes one human-readable line per event.
//! - [`recorder::RecorderSink`] keeps a compact binary recording, read back
//!   with [`recorder::decode`].
//! - [`chrome::export`] turns a recording into Chrome Trace Event Format
//!   JSON, one track for scenarios and one for assertions.
//!
//! [`log::install`] sets up `tracing` output filtered by `FLICKER_LOG`.

pub mod chrome;
pub mod log;
pub mod pretty;
pub mod recorder;
