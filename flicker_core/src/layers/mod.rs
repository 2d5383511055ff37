// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor layer data model.
//!
//! A *layer* is a node in the compositor tree recorded at one instant. Each
//! layer has:
//!
//! - An identity: an `i32` id, unique within a snapshot, and a parent id.
//! - **Recorded properties**: name, z order, flags, alpha, buffer state,
//!   bounds and the visible region computed by composition.
//! - **Derived properties** produced when the snapshot is built: whether a
//!   parent hides it and which layers above occlude or cover it.
//!
//! A [`LayerTraceEntry`] owns every layer of one snapshot in an arena and
//! answers hierarchy queries (parent, children, ancestors). A
//! [`LayersTrace`] is the time-ordered sequence of snapshots.
//!
//! # Visibility
//!
//! A layer is visible when it is not hidden by policy or by a parent, has a
//! buffer or draws effects, is not fully covered by an opaque layer above it
//! and has a non-empty visible region.

mod entry;
mod layer;
mod traverse;

pub use entry::{DisplayInfo, LayerTraceEntry, LayersTrace};
pub use layer::{Layer, LayerFlags, LayerRef, OFFSCREEN_ROOT_ID};
pub use traverse::Ancestors;
