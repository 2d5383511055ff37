// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace data model for detecting flickers in UI transitions.
//!
//! `flicker_core` holds the immutable value types that analysis runs over:
//! window-manager and compositor snapshots assembled into time-ordered
//! traces, shell transitions, critical-user-journey markers and the
//! component matchers that locate a window or layer inside a snapshot. It is
//! `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   Reader ──► WindowManagerTrace ──► WindowManagerState ──► WindowContainer
//!          ├─► LayersTrace ─────────► LayerTraceEntry ────► Layer
//!          ├─► TransitionsTrace ────► Transition ─────────► TransitionChange
//!          └─► CujTrace ────────────► Cuj
//! ```
//!
//! **[`time`]**: Timestamps carrying up to three clocks, and durations.
//!
//! **[`geometry`]**: Integer rectangles and the region algebra used by
//! visibility and coverage checks.
//!
//! **[`trace`]**: The generic [`Trace`](trace::Trace) container with
//! timestamp slicing.
//!
//! **[`layers`]**: Compositor snapshots. Visibility and occlusion are derived
//! once when a snapshot is built.
//!
//! **[`wm`]**: Window-manager snapshots.
//!
//! **[`transition`]**: Shell transitions merged from partial records.
//!
//! **[`cuj`]**: Critical user journey markers.
//!
//! **[`component`]**: Name and id based matchers.
//!
//! **[`reader`]**: The [`Reader`](reader::Reader) contract and an in-memory
//! implementation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate std;

/// Declares a fieldless enum backed by a platform integer code and a
/// display label.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident = $code:literal => $label:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                #[doc = $label]
                $variant,
            )*
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// The platform code.
            #[must_use]
            pub const fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Looks a value up by platform code.
            #[must_use]
            pub const fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// The platform name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)*
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub mod component;
pub mod cuj;
mod error;
pub mod geometry;
mod hierarchy;
pub mod layers;
pub mod reader;
pub mod time;
pub mod trace;
pub mod transition;
pub mod wm;

pub use error::{Error, Result};
pub use hierarchy::NO_PARENT;
