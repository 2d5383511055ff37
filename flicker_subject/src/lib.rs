// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Assertion subjects over flicker traces.
//!
//! A *subject* wraps one snapshot (or one region) and offers checks that
//! return a [`CheckResult`]. A failed check carries an [`AssertionError`]
//! with a message and a list of labelled [`Fact`]s. Entry checks return the
//! subject again on success so they can be chained with `?`.
//!
//! Trace subjects ([`LayersTraceSubject`], [`WindowManagerTraceSubject`])
//! collect named checks into ordered blocks and run them with
//! [`AssertionsChecker`]: each block must hold on a contiguous run of
//! entries, and the blocks must appear in order.
//!
//! ```text
//!   LayersTrace ──► LayersTraceSubject ──► LayerTraceEntrySubject ──► RegionSubject
//!   WindowManagerTrace ──► WindowManagerTraceSubject ──► WindowManagerStateSubject
//! ```
//!
//! # Example
//!
//! ```
//! use flicker_core::component::{ComponentNameMatcher, SharedMatcher};
//! use flicker_core::layers::LayersTrace;
//! use flicker_subject::LayersTraceSubject;
//!
//! let trace = LayersTrace::new(Vec::new()).unwrap();
//! let bar: SharedMatcher = ComponentNameMatcher::STATUS_BAR.shared();
//! let mut subject = LayersTraceSubject::of_layers(&trace);
//! subject.is_invisible(&bar).then().is_visible(&bar);
//! assert!(subject.is_empty().is_ok());
//! ```

use flicker_core::time::Timestamp;

mod check;
mod checker;
mod error;
mod layers;
mod region;
mod trace;
mod wm;

pub use check::{CheckSubject, check};
pub use checker::{AssertionsChecker, CompoundAssertion, NamedAssertion};
pub use error::{AssertionError, CheckResult, Fact};
pub use layers::{LayerTraceEntrySubject, LayersTraceSubject, transient_layers};
pub use region::{ASPECT_RATIO_TOLERANCE, RegionInterner, RegionSubject};
pub use trace::TraceSubject;
pub use wm::{WindowManagerStateSubject, WindowManagerTraceSubject};

/// Anything that sits at a point in a trace.
pub trait FlickerSubject {
    /// When the underlying snapshot was taken.
    fn timestamp(&self) -> Timestamp;
}
