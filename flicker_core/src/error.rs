// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while building or combining trace data.

use alloc::string::String;

use crate::time::Timestamp;

/// Errors produced by the data model.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Two partial transitions with different ids were merged.
    #[error("can't merge transitions with mismatching ids {left} and {right}")]
    MismatchedTransitionIds {
        /// Id of the receiving transition.
        left: i32,
        /// Id of the transition being merged in.
        right: i32,
    },
    /// A transition was built without any timestamp.
    #[error("transition {0} has no timestamp")]
    MissingTimestamp(i32),
    /// A flattened component string had no `pkg/cls` separator.
    #[error("Missing package/class separator in '{0}'")]
    MissingSeparator(String),
    /// Two timestamps share no clock.
    #[error("can't compare {0} with {1}: no common clock")]
    IncomparableTimestamps(Timestamp, Timestamp),
    /// Trace entries must be strictly increasing in time.
    #[error("trace entry {index} at {timestamp} is not after its predecessor")]
    UnorderedEntries {
        /// Index of the offending entry.
        index: usize,
        /// Its timestamp.
        timestamp: Timestamp,
    },
    /// A node referenced a parent that is not part of the snapshot.
    #[error("node {id} references unknown parent {parent}")]
    UnknownParent {
        /// Node id.
        id: i32,
        /// Missing parent id.
        parent: i32,
    },
    /// Two nodes in the same snapshot share an id.
    #[error("duplicate node id {0}")]
    DuplicateNodeId(i32),
    /// Following parent links from a node led back to it.
    #[error("node {0} is part of a parent cycle")]
    ParentCycle(i32),
}

/// Result alias for data-model operations.
pub type Result<T> = core::result::Result<T, Error>;
