// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-ordered sequences of snapshots.
//!
//! A [`Trace`] owns its entries and never reorders them. Slicing produces a
//! new trace holding clones of the entries in the half-open range
//! `[start, end)`, optionally preceded by the last entry recorded before
//! `start` so the state at the start of the range is known.

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::error::{Error, Result};
use crate::time::Timestamp;

/// Anything that was recorded at a single point in time.
pub trait TraceEntry {
    /// When the entry was recorded.
    fn timestamp(&self) -> Timestamp;
}

/// An ordered, immutable sequence of entries.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace<E> {
    entries: Vec<E>,
}

impl<E> Default for Trace<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: TraceEntry> Trace<E> {
    /// Builds a trace, checking that timestamps strictly increase.
    ///
    /// # Errors
    ///
    /// [`Error::UnorderedEntries`] if an entry is not after its predecessor,
    /// [`Error::IncomparableTimestamps`] if two neighbours share no clock.
    pub fn new(entries: Vec<E>) -> Result<Self> {
        for (index, pair) in entries.windows(2).enumerate() {
            let (prev, next) = (pair[0].timestamp(), pair[1].timestamp());
            match prev.try_cmp(&next) {
                Some(Ordering::Less) => {}
                Some(_) => {
                    return Err(Error::UnorderedEntries {
                        index: index + 1,
                        timestamp: next,
                    });
                }
                None => return Err(Error::IncomparableTimestamps(prev, next)),
            }
        }
        Ok(Self { entries })
    }

    /// The entries in recording order.
    #[must_use]
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the trace has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first entry.
    #[must_use]
    pub fn first(&self) -> Option<&E> {
        self.entries.first()
    }

    /// The last entry.
    #[must_use]
    pub fn last(&self) -> Option<&E> {
        self.entries.last()
    }

    /// Timestamp of the first entry, or [`Timestamp::MIN`] for an empty trace.
    #[must_use]
    pub fn start(&self) -> Timestamp {
        self.first().map_or(Timestamp::MIN, TraceEntry::timestamp)
    }

    /// Timestamp of the last entry, or [`Timestamp::MAX`] for an empty trace.
    #[must_use]
    pub fn end(&self) -> Timestamp {
        self.last().map_or(Timestamp::MAX, TraceEntry::timestamp)
    }

    /// The entry with exactly this timestamp.
    #[must_use]
    pub fn entry_at(&self, timestamp: Timestamp) -> Option<&E> {
        self.entries.iter().find(|e| e.timestamp() == timestamp)
    }

    /// The most recent entry recorded at or before `timestamp`.
    #[must_use]
    pub fn entry_at_or_before(&self, timestamp: Timestamp) -> Option<&E> {
        self.entries
            .iter()
            .take_while(|e| e.timestamp() <= timestamp)
            .last()
    }
}

impl<E: TraceEntry + Clone> Trace<E> {
    /// Entries in `[start, end)`.
    #[must_use]
    pub fn slice(&self, start: Timestamp, end: Timestamp) -> Self {
        self.slice_with(start, end, false)
    }

    /// Entries in `[start, end)`, plus the last entry before `start` when the
    /// range does not begin exactly on an entry.
    #[must_use]
    pub fn slice_with_initial_entry(&self, start: Timestamp, end: Timestamp) -> Self {
        self.slice_with(start, end, true)
    }

    fn slice_with(&self, start: Timestamp, end: Timestamp, add_initial_entry: bool) -> Self {
        let first_in = self.entries.partition_point(|e| e.timestamp() < start);
        let end_idx = self.entries.partition_point(|e| e.timestamp() < end);
        let begin = if add_initial_entry
            && first_in > 0
            && self.entries.get(first_in).is_none_or(|e| e.timestamp() != start)
        {
            first_in - 1
        } else {
            first_in
        };
        let entries = if begin < end_idx {
            self.entries[begin..end_idx].to_vec()
        } else {
            Vec::new()
        };
        Self { entries }
    }
}

impl<'a, E> IntoIterator for &'a Trace<E> {
    type Item = &'a E;
    type IntoIter = core::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
