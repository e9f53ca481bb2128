// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo history of event list snapshots.

use super::event::Event;

/// Number of snapshots kept before the oldest is dropped.
pub const HISTORY_DEPTH: usize = 20;

/// Store state captured before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub events: Vec<Event>,
    pub selected: Option<usize>,
}

/// Bounded stack of full event list snapshots.
///
/// A snapshot is pushed before every mutation. Undo pops it and the caller
/// replaces the live list wholesale; there is no redo.
#[derive(Debug, Clone)]
pub struct EventHistory {
    /// Past states, most recent last
    snapshots: Vec<Snapshot>,
    /// Maximum history size
    max_size: usize,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHistory {
    pub fn new() -> Self {
        Self::with_depth(HISTORY_DEPTH)
    }

    pub fn with_depth(max_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            max_size,
        }
    }

    /// Save current state before making a change
    pub fn push(&mut self, events: &[Event], selected: Option<usize>) {
        self.snapshots.push(Snapshot {
            events: events.to_vec(),
            selected,
        });
        if self.snapshots.len() > self.max_size {
            self.snapshots.remove(0);
        }
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
