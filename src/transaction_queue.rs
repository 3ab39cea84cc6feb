// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Earliest-first queue of available earn entries.
//!
//! Holds only handles into the ledger arena, never the entries themselves,
//! so a residual is mutated in exactly one place.

use crate::base::EntryId;
use chrono::NaiveDateTime;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A min-heap of earn entries keyed by `(timestamp, entry id)`.
///
/// Entry ids grow with insertion order, so entries sharing a timestamp come
/// out in the order they were recorded. `peek` is O(1), `push` and `pop`
/// are O(log n).
#[derive(Debug, Default)]
pub struct TransactionQueue {
    heap: BinaryHeap<Reverse<(NaiveDateTime, EntryId)>>,
}

impl TransactionQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, timestamp: NaiveDateTime, id: EntryId) {
        self.heap.push(Reverse((timestamp, id)));
    }

    /// Returns the earliest entry without removing it.
    pub fn peek(&self) -> Option<EntryId> {
        self.heap.peek().map(|Reverse((_, id))| *id)
    }

    /// Removes and returns the earliest entry.
    pub fn pop(&mut self) -> Option<EntryId> {
        self.heap.pop().map(|Reverse((_, id))| id)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
