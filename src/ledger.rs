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

//! Ledger storage.
//!
//! Earn transactions live in a single arena and are referred to by
//! [`EntryId`] everywhere else: the availability queue and the exhausted
//! list only ever hold handles.
//!
//! ```text
//!  record_earn ──► arena + queue ──deduct──► residual shrinks
//!                                    │
//!                                    └──residual == 0──► mark_exhausted ──► exhausted list
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use points_ledger::Ledger;
//!
//! let at = NaiveDate::from_ymd_opt(2020, 11, 2).unwrap().and_hms_opt(14, 0, 0).unwrap();
//! let mut ledger = Ledger::new();
//! ledger.record_earn("DANNON", 300, at).unwrap();
//! assert_eq!(ledger.earned_total(), 300);
//! ```

use crate::balance::Balances;
use crate::base::{EntryId, Payer};
use crate::transaction::{Transaction, TransactionKind};
use crate::{LedgerError, TransactionQueue};
use chrono::NaiveDateTime;

/// An earn transaction together with what is left of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarnEntry {
    transaction: Transaction,
    residual: u64,
    exhausted: bool,
}

impl EarnEntry {
    pub fn payer(&self) -> &Payer {
        &self.transaction.payer
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.transaction.timestamp
    }

    /// Points granted when the transaction was recorded.
    pub fn original(&self) -> u64 {
        self.transaction.magnitude()
    }

    /// Points still available for spending.
    pub fn residual(&self) -> u64 {
        self.residual
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

}

/// Earn and spend transactions for a single settlement run.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Every earn entry ever recorded, indexed by [`EntryId`].
    entries: Vec<EarnEntry>,
    /// Entries with points left, earliest first.
    available: TransactionQueue,
    /// Spends in arrival order; this is also the order they are applied.
    spends: Vec<Transaction>,
    /// Fully consumed entries in the order they ran out.
    exhausted: Vec<EntryId>,
    earned_total: u64,
    spent_total: u64,
    /// Points removed from residuals so far.
    consumed: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn assert_entry_invariants(&self, id: EntryId) {
        let entry = &self.entries[id.0];
        debug_assert!(
            entry.residual <= entry.original(),
            "Invariant violated: residual of {id} grew above its original points"
        );
        debug_assert!(
            self.consumed <= self.earned_total,
            "Invariant violated: consumed more points than were earned"
        );
    }

    /// Full consistency scan over every entry.
    pub(crate) fn assert_invariants(&self) {
        debug_assert!(
            self.entries.iter().all(|e| e.residual <= e.original()),
            "Invariant violated: residual grew above its original points"
        );
        debug_assert_eq!(
            self.entries.iter().map(|e| e.residual).sum::<u64>() + self.consumed,
            self.earned_total,
            "Invariant violated: residuals and consumed points do not add up"
        );
    }

    /// Records a transaction, routing it by the sign of its points.
    pub fn record(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        match transaction.kind() {
            TransactionKind::Earn => self
                .record_earn(transaction.payer, transaction.points, transaction.timestamp)
                .map(|_| ()),
            TransactionKind::Spend => {
                self.record_spend(transaction.payer, transaction.points, transaction.timestamp)
            }
        }
    }

    /// Adds an earn transaction to the availability queue.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidPoints`] - `points` is not positive.
    /// - [`LedgerError::EmptyPayer`] - the payer name is blank.
    /// - [`LedgerError::PointsOverflow`] - the earn total no longer fits.
    pub fn record_earn(
        &mut self,
        payer: impl Into<Payer>,
        points: i64,
        timestamp: NaiveDateTime,
    ) -> Result<EntryId, LedgerError> {
        let payer = payer.into();
        if points <= 0 {
            return Err(LedgerError::InvalidPoints(points));
        }
        if payer.is_empty() {
            return Err(LedgerError::EmptyPayer);
        }
        let earned_total = self
            .earned_total
            .checked_add(points.unsigned_abs())
            .ok_or(LedgerError::PointsOverflow)?;

        let id = EntryId(self.entries.len());
        self.entries.push(EarnEntry {
            transaction: Transaction::new(payer, points, timestamp),
            residual: points.unsigned_abs(),
            exhausted: false,
        });
        self.available.push(timestamp, id);
        self.earned_total = earned_total;
        self.assert_entry_invariants(id);
        Ok(id)
    }

    /// Appends a spend transaction.
    ///
    /// `points` may be given either as the negative ledger value or as the
    /// magnitude to subtract. The timestamp is kept for reference only:
    /// spends are applied in call order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyPayer`] - the payer name is blank.
    /// - [`LedgerError::PointsOverflow`] - the spend total no longer fits.
    pub fn record_spend(
        &mut self,
        payer: impl Into<Payer>,
        points: i64,
        timestamp: NaiveDateTime,
    ) -> Result<(), LedgerError> {
        let payer = payer.into();
        if payer.is_empty() {
            return Err(LedgerError::EmptyPayer);
        }
        let spent_total = self
            .spent_total
            .checked_add(points.unsigned_abs())
            .ok_or(LedgerError::PointsOverflow)?;

        let points = if points > 0 { -points } else { points };
        self.spends.push(Transaction::new(payer, points, timestamp));
        self.spent_total = spent_total;
        Ok(())
    }

    /// Returns the oldest entry that still has points, if any.
    ///
    /// Entries sharing a timestamp are returned in the order they were
    /// recorded.
    pub fn earliest_available_earn(&self) -> Option<EntryId> {
        self.available.peek()
    }

    /// Removes up to the whole residual of an available entry.
    ///
    /// Returns the residual left afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EngineInvariantViolation`] if the entry is
    /// unknown, already exhausted, or holds fewer than `points`.
    pub fn deduct(&mut self, id: EntryId, points: u64) -> Result<u64, LedgerError> {
        let entry = self
            .entries
            .get_mut(id.0)
            .ok_or(LedgerError::EngineInvariantViolation("unknown earn entry"))?;
        if entry.exhausted {
            return Err(LedgerError::EngineInvariantViolation(
                "deducting from an exhausted entry",
            ));
        }
        if entry.residual < points {
            return Err(LedgerError::EngineInvariantViolation(
                "deduction exceeds the entry residual",
            ));
        }
        entry.residual -= points;
        let residual = entry.residual;
        self.consumed += points;
        self.assert_entry_invariants(id);
        Ok(residual)
    }

    /// Moves a fully consumed entry out of the availability queue.
    ///
    /// Only the earliest available entry can run out, so `id` must be the
    /// current head of the queue and its residual must be zero. Each entry
    /// can be exhausted once.
    pub fn mark_exhausted(&mut self, id: EntryId) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .get(id.0)
            .ok_or(LedgerError::EngineInvariantViolation("unknown earn entry"))?;
        if entry.exhausted {
            return Err(LedgerError::EngineInvariantViolation(
                "entry exhausted twice",
            ));
        }
        if entry.residual != 0 {
            return Err(LedgerError::EngineInvariantViolation(
                "exhausting an entry with points left",
            ));
        }
        if self.available.peek() != Some(id) {
            return Err(LedgerError::EngineInvariantViolation(
                "exhausted entry is not the earliest available",
            ));
        }

        self.available.pop();
        self.entries[id.0].exhausted = true;
        self.exhausted.push(id);
        Ok(())
    }

    /// Remaining points per payer. See [`Balances::tally`].
    pub fn final_balances(&self) -> Balances {
        Balances::tally(self)
    }

    pub fn entry(&self, id: EntryId) -> Option<&EarnEntry> {
        self.entries.get(id.0)
    }

    pub fn residual(&self, id: EntryId) -> Option<u64> {
        self.entry(id).map(EarnEntry::residual)
    }

    /// Every earn entry in the order it was recorded.
    pub fn entries(&self) -> &[EarnEntry] {
        &self.entries
    }

    pub fn spends(&self) -> &[Transaction] {
        &self.spends
    }

    /// Exhausted entries in the order they ran out.
    pub fn exhausted(&self) -> &[EntryId] {
        &self.exhausted
    }

    pub fn earn_count(&self) -> usize {
        self.entries.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Sum of all earn points ever recorded.
    pub fn earned_total(&self) -> u64 {
        self.earned_total
    }

    /// Sum of all spend magnitudes ever recorded.
    pub fn spent_total(&self) -> u64 {
        self.spent_total
    }

    /// Sum of the residuals still available.
    pub fn remaining_total(&self) -> u64 {
        self.earned_total - self.consumed
    }
}
