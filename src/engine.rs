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

//! Deduction engine.
//!
//! The [`Engine`] owns a [`Ledger`] for one settlement run. Settling:
//!
//! 1. runs the pre-flight guards against the ledger's running totals,
//! 2. applies every spend in recorded order, always drawing from the oldest
//!    earn entry that still has points,
//! 3. reports what is left per payer.
//!
//! A failed guard leaves every residual untouched.

use crate::balance::Balances;
use crate::base::Payer;
use crate::ledger::Ledger;
use crate::{LedgerError, Transaction};
use chrono::NaiveDateTime;
use log::{debug, info};

/// Oldest-first points deduction over a single ledger.
///
/// # Invariants
///
/// - Spends are applied in the order they were recorded, never by timestamp.
/// - An earn entry is drained completely before any later entry is touched.
/// - A residual that reaches zero is exhausted right away and never reused.
/// - After settling, remaining points equal earned minus spent.
#[derive(Debug, Default)]
pub struct Engine {
    ledger: Ledger,
    settled: bool,
}

impl Engine {
    /// Creates an engine with an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes over a ledger that was filled elsewhere.
    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            ledger,
            settled: false,
        }
    }

    /// Records an earn or spend transaction depending on its sign.
    pub fn record(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        if self.settled {
            return Err(LedgerError::AlreadySettled);
        }
        self.ledger.record(transaction)
    }

    /// Queues the caller's own withdrawal as a spend by [`Payer::USER`].
    ///
    /// Call this after all file-derived transactions so it is applied last.
    pub fn withdraw(&mut self, points: u64, timestamp: NaiveDateTime) -> Result<(), LedgerError> {
        if self.settled {
            return Err(LedgerError::AlreadySettled);
        }
        let points = i64::try_from(points).map_err(|_| LedgerError::PointsOverflow)?;
        self.ledger
            .record_spend(Payer::from(Payer::USER), -points, timestamp)
    }

    /// Checks that the recorded spends can be covered.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyLedger`] - no earn transaction was recorded.
    /// - [`LedgerError::InsufficientFunds`] - spends exceed the points still
    ///   available.
    pub fn preflight(&self) -> Result<(), LedgerError> {
        if self.ledger.earn_count() == 0 {
            return Err(LedgerError::EmptyLedger);
        }
        // Points already taken out of the ledger are no longer spendable.
        let available = self.ledger.remaining_total();
        let requested = self.ledger.spent_total();
        if available < requested {
            return Err(LedgerError::InsufficientFunds { available, requested });
        }
        Ok(())
    }

    /// Runs the guards, applies every spend and returns the balances.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyLedger`] / [`LedgerError::InsufficientFunds`] -
    ///   a guard failed; nothing was deducted.
    /// - [`LedgerError::AlreadySettled`] - this engine already settled.
    /// - [`LedgerError::EngineInvariantViolation`] - the engine ran out of
    ///   earn entries despite the guards passing.
    pub fn settle(&mut self) -> Result<Balances, LedgerError> {
        if self.settled {
            return Err(LedgerError::AlreadySettled);
        }
        if let Err(e) = self.preflight() {
            info!("Settlement refused: {e}");
            return Err(e);
        }
        info!(
            "Settling {} spend(s) totalling {} against {} available point(s)",
            self.ledger.spends().len(),
            self.ledger.spent_total(),
            self.ledger.remaining_total()
        );

        let available = self.ledger.remaining_total();
        // Spends are read up front; applying them only touches earn entries.
        let needs: Vec<u64> = self.ledger.spends().iter().map(|s| s.magnitude()).collect();
        for need in needs {
            self.apply_spend(need)?;
        }
        self.settled = true;

        self.ledger.assert_invariants();
        debug_assert_eq!(
            self.ledger.remaining_total(),
            available - self.ledger.spent_total()
        );
        Ok(self.ledger.final_balances())
    }

    /// Draws `need` points from the oldest available entries.
    fn apply_spend(&mut self, mut need: u64) -> Result<(), LedgerError> {
        while need > 0 {
            let id = self.ledger.earliest_available_earn().ok_or(
                LedgerError::EngineInvariantViolation("no earn entry left to deduct from"),
            )?;
            let residual = self
                .ledger
                .residual(id)
                .ok_or(LedgerError::EngineInvariantViolation("unknown earn entry"))?;

            let taken = residual.min(need);
            let left = self.ledger.deduct(id, taken)?;
            need -= taken;
            debug!("Deducted {taken} from entry {id}, {left} left, {need} still needed");

            if left == 0 {
                self.ledger.mark_exhausted(id)?;
            }
        }
        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

impl From<Ledger> for Engine {
    fn from(ledger: Ledger) -> Self {
        Self::from_ledger(ledger)
    }
}
