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

//! Error types for ledger processing.

use thiserror::Error;

/// Ledger processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No earn transaction was ever recorded
    #[error("no available balance")]
    EmptyLedger,

    /// Requested spends exceed the points still available
    #[error("insufficient balance")]
    InsufficientFunds { available: u64, requested: u64 },

    /// The engine needed points but found no available earn transaction.
    ///
    /// Unreachable while the pre-flight guards hold; seeing it means the
    /// guards and the engine disagree.
    #[error("ledger invariant violated: {0}")]
    EngineInvariantViolation(&'static str),

    /// Earn points must be positive
    #[error("invalid points value {0}")]
    InvalidPoints(i64),

    /// Payer name is blank
    #[error("payer name must not be empty")]
    EmptyPayer,

    /// A running total no longer fits in 64 bits
    #[error("points total overflowed")]
    PointsOverflow,

    /// The engine has already produced its report
    #[error("ledger already settled")]
    AlreadySettled,
}

impl LedgerError {
    /// Returns `true` for the two user-facing pre-flight failures.
    pub fn is_guard_failure(&self) -> bool {
        matches!(self, Self::EmptyLedger | Self::InsufficientFunds { .. })
    }
}
