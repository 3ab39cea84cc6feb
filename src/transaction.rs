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

//! Ledger transactions.
//!
//! A transaction's sign decides its role:
//! - positive points are an [`Earn`](TransactionKind::Earn),
//! - negative points are a [`Spend`](TransactionKind::Spend).

use crate::base::Payer;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Earn,
    Spend,
}

/// A single ledger line as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub payer: Payer,
    pub points: i64,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn new(payer: impl Into<Payer>, points: i64, timestamp: NaiveDateTime) -> Self {
        Self {
            payer: payer.into(),
            points,
            timestamp,
        }
    }

    /// Zero points counts as an earn, matching how input rows are split.
    pub fn kind(&self) -> TransactionKind {
        if self.points < 0 {
            TransactionKind::Spend
        } else {
            TransactionKind::Earn
        }
    }

    /// Absolute number of points this transaction moves.
    pub fn magnitude(&self) -> u64 {
        self.points.unsigned_abs()
    }
}
