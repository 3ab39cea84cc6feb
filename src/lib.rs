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

//! # Points Ledger
//!
//! This library settles a loyalty-points ledger: points earned from payers
//! are spent oldest first, no payer ever goes negative, and what is left is
//! reported per payer.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Earn entries ordered by timestamp, spends in arrival order
//! - [`Engine`]: Pre-flight guards and the oldest-first deduction
//! - [`Balances`]: Remaining points per payer after settling
//! - [`LedgerError`]: Error types for guard failures and invariant breaks
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDateTime;
//! use points_ledger::{Engine, Transaction};
//!
//! let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap();
//!
//! let mut engine = Engine::new();
//! engine.record(Transaction::new("DANNON", 1000, at("2020-11-02T14:00:00"))).unwrap();
//! engine.record(Transaction::new("UNILEVER", 200, at("2020-10-31T11:00:00"))).unwrap();
//! engine.record(Transaction::new("DANNON", -200, at("2020-10-31T15:00:00"))).unwrap();
//! engine.withdraw(500, at("2020-11-03T09:00:00")).unwrap();
//!
//! let balances = engine.settle().unwrap();
//! assert_eq!(balances.get("UNILEVER"), Some(0));
//! assert_eq!(balances.get("DANNON"), Some(500));
//! ```

pub mod balance;
mod base;
mod engine;
pub mod error;
pub mod ledger;
mod transaction;
mod transaction_queue;

pub use balance::{BalanceRow, Balances};
pub use base::{EntryId, Payer};
pub use engine::Engine;
pub use error::LedgerError;
pub use ledger::{EarnEntry, Ledger};
pub use transaction::{Transaction, TransactionKind};
pub use transaction_queue::TransactionQueue;
