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

//! Final per-payer balance report.

use crate::base::Payer;
use crate::ledger::Ledger;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Remaining points for one payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub payer: Payer,
    pub points: u64,
}

/// Payer → remaining points, in a fixed order.
///
/// Payers with points left come first, in the order their first available
/// entry was recorded. Payers whose entries all ran out follow with a
/// balance of zero, in the order they ran out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    rows: Vec<BalanceRow>,
    index: HashMap<Payer, usize>,
}

impl Balances {
    /// Builds the report from the current state of a ledger.
    ///
    /// Available entries contribute their residual. A payer only shows up
    /// with zero when one of its entries was exhausted and none is left;
    /// if nothing was exhausted no such backfill happens.
    pub fn tally(ledger: &Ledger) -> Self {
        let mut balances = Self::default();

        for entry in ledger.entries().iter().filter(|e| !e.is_exhausted()) {
            balances.credit(entry.payer(), entry.residual());
        }

        for id in ledger.exhausted() {
            if let Some(entry) = ledger.entry(*id) {
                if !balances.index.contains_key(entry.payer()) {
                    balances.credit(entry.payer(), 0);
                }
            }
        }

        balances
    }

    fn credit(&mut self, payer: &Payer, points: u64) {
        match self.index.get(payer) {
            Some(&slot) => self.rows[slot].points += points,
            None => {
                self.index.insert(payer.clone(), self.rows.len());
                self.rows.push(BalanceRow {
                    payer: payer.clone(),
                    points,
                });
            }
        }
    }

    /// Returns the balance for `payer`, or `None` if the payer is not reported.
    pub fn get(&self, payer: &str) -> Option<u64> {
        self.index
            .get(&Payer::from(payer))
            .map(|&slot| self.rows[slot].points)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BalanceRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every reported balance.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|row| row.points).sum()
    }
}

impl<'a> IntoIterator for &'a Balances {
    type Item = &'a BalanceRow;
    type IntoIter = std::slice::Iter<'a, BalanceRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Renders as `{DANNON: 1000, UNILEVER: 0}`.
impl fmt::Display for Balances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", row.payer, row.points)?;
        }
        f.write_str("}")
    }
}
