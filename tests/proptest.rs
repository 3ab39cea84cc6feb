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

//! Property-based tests for the deduction engine.
//!
//! These tests verify invariants that should hold for any ledger the
//! guards accept, and for any ledger they refuse.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use points_ledger::{Engine, Ledger, LedgerError};
use proptest::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

const PAYERS: [&str; 4] = ["DANNON", "UNILEVER", "MILLER COORS", "KRAFT"];

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 10, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// `(payer index, points, minutes after base)`; small time range forces ties.
fn arb_earn() -> impl Strategy<Value = (usize, i64, i64)> {
    (0..PAYERS.len(), 1i64..=1_000, 0i64..=500)
}

fn arb_spend() -> impl Strategy<Value = i64> {
    1i64..=800
}

fn build(earns: &[(usize, i64, i64)], spends: &[i64]) -> Ledger {
    let mut ledger = Ledger::new();
    for &(payer, points, minutes) in earns {
        ledger
            .record_earn(PAYERS[payer], points, base() + Duration::minutes(minutes))
            .unwrap();
    }
    for (i, &points) in spends.iter().enumerate() {
        ledger
            .record_spend("User", -points, base() + Duration::minutes(i as i64))
            .unwrap();
    }
    ledger
}

// =============================================================================
// Settlement Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Remaining points always equal earned minus spent.
    #[test]
    fn settlement_conserves_points(
        earns in prop::collection::vec(arb_earn(), 1..20),
        spends in prop::collection::vec(arb_spend(), 0..10),
    ) {
        let ledger = build(&earns, &spends);
        let earned = ledger.earned_total();
        let spent = ledger.spent_total();
        prop_assume!(earned >= spent);

        let mut engine = Engine::from_ledger(ledger);
        let balances = engine.settle().unwrap();

        prop_assert_eq!(balances.total(), earned - spent);
        let residuals: u64 = engine.ledger().entries().iter().map(|e| e.residual()).sum();
        prop_assert_eq!(residuals, earned - spent);
    }

    /// Residuals only shrink, and exhausted entries are exactly the empty ones.
    #[test]
    fn residuals_stay_within_bounds(
        earns in prop::collection::vec(arb_earn(), 1..20),
        spends in prop::collection::vec(arb_spend(), 0..10),
    ) {
        let ledger = build(&earns, &spends);
        prop_assume!(ledger.earned_total() >= ledger.spent_total());

        let mut engine = Engine::from_ledger(ledger);
        engine.settle().unwrap();

        for entry in engine.ledger().entries() {
            prop_assert!(entry.residual() <= entry.original());
            prop_assert_eq!(entry.is_exhausted(), entry.residual() == 0);
        }
        let unique: HashSet<_> = engine.ledger().exhausted().iter().collect();
        prop_assert_eq!(unique.len(), engine.ledger().exhausted().len());
    }

    /// In time order, entries read: exhausted, at most one partial, untouched.
    #[test]
    fn oldest_points_are_spent_first(
        earns in prop::collection::vec(arb_earn(), 1..20),
        spends in prop::collection::vec(arb_spend(), 0..10),
    ) {
        let ledger = build(&earns, &spends);
        prop_assume!(ledger.earned_total() >= ledger.spent_total());

        let mut engine = Engine::from_ledger(ledger);
        engine.settle().unwrap();

        let mut ordered: Vec<_> = engine.ledger().entries().iter().enumerate().collect();
        ordered.sort_by_key(|(i, e)| (e.timestamp(), *i));

        // 0 = exhausted, 1 = partially spent, 2 = untouched
        let stages: Vec<u8> = ordered
            .iter()
            .map(|(_, e)| match e.residual() {
                0 => 0,
                r if r < e.original() => 1,
                _ => 2,
            })
            .collect();
        prop_assert!(stages.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(stages.iter().filter(|&&s| s == 1).count() <= 1);
    }

    /// Every payer that ever earned is reported exactly once.
    #[test]
    fn every_payer_is_reported(
        earns in prop::collection::vec(arb_earn(), 1..20),
        spends in prop::collection::vec(arb_spend(), 0..10),
    ) {
        let ledger = build(&earns, &spends);
        prop_assume!(ledger.earned_total() >= ledger.spent_total());

        let payers: HashSet<_> = earns.iter().map(|&(p, _, _)| PAYERS[p]).collect();
        let mut engine = Engine::from_ledger(ledger);
        let balances = engine.settle().unwrap();

        prop_assert_eq!(balances.len(), payers.len());
        for payer in payers {
            prop_assert!(balances.get(payer).is_some());
        }
    }

    /// A refused settlement mutates nothing.
    #[test]
    fn insufficient_funds_mutates_nothing(
        earns in prop::collection::vec(arb_earn(), 1..10),
        extra in 1u64..=1_000,
    ) {
        let ledger = build(&earns, &[]);
        let earned = ledger.earned_total();

        let mut engine = Engine::from_ledger(ledger);
        engine.withdraw(earned + extra, base()).unwrap();

        prop_assert_eq!(
            engine.settle(),
            Err(LedgerError::InsufficientFunds { available: earned, requested: earned + extra })
        );
        for entry in engine.ledger().entries() {
            prop_assert_eq!(entry.residual(), entry.original());
        }
        prop_assert!(engine.ledger().exhausted().is_empty());
    }
}
