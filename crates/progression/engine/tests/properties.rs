//! Property tests: resolution is total and monotonic, rewards floor exactly,
//! and the ledger never goes negative.

use std::sync::Arc;

use progression_engine::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Generate a valid tier table of 1..=6 tiers.
fn arb_table() -> impl Strategy<Value = TierTable> {
    prop::collection::vec((1u64..2_000, 1u32..50_000), 0..6).prop_map(|steps| {
        let base = TierTable::canonical().base().clone();
        let mut tiers = vec![base.clone()];
        let mut min_balance = 0;
        for (idx, (gap, basis_points)) in steps.into_iter().enumerate() {
            min_balance += gap;
            tiers.push(Tier {
                id: TierId(idx as u32 + 2),
                label: format!("Level {}", idx + 2),
                min_balance,
                multiplier: Multiplier::from_basis_points(basis_points).unwrap(),
                ..base.clone()
            });
        }
        TierTable::new(tiers).unwrap()
    })
}

fn arb_deltas() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-3_000i64..3_000, 1..40)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// b1 <= b2 implies resolve_tier(b1) <= resolve_tier(b2).
    #[test]
    fn resolution_is_monotonic(table in arb_table(), a in 0i64..20_000, b in 0i64..20_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(resolve_tier(&table, low).unwrap() <= resolve_tier(&table, high).unwrap());
    }

    /// Every balance resolves, to the highest tier whose threshold it meets.
    #[test]
    fn resolution_is_total_and_highest(table in arb_table(), balance in 0i64..i64::MAX) {
        let id = resolve_tier(&table, balance).unwrap();
        let expected = table
            .tiers()
            .iter()
            .filter(|t| t.min_balance <= balance as u64)
            .map(|t| t.id)
            .max()
            .unwrap();
        prop_assert_eq!(id, expected);
    }

    #[test]
    fn negative_balances_are_rejected(table in arb_table(), balance in i64::MIN..0) {
        prop_assert_eq!(
            resolve_tier(&table, balance),
            Err(ProgressionError::InvalidBalance(balance))
        );
    }

    /// resolve_permissions carries the table's multiplier.
    #[test]
    fn permissions_match_table_multiplier(table in arb_table()) {
        for tier in table.tiers() {
            let perms = resolve_permissions(&table, tier.id).unwrap();
            prop_assert_eq!(perms.multiplier, tier.multiplier);
        }
    }

    /// calculate_reward == floor(base * multiplier), checked in rationals.
    #[test]
    fn reward_is_floor_of_product(table in arb_table(), base in 1i64..1_000_000) {
        for tier in table.tiers() {
            let credited = calculate_reward(&table, base, tier.id).unwrap();
            let bp = tier.multiplier.basis_points() as u128;
            let exact_numerator = base as u128 * bp;
            prop_assert!(credited as u128 * 10_000 <= exact_numerator);
            prop_assert!((credited as u128 + 1) * 10_000 > exact_numerator);
        }
    }

    /// No sequence of deltas can drive a balance below zero; rejected
    /// debits leave balance, tier and history unchanged.
    #[test]
    fn ledger_never_goes_negative(table in arb_table(), opening in 0u64..5_000, deltas in arb_deltas()) {
        let ledger = BalanceLedger::with_balance(Arc::new(table), opening);
        for delta in deltas {
            let before = ledger.snapshot().unwrap();
            let history_len = ledger.history().unwrap().len();
            match ledger.apply_delta(delta) {
                Ok(outcome) => {
                    prop_assert_eq!(outcome.new_balance as i128, before.balance as i128 + delta as i128);
                }
                Err(ProgressionError::InsufficientBalance { balance, requested }) => {
                    prop_assert!(delta < 0);
                    prop_assert_eq!(balance, before.balance);
                    prop_assert_eq!(requested, delta.unsigned_abs());
                    prop_assert_eq!(ledger.snapshot().unwrap(), before);
                    prop_assert_eq!(ledger.history().unwrap().len(), history_len);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
            }
        }
    }

    /// A transition is raised exactly when the resolved tier changes, and
    /// points at the tier of the new balance.
    #[test]
    fn transitions_match_resolution(table in arb_table(), opening in 0u64..5_000, deltas in arb_deltas()) {
        let table = Arc::new(table);
        let ledger = BalanceLedger::with_balance(Arc::clone(&table), opening);
        for delta in deltas {
            let before = ledger.snapshot().unwrap();
            if let Ok(outcome) = ledger.apply_delta(delta) {
                let resolved = resolve_tier(&table, outcome.new_balance as i64).unwrap();
                match outcome.transition {
                    Some(transition) => {
                        prop_assert_eq!(transition.from_tier, before.tier);
                        prop_assert_eq!(transition.to_tier, resolved);
                        prop_assert_eq!(transition.balance_at_transition, outcome.new_balance);
                        prop_assert_ne!(transition.from_tier, transition.to_tier);
                    }
                    None => prop_assert_eq!(resolved, before.tier),
                }
            }
        }
    }
}
