//! Property-based tests for the quantified invariants in spec §8, run
//! over random interleavings rather than fixed scenarios.

use market_core::{Book, Price, Quantity, Side, Symbol, Timestamp};
use proptest::prelude::*;

fn px(raw: i64) -> Price {
    Price::from_raw(raw)
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add { price: i64, qty: u64 },
    Delete { price: i64, qty: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..200, 1u64..1000).prop_map(|(price, qty)| Op::Add { price, qty }),
        (1i64..200, 1u64..1000).prop_map(|(price, qty)| Op::Delete { price, qty }),
    ]
}

proptest! {
    /// For any interleaving of add/delete on one side of one book, the
    /// sum of resting quantity across all remaining levels equals the
    /// algebraic sum of added minus deleted quantity, clamped at zero per
    /// level (spec §8, first bullet).
    #[test]
    fn total_side_quantity_matches_added_minus_deleted_clamped(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let book = Book::new(Symbol::new("AAPL"));
        let mut per_level_expected: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();

        for op in &ops {
            match *op {
                Op::Add { price, qty } => {
                    book.apply_add(px(price), Quantity::new(qty), Side::Buy, Timestamp::ZERO);
                    *per_level_expected.entry(price).or_insert(0) += qty as i64;
                }
                Op::Delete { price, qty } => {
                    book.apply_delete(px(price), Quantity::new(qty), Side::Buy, Timestamp::ZERO);
                    let entry = per_level_expected.entry(price).or_insert(0);
                    *entry = (*entry - qty as i64).max(0);
                }
            }
        }

        let observed_total: u64 = book.top_n_bids(usize::MAX).iter().map(|l| l.total_quantity.raw()).sum();
        let expected_total: i64 = per_level_expected.values().sum();
        prop_assert_eq!(observed_total as i64, expected_total);

        // No resting level is ever observed at zero quantity (spec §3 invariant).
        for level in book.top_n_bids(usize::MAX) {
            prop_assert!(level.total_quantity.raw() > 0);
        }
    }

    /// After any sequence of adds/deletes on both sides, the cached best
    /// price always equals the true extremum of the underlying levels,
    /// using zero as the empty-side sentinel (spec §8, second bullet).
    #[test]
    fn best_price_cache_tracks_true_extremum(
        bid_ops in prop::collection::vec((1i64..500, 1u64..500), 0..100),
        ask_ops in prop::collection::vec((1i64..500, 1u64..500), 0..100),
    ) {
        let book = Book::new(Symbol::new("AAPL"));
        let mut bid_levels: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();
        let mut ask_levels: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();

        for (price, qty) in bid_ops {
            book.apply_add(px(price), Quantity::new(qty), Side::Buy, Timestamp::ZERO);
            *bid_levels.entry(price).or_insert(0) += qty as i64;
        }
        for (price, qty) in ask_ops {
            book.apply_add(px(price), Quantity::new(qty), Side::Sell, Timestamp::ZERO);
            *ask_levels.entry(price).or_insert(0) += qty as i64;
        }

        let expected_best_bid = bid_levels.keys().copied().max().unwrap_or(0);
        let expected_best_ask = ask_levels.keys().copied().min().unwrap_or(0);

        prop_assert_eq!(book.best_bid().raw(), expected_best_bid);
        prop_assert_eq!(book.best_ask().raw(), expected_best_ask);
    }

    /// VWAP round-trip: `vwap * total_volume` recovers `Σ(price_i * qty_i)`
    /// within one unit of least precision of the 128-bit accumulator
    /// (spec §8, third bullet).
    #[test]
    fn vwap_round_trips_against_the_raw_value_sum(
        trades in prop::collection::vec((1i64..1_000_000, 1u64..10_000), 1..100),
    ) {
        let book = Book::new(Symbol::new("AAPL"));
        let mut total_value: i128 = 0;
        let mut total_qty: i128 = 0;

        for (price, qty) in trades {
            book.apply_trade(Timestamp::ZERO, px(price), Quantity::new(qty)).unwrap();
            total_value += price as i128 * qty as i128;
            total_qty += qty as i128;
        }

        let stats = book.get_statistics();
        let reconstructed = stats.vwap.raw() as i128 * total_qty;
        // Integer division truncates; allow slack proportional to volume
        // for the accumulated rounding across `total_qty` trades.
        let slack = total_qty.max(1);
        prop_assert!((reconstructed - total_value).abs() <= slack);
    }

    /// A delete or modify against a level that never existed, or that has
    /// less quantity than requested, never panics and never drives a
    /// level negative — it clamps to zero and removes the level (spec
    /// §4.2, §7).
    #[test]
    fn delete_against_undersized_or_missing_level_never_panics(
        initial_qty in 0u64..1000,
        delete_qty in 0u64..2000,
    ) {
        let book = Book::new(Symbol::new("AAPL"));
        if initial_qty > 0 {
            book.apply_add(px(100), Quantity::new(initial_qty), Side::Buy, Timestamp::ZERO);
        }
        book.apply_delete(px(100), Quantity::new(delete_qty), Side::Buy, Timestamp::ZERO);

        if delete_qty >= initial_qty {
            prop_assert_eq!(book.best_bid(), Price::ZERO);
        } else {
            prop_assert_eq!(book.best_bid().raw(), 100);
        }
    }
}
