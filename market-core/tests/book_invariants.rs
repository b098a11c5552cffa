//! End-to-end invariant checks against a bare [`Book`], independent of the
//! manager/aggregator plumbing.

use market_core::{Book, Price, Quantity, Side, Symbol, Timestamp};

fn px(v: f64) -> Price {
    Price::from_f64(v)
}

#[test]
fn level_quantity_never_goes_negative_under_repeated_deletes() {
    let book = Book::new(Symbol::new("AAPL"));
    book.apply_add(px(100.0), Quantity::new(50), Side::Buy, Timestamp::ZERO);

    // Delete more than is resting: saturates at zero and drops the level
    // rather than underflowing.
    book.apply_delete(px(100.0), Quantity::new(500), Side::Buy, Timestamp::ZERO);
    book.apply_delete(px(100.0), Quantity::new(1), Side::Buy, Timestamp::ZERO);

    assert_eq!(book.best_bid(), Price::ZERO);
}

#[test]
fn best_bid_ask_track_the_book_extremum_through_a_sequence_of_adds() {
    let book = Book::new(Symbol::new("AAPL"));
    let prices = [99.0, 101.0, 98.5, 100.5, 97.0];
    for p in prices {
        book.apply_add(px(p), Quantity::new(10), Side::Buy, Timestamp::ZERO);
    }
    assert_eq!(book.best_bid(), px(101.0));

    for p in [105.0, 103.0, 106.0] {
        book.apply_add(px(p), Quantity::new(10), Side::Sell, Timestamp::ZERO);
    }
    assert_eq!(book.best_ask(), px(103.0));
}

#[test]
fn vwap_matches_volume_weighted_average_across_several_trades() {
    let book = Book::new(Symbol::new("AAPL"));
    let trades = [(100.0, 10u64), (102.0, 30u64), (98.0, 20u64)];
    for (price, qty) in trades {
        book.apply_trade(Timestamp::ZERO, px(price), Quantity::new(qty)).unwrap();
    }

    let expected_vwap = (100.0 * 10.0 + 102.0 * 30.0 + 98.0 * 20.0) / 60.0;
    let stats = book.get_statistics();
    assert_eq!(stats.total_volume, Quantity::new(60));
    assert!((stats.vwap.to_f64() - expected_vwap).abs() < 1e-6);
}

#[test]
fn snapshot_fully_replaces_prior_book_state() {
    let book = Book::new(Symbol::new("AAPL"));
    book.apply_add(px(90.0), Quantity::new(5), Side::Buy, Timestamp::ZERO);
    book.apply_add(px(110.0), Quantity::new(5), Side::Sell, Timestamp::ZERO);

    book.apply_snapshot(
        Timestamp::ZERO,
        &[(px(100.0), Quantity::new(20)), (px(99.0), Quantity::new(15))],
        &[(px(101.0), Quantity::new(25))],
    );

    assert_eq!(book.best_bid(), px(100.0));
    assert_eq!(book.best_ask(), px(101.0));
    // The pre-snapshot 90.0 level must be gone.
    assert!(book.top_n_bids(10).iter().all(|l| l.price != px(90.0)));
}

#[test]
fn crossed_book_is_flagged_but_not_corrected() {
    let book = Book::new(Symbol::new("AAPL"));
    book.apply_quote(Timestamp::ZERO, px(101.0), px(100.0), Quantity::new(1), Quantity::new(1));
    assert!(book.is_crossed());
    // The engine never auto-corrects a crossed book; it only flags it.
    assert_eq!(book.best_bid(), px(101.0));
    assert_eq!(book.best_ask(), px(100.0));
}

#[test]
fn liquidity_within_bps_only_counts_levels_inside_the_band() {
    let book = Book::new(Symbol::new("AAPL"));
    book.apply_quote(Timestamp::ZERO, px(100.0), px(100.02), Quantity::new(1), Quantity::new(1));
    book.apply_add(px(99.0), Quantity::new(1000), Side::Buy, Timestamp::ZERO);
    book.apply_add(px(50.0), Quantity::new(1000), Side::Buy, Timestamp::ZERO);

    let (bid_liq, _ask_liq) = book.liquidity_within_bps(200); // 2%
    // 99.0 is within 2% of mid ~100.01; 50.0 is far outside.
    assert!(bid_liq.raw() >= 1000);
    assert!(bid_liq.raw() < 2000);
}
