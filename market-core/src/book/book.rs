use super::level::BookLevel;
use super::stats::Statistics;
use crate::clock;
use crate::errors::BookInvariantViolation;
use crate::types::{Price, Quantity, Side, Symbol, Timestamp};

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A book's coarse observable lifecycle (spec §4.2). It is derived from
/// current level occupancy rather than tracked as separate state, so it can
/// never drift from the underlying maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    Empty,
    Active,
}

/// Depth window used by [`Book::imbalance`] (spec §4.2: "top-5 levels").
const IMBALANCE_DEPTH: usize = 5;

/// Queue-position estimate for a resting order at a given level, assuming
/// FIFO and worst-case (back-of-queue) placement. Supplemental read-only
/// analytic, not part of the core contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuePosition {
    pub size_ahead: Quantity,
    pub total_size: Quantity,
    pub position_ratio: f64,
}

impl QueuePosition {
    /// Linear interpolation between a front-of-queue and back-of-queue fill
    /// rate. A coarse estimate, not a guarantee.
    pub fn fill_probability(&self) -> f64 {
        const FRONT_RATE: f64 = 0.8;
        const BACK_RATE: f64 = 0.4;
        FRONT_RATE + (BACK_RATE - FRONT_RATE) * self.position_ratio
    }
}

/// One symbol's price-aggregated order book.
///
/// `bids`/`asks` are kept in a [`BTreeMap`] keyed by raw scaled price so
/// that the best level on either side is a `O(log n)` extremum lookup;
/// `cached_best_bid`/`cached_best_ask` mirror that extremum in a pair of
/// atomics so readers needing only top-of-book never take a lock (spec
/// §4.2, §5).
pub struct Book {
    symbol: Symbol,
    bids: RwLock<BTreeMap<i64, BookLevel>>,
    asks: RwLock<BTreeMap<i64, BookLevel>>,
    cached_best_bid: AtomicI64,
    cached_best_ask: AtomicI64,
    stats: Mutex<Statistics>,
    update_count: AtomicU64,
    latency_sum_ns: AtomicU64,
    last_update_ts: AtomicU64,
    last_sequence: AtomicU64,
}

impl Book {
    pub fn new(symbol: Symbol) -> Self {
        Book {
            symbol,
            bids: RwLock::new(BTreeMap::new()),
            asks: RwLock::new(BTreeMap::new()),
            cached_best_bid: AtomicI64::new(0),
            cached_best_ask: AtomicI64::new(0),
            stats: Mutex::new(Statistics::default()),
            update_count: AtomicU64::new(0),
            latency_sum_ns: AtomicU64::new(0),
            last_update_ts: AtomicU64::new(0),
            last_sequence: AtomicU64::new(0),
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    fn side_map(&self, side: Side) -> &RwLock<BTreeMap<i64, BookLevel>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn refresh_best_price(&self, side: Side) {
        match side {
            Side::Buy => {
                let best = self.bids.read().keys().next_back().copied().unwrap_or(0);
                self.cached_best_bid.store(best, Ordering::Release);
            }
            Side::Sell => {
                let best = self.asks.read().keys().next().copied().unwrap_or(0);
                self.cached_best_ask.store(best, Ordering::Release);
            }
        }
    }

    fn record_update(&self, ts: Timestamp) {
        self.update_count.fetch_add(1, Ordering::Relaxed);
        let elapsed = clock::now().saturating_since(ts);
        self.latency_sum_ns.fetch_add(elapsed, Ordering::Relaxed);
        self.last_update_ts.store(ts.as_nanos(), Ordering::Relaxed);
    }

    fn record_spread(&self) {
        let spread = self.spread();
        self.stats.lock().record_spread(spread);
    }

    // -- mutation ---------------------------------------------------------

    /// Increases the level at `price` by `qty`, creating it if absent.
    pub fn apply_add(&self, price: Price, qty: Quantity, side: Side, ts: Timestamp) {
        {
            let mut map = self.side_map(side).write();
            map.entry(price.raw())
                .and_modify(|level| {
                    level.total_quantity = level.total_quantity.saturating_add(qty);
                    level.order_count += 1;
                })
                .or_insert_with(|| BookLevel::new(price, qty));
        }
        self.refresh_best_price(side);
        self.record_spread();
        self.record_update(ts);
    }

    /// Reduces the level at `old_price` by `new_qty` (the upstream protocol
    /// is aggregate-level, so a modify decrements rather than replaces —
    /// preserved literally per spec §9's open question), removing it if the
    /// result is zero, then adds `new_qty` at `new_price`.
    pub fn apply_modify(
        &self,
        old_price: Price,
        new_price: Price,
        new_qty: Quantity,
        side: Side,
        ts: Timestamp,
    ) {
        {
            let mut map = self.side_map(side).write();
            if let Some(level) = map.get_mut(&old_price.raw()) {
                level.total_quantity = level.total_quantity.saturating_sub(new_qty);
                if level.total_quantity.is_zero() {
                    map.remove(&old_price.raw());
                }
            }
        }
        self.refresh_best_price(side);
        self.apply_add(new_price, new_qty, side, ts);
    }

    /// Subtracts `qty` from the level at `price`, saturating at zero, and
    /// removes the level once empty. A delete against a missing level is a
    /// silent no-op (spec §4.2, §7: upstream resyncs via snapshots).
    pub fn apply_delete(&self, price: Price, qty: Quantity, side: Side, ts: Timestamp) {
        {
            let mut map = self.side_map(side).write();
            if let Some(level) = map.get_mut(&price.raw()) {
                level.total_quantity = level.total_quantity.saturating_sub(qty);
                if level.total_quantity.is_zero() {
                    map.remove(&price.raw());
                }
            }
        }
        self.refresh_best_price(side);
        self.record_spread();
        self.record_update(ts);
    }

    /// Updates statistics only; the book's levels are untouched.
    pub fn apply_trade(
        &self,
        ts: Timestamp,
        price: Price,
        quantity: Quantity,
    ) -> Result<(), BookInvariantViolation> {
        self.stats.lock().apply_trade(ts, price, quantity)?;
        self.record_update(ts);
        Ok(())
    }

    /// Replaces top-of-book with a single level per side from the quote.
    pub fn apply_quote(
        &self,
        ts: Timestamp,
        bid_px: Price,
        ask_px: Price,
        bid_sz: Quantity,
        ask_sz: Quantity,
    ) {
        {
            let mut bids = self.bids.write();
            bids.clear();
            if !bid_sz.is_zero() {
                bids.insert(bid_px.raw(), BookLevel::new(bid_px, bid_sz));
            }
        }
        {
            let mut asks = self.asks.write();
            asks.clear();
            if !ask_sz.is_zero() {
                asks.insert(ask_px.raw(), BookLevel::new(ask_px, ask_sz));
            }
        }
        self.refresh_best_price(Side::Buy);
        self.refresh_best_price(Side::Sell);
        self.record_spread();
        self.record_update(ts);
    }

    /// Fully replaces both sides; levels with zero quantity are dropped.
    pub fn apply_snapshot(
        &self,
        ts: Timestamp,
        bids: &[(Price, Quantity)],
        asks: &[(Price, Quantity)],
    ) {
        {
            let mut map = self.bids.write();
            map.clear();
            for &(price, qty) in bids {
                if !qty.is_zero() {
                    map.insert(price.raw(), BookLevel::new(price, qty));
                }
            }
        }
        {
            let mut map = self.asks.write();
            map.clear();
            for &(price, qty) in asks {
                if !qty.is_zero() {
                    map.insert(price.raw(), BookLevel::new(price, qty));
                }
            }
        }
        self.refresh_best_price(Side::Buy);
        self.refresh_best_price(Side::Sell);
        self.record_spread();
        self.record_update(ts);
    }

    // -- readers ------------------------------------------------------------

    #[inline]
    pub fn best_bid(&self) -> Price {
        Price::from_raw(self.cached_best_bid.load(Ordering::Acquire))
    }

    #[inline]
    pub fn best_ask(&self) -> Price {
        Price::from_raw(self.cached_best_ask.load(Ordering::Acquire))
    }

    pub fn mid_price(&self) -> Price {
        let (bid, ask) = (self.best_bid(), self.best_ask());
        if bid.is_zero() || ask.is_zero() {
            Price::ZERO
        } else {
            Price::from_raw((bid.raw() + ask.raw()) / 2)
        }
    }

    pub fn spread(&self) -> Price {
        let (bid, ask) = (self.best_bid(), self.best_ask());
        if bid.is_zero() || ask.is_zero() {
            Price::ZERO
        } else {
            ask - bid
        }
    }

    /// `(Σbid_qty − Σask_qty) / (Σbid_qty + Σask_qty)` over the top five
    /// levels per side; `0.0` when both sums are zero.
    pub fn imbalance(&self) -> f64 {
        let bid_qty: u64 = self
            .bids
            .read()
            .values()
            .rev()
            .take(IMBALANCE_DEPTH)
            .map(|l| l.total_quantity.raw())
            .sum();
        let ask_qty: u64 = self
            .asks
            .read()
            .values()
            .take(IMBALANCE_DEPTH)
            .map(|l| l.total_quantity.raw())
            .sum();

        let total = bid_qty + ask_qty;
        if total == 0 {
            return 0.0;
        }
        (bid_qty as f64 - ask_qty as f64) / total as f64
    }

    /// `(best_bid·ask_sz + best_ask·bid_sz) / (bid_sz + ask_sz)`, reverting
    /// to [`mid_price`](Self::mid_price) when either top-of-book size is
    /// zero.
    pub fn weighted_mid(&self) -> Price {
        let bid = self.best_bid();
        let ask = self.best_ask();
        if bid.is_zero() || ask.is_zero() {
            return Price::ZERO;
        }

        let bid_sz = self.bids.read().get(&bid.raw()).map(|l| l.total_quantity).unwrap_or(Quantity::ZERO);
        let ask_sz = self.asks.read().get(&ask.raw()).map(|l| l.total_quantity).unwrap_or(Quantity::ZERO);

        if bid_sz.is_zero() || ask_sz.is_zero() {
            return self.mid_price();
        }

        let numerator = (bid.raw() as i128) * (ask_sz.raw() as i128)
            + (ask.raw() as i128) * (bid_sz.raw() as i128);
        let denominator = (bid_sz.raw() + ask_sz.raw()) as i128;
        Price::from_raw((numerator / denominator) as i64)
    }

    pub fn top_n_bids(&self, n: usize) -> Vec<BookLevel> {
        self.bids.read().values().rev().take(n).copied().collect()
    }

    pub fn top_n_asks(&self, n: usize) -> Vec<BookLevel> {
        self.asks.read().values().take(n).copied().collect()
    }

    pub fn get_statistics(&self) -> Statistics {
        *self.stats.lock()
    }

    pub fn average_update_latency_ns(&self) -> u64 {
        let count = self.update_count.load(Ordering::Relaxed);
        if count == 0 {
            0
        } else {
            self.latency_sum_ns.load(Ordering::Relaxed) / count
        }
    }

    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::Relaxed)
    }

    pub fn last_update_ts(&self) -> Timestamp {
        Timestamp::from_nanos(self.last_update_ts.load(Ordering::Relaxed))
    }

    pub fn state(&self) -> BookState {
        if self.bids.read().is_empty() && self.asks.read().is_empty() {
            BookState::Empty
        } else {
            BookState::Active
        }
    }

    // -- supplemented read-only analytics (SPEC_FULL.md §G) -----------------

    /// `true` when the best bid is at or above the best ask — a state the
    /// book should never durably hold.
    pub fn is_crossed(&self) -> bool {
        let (bid, ask) = (self.best_bid(), self.best_ask());
        !bid.is_zero() && !ask.is_zero() && bid >= ask
    }

    pub fn is_locked(&self) -> bool {
        let (bid, ask) = (self.best_bid(), self.best_ask());
        !bid.is_zero() && bid == ask
    }

    /// Aggregated size within `bps` basis points of the mid price, summed
    /// across the full depth rather than a fixed level count.
    pub fn liquidity_within_bps(&self, bps: u32) -> (Quantity, Quantity) {
        let mid = self.mid_price();
        if mid.is_zero() {
            return (Quantity::ZERO, Quantity::ZERO);
        }

        let distance = (mid.raw().unsigned_abs() * bps as u64) / 10_000;
        let bid_threshold = mid.raw().saturating_sub(distance as i64);
        let ask_threshold = mid.raw().saturating_add(distance as i64);

        let bid_liquidity = self
            .bids
            .read()
            .range(bid_threshold..)
            .map(|(_, l)| l.total_quantity.raw())
            .fold(0u64, |acc, q| acc.saturating_add(q));

        let ask_liquidity = self
            .asks
            .read()
            .range(..=ask_threshold)
            .map(|(_, l)| l.total_quantity.raw())
            .fold(0u64, |acc, q| acc.saturating_add(q));

        (Quantity::new(bid_liquidity), Quantity::new(ask_liquidity))
    }

    /// Estimates queue position for a hypothetical order joining the back
    /// of the queue at `price`, or `None` if the level does not exist.
    pub fn estimate_queue_position(&self, side: Side, price: Price) -> Option<QueuePosition> {
        let map = self.side_map(side).read();
        let level = map.get(&price.raw())?;
        Some(QueuePosition {
            size_ahead: level.total_quantity,
            total_size: level.total_quantity,
            position_ratio: 1.0,
        })
    }

    /// Checks `new_sequence` against the last sequence observed for this
    /// book and records it, returning the gap size if one is detected.
    /// Pure bookkeeping: the engine never rejects or recovers on a gap.
    pub fn sequence_gap(&self, new_sequence: u64) -> Option<u64> {
        let last = self.last_sequence.swap(new_sequence, Ordering::Relaxed);
        if last == 0 {
            return None;
        }
        let expected = last + 1;
        if new_sequence > expected {
            Some(new_sequence - expected)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(v: f64) -> Price {
        Price::from_f64(v)
    }

    #[test]
    fn empty_book_readers_report_sentinel_zero() {
        let book = Book::new(Symbol::new("AAPL"));
        assert_eq!(book.mid_price(), Price::ZERO);
        assert_eq!(book.spread(), Price::ZERO);
        assert_eq!(book.imbalance(), 0.0);
        assert_eq!(book.weighted_mid(), Price::ZERO);
        assert_eq!(book.state(), BookState::Empty);
    }

    #[test]
    fn quote_establishes_top_of_book() {
        let book = Book::new(Symbol::new("AAPL"));
        book.apply_quote(
            Timestamp::ZERO,
            px(150.00),
            px(150.02),
            Quantity::new(500),
            Quantity::new(750),
        );

        assert_eq!(book.best_bid(), px(150.00));
        assert_eq!(book.best_ask(), px(150.02));
        assert_eq!(book.mid_price(), px(150.01));
        assert_eq!(book.spread(), px(0.02));
        assert!((book.weighted_mid().to_f64() - 150.008).abs() < 1e-6);
        assert_eq!(book.state(), BookState::Active);
    }

    #[test]
    fn trade_updates_stats_but_not_book() {
        let book = Book::new(Symbol::new("AAPL"));
        book.apply_quote(
            Timestamp::ZERO,
            px(150.00),
            px(150.02),
            Quantity::new(500),
            Quantity::new(750),
        );

        book.apply_trade(Timestamp::ZERO, px(150.01), Quantity::new(200)).unwrap();

        assert_eq!(book.best_bid(), px(150.00));
        assert_eq!(book.best_ask(), px(150.02));

        let stats = book.get_statistics();
        assert_eq!(stats.last_price, px(150.01));
        assert_eq!(stats.total_volume, Quantity::new(200));
        assert_eq!(stats.open, px(150.01));
        assert_eq!(stats.trade_count, 1);
    }

    #[test]
    fn imbalance_over_top_five_levels() {
        let book = Book::new(Symbol::new("AAPL"));
        for i in 0..5 {
            book.apply_add(px(100.0 - i as f64), Quantity::new(1000), Side::Buy, Timestamp::ZERO);
            book.apply_add(px(101.0 + i as f64), Quantity::new(500), Side::Sell, Timestamp::ZERO);
        }

        let imbalance = book.imbalance();
        assert!((imbalance - (5000.0 - 2500.0) / 7500.0).abs() < 1e-9);
    }

    #[test]
    fn delete_against_missing_level_is_a_silent_noop() {
        let book = Book::new(Symbol::new("AAPL"));
        book.apply_delete(px(100.0), Quantity::new(10), Side::Buy, Timestamp::ZERO);
        assert_eq!(book.best_bid(), Price::ZERO);
    }

    #[test]
    fn add_then_full_delete_removes_the_level() {
        let book = Book::new(Symbol::new("AAPL"));
        book.apply_add(px(100.0), Quantity::new(10), Side::Buy, Timestamp::ZERO);
        assert_eq!(book.best_bid(), px(100.0));

        book.apply_delete(px(100.0), Quantity::new(10), Side::Buy, Timestamp::ZERO);
        assert_eq!(book.best_bid(), Price::ZERO);
        assert_eq!(book.state(), BookState::Empty);
    }

    #[test]
    fn modify_decrements_old_level_then_adds_new_one() {
        let book = Book::new(Symbol::new("AAPL"));
        book.apply_add(px(100.0), Quantity::new(50), Side::Buy, Timestamp::ZERO);

        book.apply_modify(px(100.0), px(101.0), Quantity::new(20), Side::Buy, Timestamp::ZERO);

        // old level: 50 - 20 = 30, still present
        assert_eq!(book.top_n_bids(2).iter().find(|l| l.price == px(100.0)).unwrap().total_quantity, Quantity::new(30));
        assert_eq!(book.best_bid(), px(101.0));
    }

    #[test]
    fn crossed_and_locked_detection() {
        let book = Book::new(Symbol::new("AAPL"));
        book.apply_quote(Timestamp::ZERO, px(100.0), px(99.0), Quantity::new(1), Quantity::new(1));
        assert!(book.is_crossed());

        book.apply_quote(Timestamp::ZERO, px(100.0), px(100.0), Quantity::new(1), Quantity::new(1));
        assert!(book.is_locked());
    }

    #[test]
    fn sequence_gap_detects_skipped_sequences() {
        let book = Book::new(Symbol::new("AAPL"));
        assert_eq!(book.sequence_gap(100), None);
        assert_eq!(book.sequence_gap(101), None);
        assert_eq!(book.sequence_gap(105), Some(3));
    }
}
