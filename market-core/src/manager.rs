//! Symbol-keyed table of [`Book`]s with read-mostly concurrent access
//! (spec §4.3).

use crate::book::Book;
use crate::clock;
use crate::types::{Message, Symbol};
use crate::wire::TimeCalibration;

use dashmap::DashMap;
use serde::Serialize;

/// One resting price level as shipped to the fan-out layer (spec §6:
/// `{"price": n, "quantity": n, "orders": n}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthLevelView {
    pub price: f64,
    pub quantity: u64,
    pub orders: u32,
}

/// The `statistics` sub-object of a per-symbol snapshot document (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsView {
    pub last_price: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub vwap: f64,
    pub volume: u64,
    pub trade_count: u64,
    pub volatility: f64,
}

/// The full per-symbol JSON document shipped to the fan-out layer (spec
/// §6). This crate only builds the document's data; the external
/// fan-out server (out of scope) owns the HTTP/WebSocket transport.
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshotView {
    pub symbol: String,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    pub best_bid: f64,
    pub best_ask: f64,
    pub mid_price: f64,
    pub spread: f64,
    pub weighted_mid: f64,
    pub imbalance: f64,
    pub bids: Vec<DepthLevelView>,
    pub asks: Vec<DepthLevelView>,
    pub statistics: StatisticsView,
}

/// Default depth per side in a [`BookSnapshotView`] (spec §6: "up to 10 levels").
pub const DEFAULT_SNAPSHOT_DEPTH: usize = 10;

/// One symbol's consolidated view, as shipped to the fan-out layer (spec
/// §6).
#[derive(Debug, Clone, Serialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub best_bid: f64,
    pub best_ask: f64,
    pub mid_price: f64,
    pub spread: f64,
    pub imbalance: f64,
    pub volume: u64,
    pub trade_count: u64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub total_symbols: usize,
    pub total_updates: u64,
    #[serde(rename = "timestamp")]
    pub timestamp_ns: u64,
    pub symbols: Vec<SymbolSummary>,
}

fn build_snapshot_view(symbol: Symbol, book: &Book, depth: usize, calibration: &TimeCalibration) -> BookSnapshotView {
    let to_level = |l: &crate::book::BookLevel| DepthLevelView {
        price: l.price.to_f64(),
        quantity: l.total_quantity.raw(),
        orders: l.order_count,
    };
    let stats = book.get_statistics();

    BookSnapshotView {
        symbol: symbol.as_str().to_string(),
        timestamp_ms: calibration.to_epoch_millis(book.last_update_ts()),
        best_bid: book.best_bid().to_f64(),
        best_ask: book.best_ask().to_f64(),
        mid_price: book.mid_price().to_f64(),
        spread: book.spread().to_f64(),
        weighted_mid: book.weighted_mid().to_f64(),
        imbalance: book.imbalance(),
        bids: book.top_n_bids(depth).iter().map(to_level).collect(),
        asks: book.top_n_asks(depth).iter().map(to_level).collect(),
        statistics: StatisticsView {
            last_price: stats.last_price.to_f64(),
            high: stats.high.to_f64(),
            low: stats.low.to_f64(),
            open: stats.open.to_f64(),
            vwap: stats.vwap.to_f64(),
            volume: stats.total_volume.raw(),
            trade_count: stats.trade_count,
            volatility: stats.volatility,
        },
    }
}

/// Owns the set of active books. Backed by a sharded concurrent map so
/// per-symbol lookup never blocks on an unrelated symbol's lookup or
/// mutation; creation and eviction are the only operations that touch the
/// map's own locking (spec §4.3, §5).
pub struct BookManager {
    books: DashMap<Symbol, Book>,
    calibration: TimeCalibration,
}

impl Default for BookManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BookManager {
    pub fn new() -> Self {
        BookManager { books: DashMap::new(), calibration: TimeCalibration::capture() }
    }

    /// Looks up `symbol`, inserting a fresh empty book if absent.
    pub fn get_or_create(&self, symbol: Symbol) -> dashmap::mapref::one::RefMut<'_, Symbol, Book> {
        self.books.entry(symbol).or_insert_with(|| Book::new(symbol))
    }

    pub fn get(&self, symbol: Symbol) -> Option<dashmap::mapref::one::Ref<'_, Symbol, Book>> {
        self.books.get(&symbol)
    }

    pub fn remove(&self, symbol: Symbol) {
        self.books.remove(&symbol);
    }

    /// Removes every book whose last update is older than `max_age_ns`.
    pub fn evict_stale(&self, max_age_ns: u64) {
        let now = clock::now();
        self.books.retain(|_, book| {
            // A book with no updates yet is never evicted as stale.
            book.update_count() == 0 || now.saturating_since(book.last_update_ts()) <= max_age_ns
        });
    }

    /// Read-only probe listing symbols whose book is older than
    /// `max_age_ns`, without removing them (SPEC_FULL.md §G).
    pub fn stale_symbols(&self, max_age_ns: u64) -> Vec<Symbol> {
        let now = clock::now();
        self.books
            .iter()
            .filter(|entry| {
                let book = entry.value();
                book.update_count() > 0 && now.saturating_since(book.last_update_ts()) > max_age_ns
            })
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn active_symbols(&self) -> Vec<Symbol> {
        self.books.iter().map(|entry| *entry.key()).collect()
    }

    /// Builds the full per-symbol snapshot document defined by spec §6,
    /// with up to `depth` levels per side, or `None` if `symbol` has no
    /// book.
    pub fn book_snapshot(&self, symbol: Symbol, depth: usize) -> Option<BookSnapshotView> {
        self.books.get(&symbol).map(|entry| build_snapshot_view(symbol, entry.value(), depth, &self.calibration))
    }

    /// Dispatches a decoded message to its book. `HEARTBEAT` and
    /// `STATISTICS` messages are accepted and ignored (spec §4.3).
    pub fn apply(&self, message: Message) -> Result<(), crate::errors::BookInvariantViolation> {
        match message {
            Message::Trade(trade) => {
                let book = self.get_or_create(trade.symbol);
                book.apply_trade(trade.ts, trade.price, trade.quantity)?;
            }
            Message::Quote(quote) => {
                let book = self.get_or_create(quote.symbol);
                book.apply_quote(quote.ts, quote.bid_px, quote.ask_px, quote.bid_sz, quote.ask_sz);
            }
            Message::OrderAdd(delta) => {
                let book = self.get_or_create(delta.symbol);
                book.apply_add(delta.price, delta.quantity, delta.side, delta.ts);
            }
            Message::OrderModify(delta) => {
                let book = self.get_or_create(delta.symbol);
                book.apply_modify(delta.old_price, delta.price, delta.quantity, delta.side, delta.ts);
            }
            Message::OrderDelete(delta) => {
                let book = self.get_or_create(delta.symbol);
                book.apply_delete(delta.price, delta.quantity, delta.side, delta.ts);
            }
            Message::BookSnapshot { ts, symbol, bids, asks } => {
                let book = self.get_or_create(symbol);
                let bids: Vec<_> = bids.into_iter().map(|l| (l.price, l.quantity)).collect();
                let asks: Vec<_> = asks.into_iter().map(|l| (l.price, l.quantity)).collect();
                book.apply_snapshot(ts, &bids, &asks);
            }
            Message::Heartbeat { .. } | Message::Statistics { .. } => {}
        }
        Ok(())
    }

    pub fn market_summary(&self) -> MarketSummary {
        let mut symbols = Vec::with_capacity(self.books.len());
        let mut total_updates = 0u64;

        for entry in self.books.iter() {
            let book = entry.value();
            total_updates += book.update_count();
            let stats = book.get_statistics();
            symbols.push(SymbolSummary {
                symbol: entry.key().as_str().to_string(),
                best_bid: book.best_bid().to_f64(),
                best_ask: book.best_ask().to_f64(),
                mid_price: book.mid_price().to_f64(),
                spread: book.spread().to_f64(),
                imbalance: book.imbalance(),
                volume: stats.total_volume.raw(),
                trade_count: stats.trade_count,
                volatility: stats.volatility,
            });
        }

        MarketSummary {
            total_symbols: symbols.len(),
            total_updates,
            timestamp_ns: self.calibration.to_epoch_millis(clock::now()),
            symbols,
        }
    }
}
