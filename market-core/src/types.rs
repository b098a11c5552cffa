//! Primitive value types shared across the ingestion pipeline.
//!
//! All types here are plain values: `Copy` where the size allows it, with
//! zero heap allocation and no interior mutability. They are designed to be
//! passed by value through the ring queue and the order book without
//! touching the allocator.

use std::fmt;

/// Fixed-point price, scaled by [`PRICE_SCALE`] (10,000).
///
/// Using a scaled integer instead of a float keeps accounting exact: the
/// wire parser, the book, and the statistics engine all operate on the same
/// representation, so no rounding drift can creep in between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Price(pub i64);

/// Scale factor for [`Price`]: a display value of `1.0000` is stored as `10_000`.
pub const PRICE_SCALE: i64 = 10_000;

impl Price {
    pub const ZERO: Price = Price(0);

    #[inline(always)]
    pub const fn from_raw(raw: i64) -> Self {
        Price(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Build a `Price` from a whole/fractional pair, e.g. `Price::from_parts(150, 25)` == 150.0025.
    #[inline]
    pub fn from_parts(whole: i64, frac_scaled: i64) -> Self {
        Price(whole * PRICE_SCALE + frac_scaled)
    }

    /// Convert to a display-unit `f64` (e.g. `150.0025`). Only used for
    /// human-facing output (JSON egress, logs) — never for accounting math.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Price((value * PRICE_SCALE as f64).round() as i64)
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

impl std::ops::Add for Price {
    type Output = Price;
    #[inline]
    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Price {
    type Output = Price;
    #[inline]
    fn sub(self, rhs: Price) -> Price {
        Price(self.0 - rhs.0)
    }
}

/// Resting or traded quantity. Always non-negative by construction: every
/// mutation path saturates at zero rather than going negative (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Quantity(pub u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    #[inline(always)]
    pub const fn new(value: u64) -> Self {
        Quantity(value)
    }

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn saturating_add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_sub(rhs.0))
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic nanosecond timestamp, measured from an engine-defined epoch
/// (process start, or a calibration offset captured at startup — see
/// [`crate::wire::calibration`]). Never wraps in any realistic run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline(always)]
    pub const fn from_nanos(nanos: u64) -> Self {
        Timestamp(nanos)
    }

    #[inline(always)]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Saturating `self - other`, never wrapping below zero on clock skew.
    #[inline]
    pub fn saturating_since(self, other: Timestamp) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

/// Fixed-capacity, NUL-padded ASCII symbol identifier. Two symbols compare
/// equal iff their underlying bytes are equal, including padding — this
/// keeps `Symbol` `Copy` and hashable without heap allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    bytes: [u8; Symbol::CAPACITY],
}

impl Symbol {
    pub const CAPACITY: usize = 16;

    /// Build a symbol from a string slice, truncating beyond capacity and
    /// NUL-padding the remainder. Non-ASCII input is accepted verbatim
    /// (bytes are copied as-is); callers feeding the wire parser only ever
    /// see ASCII field values in practice.
    pub fn new(s: &str) -> Self {
        let mut bytes = [0u8; Symbol::CAPACITY];
        let src = s.as_bytes();
        let n = src.len().min(Symbol::CAPACITY);
        bytes[..n].copy_from_slice(&src[..n]);
        Symbol { bytes }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(Symbol::CAPACITY);
        std::str::from_utf8(&self.bytes[..end]).unwrap_or("")
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; Symbol::CAPACITY] {
        &self.bytes
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Symbol { bytes: [0u8; Symbol::CAPACITY] }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

/// Order book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Inbound message discriminant, carried through the ring queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Trade = 0,
    Quote = 1,
    OrderAdd = 2,
    OrderModify = 3,
    OrderDelete = 4,
    BookSnapshot = 5,
    Heartbeat = 6,
    Statistics = 7,
}

/// A single executed trade, valid only in-flight between the parser and the
/// book (spec §3: "exists only in-flight").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub ts: Timestamp,
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    pub aggressor_side: Side,
    pub trade_id: u64,
}

/// A top-of-book quote update, valid only in-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub ts: Timestamp,
    pub symbol: Symbol,
    pub bid_px: Price,
    pub ask_px: Price,
    pub bid_sz: Quantity,
    pub ask_sz: Quantity,
}

/// A single incremental level update (add/modify/delete), as dispatched by
/// the aggregator to the book manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDelta {
    pub ts: Timestamp,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    /// Only meaningful for `Modify`: the price being replaced/decremented.
    pub old_price: Price,
}

/// One price level as carried by a full-book snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// A tagged message, the compile-time-dispatched replacement for the
/// source's dynamic "abstract message" (spec §9 design notes).
#[derive(Debug, Clone)]
pub enum Message {
    Trade(Trade),
    Quote(Quote),
    OrderAdd(OrderDelta),
    OrderModify(OrderDelta),
    OrderDelete(OrderDelta),
    BookSnapshot {
        ts: Timestamp,
        symbol: Symbol,
        bids: Vec<SnapshotLevel>,
        asks: Vec<SnapshotLevel>,
    },
    Heartbeat { ts: Timestamp },
    Statistics { ts: Timestamp, symbol: Symbol },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Trade(_) => MessageKind::Trade,
            Message::Quote(_) => MessageKind::Quote,
            Message::OrderAdd(_) => MessageKind::OrderAdd,
            Message::OrderModify(_) => MessageKind::OrderModify,
            Message::OrderDelete(_) => MessageKind::OrderDelete,
            Message::BookSnapshot { .. } => MessageKind::BookSnapshot,
            Message::Heartbeat { .. } => MessageKind::Heartbeat,
            Message::Statistics { .. } => MessageKind::Statistics,
        }
    }

    /// Receive timestamp, used by the aggregator's latency tracker.
    pub fn receive_timestamp(&self) -> Timestamp {
        match self {
            Message::Trade(t) => t.ts,
            Message::Quote(q) => q.ts,
            Message::OrderAdd(d) | Message::OrderModify(d) | Message::OrderDelete(d) => d.ts,
            Message::BookSnapshot { ts, .. } => *ts,
            Message::Heartbeat { ts } => *ts,
            Message::Statistics { ts, .. } => *ts,
        }
    }
}
