//! Low-latency market-data ingestion, order book, and aggregation engine.
//!
//! This crate is the data-plane core of a real-time market-data pipeline:
//! a bounded ring queue moves typed messages from producers to a single
//! consumer, a tag-value wire parser decodes inbound frames without
//! per-message allocation, a per-symbol order book maintains price-sorted
//! levels and rolling statistics, and an aggregator binds those pieces
//! into one bounded-latency pipeline. The simulated feed, the fan-out JSON
//! server, the CLI, and the dashboard are external collaborators; only
//! their interfaces are honored here.

pub mod aggregator;
pub mod book;
pub mod clock;
pub mod config;
pub mod errors;
pub mod logging;
pub mod manager;
pub mod monitoring;
pub mod queue;
pub mod types;
pub mod wire;

pub use aggregator::{Aggregator, AggregatorMetrics, LatencyTracker};
pub use book::{Book, BookState, Statistics};
pub use errors::{AggregatorFault, BookInvariantViolation, ParseError};
pub use manager::{
    BookManager, BookSnapshotView, DepthLevelView, MarketSummary, StatisticsView, SymbolSummary,
    DEFAULT_SNAPSHOT_DEPTH,
};
pub use queue::{IngestQueue, MpscRingQueue, RingQueue};
pub use types::{
    Message, MessageKind, OrderDelta, Price, Quantity, Quote, Side, SnapshotLevel, Symbol,
    Timestamp, Trade, PRICE_SCALE,
};
pub use wire::{ParsedFrame, TimeCalibration, WireParser};
