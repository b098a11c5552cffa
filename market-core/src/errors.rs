//! Domain error types for the ingestion pipeline.
//!
//! Two kinds of failure exist, matching spec §7:
//! - *Recoverable* kinds ([`ParseError`]) are never surfaced as `Result`
//!   failures on the hot path; callers count them and move on.
//! - *Fatal* kinds ([`BookInvariantViolation`]) stop the aggregator.

use crate::types::Price;
use thiserror::Error;

/// Errors the wire parser can report. All variants are recoverable: the
/// caller increments a counter and proceeds with the next frame (spec §4.4,
/// §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("frame shorter than the minimum header")]
    TooShort,
    #[error("malformed header (missing version/body-length/kind)")]
    BadHeader,
    #[error("field {tag} did not match tag=value syntax")]
    BadFieldSyntax { tag: u32 },
    #[error("frame exceeded the maximum field count")]
    TooManyFields,
    #[error("missing required field {0}")]
    MissingRequiredField(u32),
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("unknown message kind byte {0:#x}")]
    UnknownMessageKind(u8),
}

/// Fatal invariant violation inside an order book. Unlike [`ParseError`],
/// this stops the aggregator (spec §7): further mutation of a book whose
/// invariants no longer hold cannot be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookInvariantViolation {
    #[error("quantity would go negative: level={level:?} delta qty={delta:?}")]
    NegativeQuantity { level: Price, delta: i64 },
    #[error("cached best price {cached:?} disagrees with book extremum {actual:?}")]
    BestPriceDesync { cached: Price, actual: Price },
    #[error("VWAP accumulator overflowed 128-bit intermediate arithmetic")]
    VwapOverflow,
}

/// The aggregator's terminal cause, surfaced through `stop()` when a fatal
/// error halts the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregatorFault {
    #[error(transparent)]
    BookInvariant(#[from] BookInvariantViolation),
}
