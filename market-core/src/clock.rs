//! A single process-wide monotonic clock, anchored at first use.
//!
//! [`Timestamp`](crate::types::Timestamp) values are nanoseconds since
//! process start (spec §3). `std::time::Instant` has no fixed epoch, so a
//! reference point is captured once here and every subsequent reading is
//! expressed relative to it.

use crate::types::Timestamp;
use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

#[inline]
pub fn now() -> Timestamp {
    let epoch = EPOCH.get_or_init(Instant::now);
    Timestamp::from_nanos(epoch.elapsed().as_nanos() as u64)
}
