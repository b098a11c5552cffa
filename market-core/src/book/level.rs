use crate::types::{Price, Quantity};

/// One aggregated price level on a book side.
///
/// Invariant: a `BookLevel` is never observed with zero quantity — callers
/// remove the entry from the side map instead (spec §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    pub price: Price,
    pub total_quantity: Quantity,
    pub order_count: u32,
}

impl BookLevel {
    pub fn new(price: Price, quantity: Quantity) -> Self {
        BookLevel { price, total_quantity: quantity, order_count: 1 }
    }
}
