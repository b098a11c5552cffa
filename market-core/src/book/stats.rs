use crate::errors::BookInvariantViolation;
use crate::types::{Price, Quantity, Timestamp};

/// Rolling per-symbol statistics, updated on every applied trade and
/// refreshed with the latest spread on every book mutation (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub last_update: Timestamp,
    pub last_price: Price,
    pub high: Price,
    pub low: Price,
    pub open: Price,
    pub vwap: Price,
    pub total_volume: Quantity,
    pub trade_count: u64,
    pub volatility: f64,
    pub bid_ask_spread: Price,
}

impl Default for Statistics {
    fn default() -> Self {
        Statistics {
            last_update: Timestamp::ZERO,
            last_price: Price::ZERO,
            high: Price::ZERO,
            low: Price::ZERO,
            open: Price::ZERO,
            vwap: Price::ZERO,
            total_volume: Quantity::ZERO,
            trade_count: 0,
            volatility: 0.0,
            bid_ask_spread: Price::ZERO,
        }
    }
}

impl Statistics {
    /// Applies one executed trade. Updates OHLC, volume-weighted average
    /// price, and the Parkinson volatility estimate.
    ///
    /// VWAP is accumulated with 128-bit intermediate arithmetic so that
    /// neither the running numerator nor the scaled price can overflow a
    /// 64-bit accumulator before the final division (spec §4.2).
    pub fn apply_trade(
        &mut self,
        ts: Timestamp,
        price: Price,
        quantity: Quantity,
    ) -> Result<(), BookInvariantViolation> {
        if self.trade_count == 0 {
            self.open = price;
            self.high = price;
            self.low = price;
        } else {
            if price > self.high {
                self.high = price;
            }
            if price < self.low {
                self.low = price;
            }
        }

        let volume_before = self.total_volume;
        let volume_after = volume_before.saturating_add(quantity);

        if volume_after.raw() > 0 {
            let numerator = (self.vwap.raw() as i128) * (volume_before.raw() as i128)
                + (price.raw() as i128) * (quantity.raw() as i128);
            let denominator = volume_after.raw() as i128;
            let new_vwap = numerator / denominator;

            if new_vwap > i64::MAX as i128 || new_vwap < i64::MIN as i128 {
                return Err(BookInvariantViolation::VwapOverflow);
            }
            self.vwap = Price::from_raw(new_vwap as i64);
        }

        self.total_volume = volume_after;
        self.trade_count += 1;
        self.last_price = price;
        self.last_update = ts;

        self.volatility = self.parkinson_volatility();

        Ok(())
    }

    /// Records the book's current spread for later summary readout. Does
    /// not affect OHLC/VWAP.
    pub fn record_spread(&mut self, spread: Price) {
        self.bid_ask_spread = spread;
    }

    fn parkinson_volatility(&self) -> f64 {
        if self.trade_count < 2 || self.high == self.low {
            return 0.0;
        }
        let high = self.high.to_f64();
        let low = self.low.to_f64();
        let mid = (high + low) / 2.0;
        if mid <= 0.0 {
            return 0.0;
        }
        ((high - low) / mid) * 252f64.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_trade_sets_open_high_low_and_vwap() {
        let mut stats = Statistics::default();
        stats
            .apply_trade(Timestamp::from_nanos(1), Price::from_f64(150.01), Quantity::new(200))
            .unwrap();

        assert_eq!(stats.open, Price::from_f64(150.01));
        assert_eq!(stats.high, Price::from_f64(150.01));
        assert_eq!(stats.low, Price::from_f64(150.01));
        assert_eq!(stats.vwap, Price::from_f64(150.01));
        assert_eq!(stats.total_volume, Quantity::new(200));
        assert_eq!(stats.trade_count, 1);
    }

    #[test]
    fn vwap_matches_volume_weighted_sum() {
        let mut stats = Statistics::default();
        let trades = [(100.00, 10u64), (101.00, 20), (102.00, 70)];
        for (px, qty) in trades {
            stats
                .apply_trade(Timestamp::ZERO, Price::from_f64(px), Quantity::new(qty))
                .unwrap();
        }
        // (1000 + 2020 + 7140) / 100 = 101.60
        assert!((stats.vwap.to_f64() - 101.60).abs() < 1e-4);
    }

    #[test]
    fn volatility_zero_until_two_distinct_trades() {
        let mut stats = Statistics::default();
        stats.apply_trade(Timestamp::ZERO, Price::from_f64(100.0), Quantity::new(1)).unwrap();
        assert_eq!(stats.volatility, 0.0);

        stats.apply_trade(Timestamp::ZERO, Price::from_f64(100.0), Quantity::new(1)).unwrap();
        assert_eq!(stats.volatility, 0.0, "high == low should still report zero volatility");

        stats.apply_trade(Timestamp::ZERO, Price::from_f64(110.0), Quantity::new(1)).unwrap();
        assert!(stats.volatility > 0.0);
    }
}
