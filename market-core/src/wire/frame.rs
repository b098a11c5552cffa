use super::parser::{
    MAX_FIELDS, TAG_ASK_PX, TAG_ASK_SZ, TAG_BID_PX, TAG_BID_SZ, TAG_LAST_PX, TAG_LAST_QTY,
    TAG_SENDING_TIME, TAG_SIDE, TAG_SYMBOL, TAG_TABLE_SIZE,
};
use crate::errors::ParseError;
use crate::types::{MessageKind, OrderDelta, Price, Quantity, Quote, Side, Symbol, Timestamp, Trade};
use crate::wire::calibration::TimeCalibration;

/// A successfully decoded frame. Borrows the input bytes; every field is a
/// span into that slice, so decoding a frame performs no heap allocation
/// (spec §4.4).
pub struct ParsedFrame<'a> {
    pub(super) bytes: &'a [u8],
    pub(super) receive_ts: Timestamp,
    pub(super) kind: MessageKind,
    pub(super) field_count: usize,
    pub(super) tags: [u32; MAX_FIELDS],
    pub(super) spans: [(u32, u32); MAX_FIELDS],
    pub(super) index: [i16; TAG_TABLE_SIZE],
}

impl<'a> ParsedFrame<'a> {
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn receive_timestamp(&self) -> Timestamp {
        self.receive_ts
    }

    /// O(1) field lookup for tags within the index table, falling back to
    /// a linear scan for any tag beyond it (spec §4.4: unindexed tags are
    /// still stored, just not accelerated).
    fn field(&self, tag: u32) -> Option<&'a [u8]> {
        if (tag as usize) < TAG_TABLE_SIZE {
            let slot = self.index[tag as usize];
            if slot >= 0 {
                let (start, len) = self.spans[slot as usize];
                return Some(&self.bytes[start as usize..start as usize + len as usize]);
            }
            return None;
        }
        for i in 0..self.field_count {
            if self.tags[i] == tag {
                let (start, len) = self.spans[i];
                return Some(&self.bytes[start as usize..start as usize + len as usize]);
            }
        }
        None
    }

    fn price_field(&self, tag: u32) -> Option<Price> {
        self.field(tag).and_then(|v| parse_price(v).ok())
    }

    fn qty_field(&self, tag: u32) -> Option<Quantity> {
        self.field(tag).and_then(|v| parse_u64(v).ok()).map(Quantity::new)
    }

    pub fn symbol(&self) -> Option<Symbol> {
        self.field(TAG_SYMBOL)
            .and_then(|v| std::str::from_utf8(v).ok())
            .map(Symbol::new)
    }

    pub fn last_price(&self) -> Option<Price> {
        self.price_field(TAG_LAST_PX)
    }

    pub fn last_qty(&self) -> Option<Quantity> {
        self.qty_field(TAG_LAST_QTY)
    }

    pub fn bid_px(&self) -> Option<Price> {
        self.price_field(TAG_BID_PX)
    }

    pub fn ask_px(&self) -> Option<Price> {
        self.price_field(TAG_ASK_PX)
    }

    pub fn bid_sz(&self) -> Option<Quantity> {
        self.qty_field(TAG_BID_SZ)
    }

    pub fn ask_sz(&self) -> Option<Quantity> {
        self.qty_field(TAG_ASK_SZ)
    }

    /// The raw `52=` sending-time field, converted to the engine's
    /// monotonic timestamp domain via `calibration`.
    pub fn sending_time(&self, calibration: &TimeCalibration) -> Option<Timestamp> {
        self.field(TAG_SENDING_TIME).and_then(|v| calibration.parse_sending_time(v))
    }

    /// Aggressor side, from the optional `54=` field (`1`=buy, `2`=sell).
    /// Defaults to `Buy` when absent — the core tag list (spec §6) does
    /// not mandate this field.
    fn aggressor_side(&self) -> Side {
        match self.field(TAG_SIDE) {
            Some(b"2") => Side::Sell,
            _ => Side::Buy,
        }
    }

    /// Builds a [`Trade`] from a `TRADE` frame.
    pub fn to_trade(&self, trade_id: u64) -> Result<Trade, ParseError> {
        Ok(Trade {
            ts: self.receive_ts,
            symbol: self.symbol().ok_or(ParseError::MissingRequiredField(TAG_SYMBOL))?,
            price: self.last_price().ok_or(ParseError::MissingRequiredField(TAG_LAST_PX))?,
            quantity: self.last_qty().ok_or(ParseError::MissingRequiredField(TAG_LAST_QTY))?,
            aggressor_side: self.aggressor_side(),
            trade_id,
        })
    }

    /// Builds a [`Quote`] from a `QUOTE` frame.
    pub fn to_quote(&self) -> Result<Quote, ParseError> {
        Ok(Quote {
            ts: self.receive_ts,
            symbol: self.symbol().ok_or(ParseError::MissingRequiredField(TAG_SYMBOL))?,
            bid_px: self.bid_px().ok_or(ParseError::MissingRequiredField(TAG_BID_PX))?,
            ask_px: self.ask_px().ok_or(ParseError::MissingRequiredField(TAG_ASK_PX))?,
            bid_sz: self.bid_sz().ok_or(ParseError::MissingRequiredField(TAG_BID_SZ))?,
            ask_sz: self.ask_sz().ok_or(ParseError::MissingRequiredField(TAG_ASK_SZ))?,
        })
    }

    /// Builds an [`OrderDelta`] from an `ORDER_ADD`/`ORDER_MODIFY`/
    /// `ORDER_DELETE` frame, reusing the bid/ask price-and-size tags as the
    /// generic level fields for whichever `side` the caller supplies.
    pub fn to_order_delta(&self, side: Side, old_price: Price) -> Result<OrderDelta, ParseError> {
        let (price, quantity) = match side {
            Side::Buy => (
                self.bid_px().ok_or(ParseError::MissingRequiredField(TAG_BID_PX))?,
                self.bid_sz().ok_or(ParseError::MissingRequiredField(TAG_BID_SZ))?,
            ),
            Side::Sell => (
                self.ask_px().ok_or(ParseError::MissingRequiredField(TAG_ASK_PX))?,
                self.ask_sz().ok_or(ParseError::MissingRequiredField(TAG_ASK_SZ))?,
            ),
        };
        Ok(OrderDelta {
            ts: self.receive_ts,
            symbol: self.symbol().ok_or(ParseError::MissingRequiredField(TAG_SYMBOL))?,
            side,
            price,
            quantity,
            old_price,
        })
    }
}

/// Parses an ASCII decimal field into a fixed-point [`Price`] (scale
/// 10,000) by locating the decimal point and scaling both halves, without
/// an intermediate float (spec §4.4).
pub(super) fn parse_price(bytes: &[u8]) -> Result<Price, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::BadFieldSyntax { tag: 0 });
    }
    let (sign, digits) = match bytes[0] {
        b'-' => (-1i64, &bytes[1..]),
        _ => (1i64, bytes),
    };

    let dot = digits.iter().position(|&b| b == b'.');
    let (whole_bytes, frac_bytes): (&[u8], &[u8]) = match dot {
        Some(idx) => (&digits[..idx], &digits[idx + 1..]),
        None => (digits, &[]),
    };

    let whole = parse_ascii_u64(whole_bytes)? as i64;

    let mut frac_scaled: i64 = 0;
    let mut scale = crate::types::PRICE_SCALE;
    for &b in frac_bytes.iter().take(4) {
        if !b.is_ascii_digit() {
            return Err(ParseError::BadFieldSyntax { tag: 0 });
        }
        scale /= 10;
        frac_scaled += (b - b'0') as i64 * scale;
    }

    Ok(Price::from_raw(sign * (whole * crate::types::PRICE_SCALE + frac_scaled)))
}

pub(super) fn parse_u64(bytes: &[u8]) -> Result<u64, ParseError> {
    parse_ascii_u64(bytes)
}

fn parse_ascii_u64(bytes: &[u8]) -> Result<u64, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::BadFieldSyntax { tag: 0 });
    }
    let mut value: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return Err(ParseError::BadFieldSyntax { tag: 0 });
        }
        value = value * 10 + (b - b'0') as u64;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_price() {
        assert_eq!(parse_price(b"150.2500").unwrap(), Price::from_f64(150.25));
        assert_eq!(parse_price(b"150").unwrap(), Price::from_f64(150.0));
        assert_eq!(parse_price(b"0.0002").unwrap(), Price::from_raw(2));
    }

    #[test]
    fn rejects_non_numeric_price() {
        assert!(parse_price(b"15x.25").is_err());
        assert!(parse_price(b"").is_err());
    }
}
