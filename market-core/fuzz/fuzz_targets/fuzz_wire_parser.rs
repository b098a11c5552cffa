//! Fuzz target for the tag-value wire parser.
//!
//! Feeds arbitrary bytes through `WireParser::parse`, looking for panics
//! or out-of-bounds field access. No input should ever do anything but
//! return `Ok` or one of the documented `ParseError` variants.

#![no_main]

use libfuzzer_sys::fuzz_target;
use market_core::{Timestamp, WireParser};

fuzz_target!(|data: &[u8]| {
    let mut parser = WireParser::new(true);
    if let Ok(frame) = parser.parse(data, Timestamp::from_nanos(1)) {
        // Field accessors must not panic on arbitrary well-formed-enough
        // frames, regardless of which tags happened to be present.
        let _ = frame.symbol();
        let _ = frame.last_price();
        let _ = frame.last_qty();
        let _ = frame.bid_px();
        let _ = frame.ask_px();
        let _ = frame.bid_sz();
        let _ = frame.ask_sz();
        let _ = frame.to_trade(1);
        let _ = frame.to_quote();
    }

    // A second parse on the same parser instance must not panic either,
    // exercising the `reset()` path between calls.
    let _ = parser.parse(data, Timestamp::from_nanos(2));
});
