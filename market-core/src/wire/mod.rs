//! Tag-value wire frame parser (spec §4.4).
//!
//! Frames follow an informal FIX-like grammar: `tag "=" value <SOH>`
//! repeated, with a three-tag header (`8=`, `9=`, `35=`) and a trailing
//! modulo-256 checksum (`10=NNN`). Parsing never allocates on the heap:
//! field positions are recorded as offsets into the caller's byte slice,
//! in fixed-capacity arrays carried by the parser itself.

mod calibration;
mod frame;
mod parser;

pub use calibration::TimeCalibration;
pub use frame::ParsedFrame;
pub use parser::{WireParser, SOH};
