use super::frame::ParsedFrame;
use crate::errors::ParseError;
use crate::types::{MessageKind, Timestamp};

/// Field separator (spec §4.4, §6).
pub const SOH: u8 = 0x01;

/// Bounded field count per frame; exceeding it is `ParseError::TooManyFields`.
pub(super) const MAX_FIELDS: usize = 256;

/// Size of the direct tag → field-index lookup table. Tags at or beyond
/// this are still stored but looked up with a linear scan (spec §4.4:
/// "unknown tags beyond the table are dropped silently" refers to the
/// acceleration table, not the field itself).
pub(super) const TAG_TABLE_SIZE: usize = 512;

pub(super) const TAG_BEGIN_STRING: u32 = 8;
pub(super) const TAG_BODY_LENGTH: u32 = 9;
pub(super) const TAG_MSG_TYPE: u32 = 35;
pub(super) const TAG_CHECKSUM: u32 = 10;
pub(super) const TAG_SYMBOL: u32 = 55;
pub(super) const TAG_LAST_PX: u32 = 31;
pub(super) const TAG_LAST_QTY: u32 = 32;
pub(super) const TAG_BID_PX: u32 = 132;
pub(super) const TAG_ASK_PX: u32 = 133;
pub(super) const TAG_BID_SZ: u32 = 134;
pub(super) const TAG_ASK_SZ: u32 = 135;
pub(super) const TAG_SENDING_TIME: u32 = 52;
/// Not in the core tag list (spec §6); an optional supplement so
/// `to_trade` can report an aggressor side instead of defaulting blindly.
pub(super) const TAG_SIDE: u32 = 54;

/// Message-kind byte carried in the `35=` field. Not part of any upstream
/// standard; an engine-local convention chosen for readability.
mod kind_byte {
    pub const TRADE: u8 = b'T';
    pub const QUOTE: u8 = b'Q';
    pub const ORDER_ADD: u8 = b'A';
    pub const ORDER_MODIFY: u8 = b'M';
    pub const ORDER_DELETE: u8 = b'D';
    pub const BOOK_SNAPSHOT: u8 = b'S';
    pub const HEARTBEAT: u8 = b'H';
    pub const STATISTICS: u8 = b'X';
}

fn message_kind_from_byte(b: u8) -> Result<MessageKind, ParseError> {
    match b {
        kind_byte::TRADE => Ok(MessageKind::Trade),
        kind_byte::QUOTE => Ok(MessageKind::Quote),
        kind_byte::ORDER_ADD => Ok(MessageKind::OrderAdd),
        kind_byte::ORDER_MODIFY => Ok(MessageKind::OrderModify),
        kind_byte::ORDER_DELETE => Ok(MessageKind::OrderDelete),
        kind_byte::BOOK_SNAPSHOT => Ok(MessageKind::BookSnapshot),
        kind_byte::HEARTBEAT => Ok(MessageKind::Heartbeat),
        kind_byte::STATISTICS => Ok(MessageKind::Statistics),
        other => Err(ParseError::UnknownMessageKind(other)),
    }
}

/// Minimum plausible frame: `8=X<SOH>9=1<SOH>35=T<SOH>10=000<SOH>`.
const MIN_FRAME_LEN: usize = 20;

/// Reusable tag-value frame decoder. Holds its scratch state (field spans
/// and the tag lookup table) as fixed-size arrays so that repeated calls
/// to [`parse`](Self::parse) never allocate (spec §4.4).
pub struct WireParser {
    checksum_enabled: bool,
    field_count: usize,
    kind: MessageKind,
    tags: [u32; MAX_FIELDS],
    spans: [(u32, u32); MAX_FIELDS],
    index: [i16; TAG_TABLE_SIZE],
}

impl WireParser {
    pub fn new(checksum_enabled: bool) -> Self {
        WireParser {
            checksum_enabled,
            field_count: 0,
            kind: MessageKind::Heartbeat,
            tags: [0; MAX_FIELDS],
            spans: [(0, 0); MAX_FIELDS],
            index: [-1; TAG_TABLE_SIZE],
        }
    }

    /// Clears scratch state for reuse without reparsing (spec §4.4).
    pub fn reset(&mut self) {
        self.field_count = 0;
        self.kind = MessageKind::Heartbeat;
        self.index = [-1; TAG_TABLE_SIZE];
    }

    fn store_field(&mut self, tag: u32, start: usize, len: usize) -> Result<(), ParseError> {
        if self.field_count >= MAX_FIELDS {
            return Err(ParseError::TooManyFields);
        }
        let idx = self.field_count;
        self.tags[idx] = tag;
        self.spans[idx] = (start as u32, len as u32);
        self.field_count += 1;

        if (tag as usize) < TAG_TABLE_SIZE {
            self.index[tag as usize] = idx as i16;
        }
        Ok(())
    }

    /// Decodes `bytes` into a [`ParsedFrame`] borrowing both the input and
    /// this parser's scratch state.
    pub fn parse<'a>(
        &'a mut self,
        bytes: &'a [u8],
        receive_ts: Timestamp,
    ) -> Result<ParsedFrame<'a>, ParseError> {
        self.reset();

        if bytes.len() < MIN_FRAME_LEN {
            return Err(ParseError::TooShort);
        }

        let mut pos = 0usize;
        let mut header_fields_seen = 0u32;
        let mut kind_byte = 0u8;

        loop {
            if pos >= bytes.len() {
                return Err(ParseError::BadHeader);
            }

            let field_end = match bytes[pos..].iter().position(|&b| b == SOH) {
                Some(offset) => pos + offset,
                None => return Err(ParseError::BadHeader),
            };
            let field = &bytes[pos..field_end];
            let field_start = pos;
            pos = field_end + 1;

            let eq = field
                .iter()
                .position(|&b| b == b'=')
                .ok_or(ParseError::BadFieldSyntax { tag: 0 })?;
            let tag_bytes = &field[..eq];
            let tag = super::frame::parse_u64(tag_bytes)
                .map_err(|_| ParseError::BadFieldSyntax { tag: 0 })? as u32;
            let value_start = field_start + eq + 1;
            let value = &bytes[value_start..field_end];

            if tag == TAG_CHECKSUM {
                if self.checksum_enabled {
                    let expected = checksum_mod256(&bytes[..field_start]);
                    let actual = super::frame::parse_u64(value)
                        .map_err(|_| ParseError::BadFieldSyntax { tag: TAG_CHECKSUM })?;
                    if expected as u64 != actual {
                        return Err(ParseError::ChecksumMismatch);
                    }
                }
                break;
            }

            if header_fields_seen < 3 {
                let expected_tag = match header_fields_seen {
                    0 => TAG_BEGIN_STRING,
                    1 => TAG_BODY_LENGTH,
                    _ => TAG_MSG_TYPE,
                };
                if tag != expected_tag {
                    return Err(ParseError::BadHeader);
                }
                if tag == TAG_MSG_TYPE {
                    kind_byte = *value.first().ok_or(ParseError::BadHeader)?;
                }
                header_fields_seen += 1;
            }

            self.store_field(tag, value_start, value.len())?;
        }

        if header_fields_seen != 3 {
            return Err(ParseError::BadHeader);
        }

        self.kind = message_kind_from_byte(kind_byte)?;

        Ok(ParsedFrame {
            bytes,
            receive_ts,
            kind: self.kind,
            field_count: self.field_count,
            tags: self.tags,
            spans: self.spans,
            index: self.index,
        })
    }
}

fn checksum_mod256(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}
