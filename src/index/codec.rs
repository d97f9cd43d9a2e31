//! Order-preserving key codec for fields.
//!
//! Layout of an encoded key:
//!
//! ```text
//! +-------------+---------------+--------------+--------------------------+
//! | series (8B) | index rule 4B | encoded term | [0x01 marker + value]    |
//! +-------------+---------------+--------------+--------------------------+
//! ```
//!
//! The header is big-endian, so every key of one field shares a 12-byte
//! prefix. Term encodings preserve the order given by
//! [`TermMetadata::compare_terms`]:
//!
//! - bytes: `0x00` escaped as `0x00 0xFF`, terminated by `0x00 0x01`
//! - i64: sign bit flipped, big-endian
//! - u64: big-endian
//! - f64: negative values fully inverted, others with the sign bit set
//!
//! Comparing two encoded keys byte-wise therefore matches comparing their
//! `(field key, term, value)` tuples logically.

use std::cmp::Ordering;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TesseraError};
use crate::index::field::{Field, FieldKey, RangeOpts};
use crate::schema::term::{NUMERIC_TERM_LEN, TermMetadata, TermType};
use crate::util::bytes::prefix_successor;

/// Width of the encoded field key header.
pub const FIELD_KEY_LEN: usize = 12;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;
const VALUE_MARKER: u8 = 0x01;
const SIGN_BIT: u64 = 1 << 63;

/// Encode a field into an order-preserving key.
pub fn marshal(field: &Field, metadata: &TermMetadata) -> Result<Vec<u8>> {
    let mut buf = marshal_term(&field.key, &field.term, metadata)?;
    if let Some(value) = &field.value {
        buf.reserve(1 + value.len());
        buf.push(VALUE_MARKER);
        buf.extend_from_slice(value);
    }
    Ok(buf)
}

/// Decode a key produced by [`marshal`].
pub fn unmarshal(metadata: &TermMetadata, bytes: &[u8]) -> Result<Field> {
    if bytes.len() < FIELD_KEY_LEN {
        return Err(TesseraError::decode(format!(
            "key of {} bytes is shorter than the {FIELD_KEY_LEN}-byte field header",
            bytes.len()
        )));
    }

    let key = FieldKey::new(
        BigEndian::read_u64(&bytes[..8]),
        BigEndian::read_u32(&bytes[8..FIELD_KEY_LEN]),
    );
    let (term, consumed) = decode_term(metadata, &bytes[FIELD_KEY_LEN..])?;

    let rest = &bytes[FIELD_KEY_LEN + consumed..];
    let value = match rest.split_first() {
        None => None,
        Some((&VALUE_MARKER, value)) => Some(value.to_vec()),
        Some((other, _)) => {
            return Err(TesseraError::decode(format!(
                "unexpected byte {other:#04x} after term"
            )));
        }
    };

    Ok(Field { key, term, value })
}

/// Encode the field key header alone.
pub fn marshal_field_key(key: &FieldKey) -> Vec<u8> {
    let mut buf = vec![0u8; FIELD_KEY_LEN];
    BigEndian::write_u64(&mut buf[..8], key.series_id);
    BigEndian::write_u32(&mut buf[8..], key.index_rule_id);
    buf
}

/// Encode a field key and term without any value suffix.
pub fn marshal_term(key: &FieldKey, term: &[u8], metadata: &TermMetadata) -> Result<Vec<u8>> {
    metadata.validate_term(term)?;

    let mut buf = marshal_field_key(key);
    match metadata.term_type {
        TermType::Bytes => {
            buf.reserve(term.len() + 2);
            for &b in term {
                buf.push(b);
                if b == ESCAPE {
                    buf.push(ESCAPED_ZERO);
                }
            }
            buf.extend_from_slice(&[ESCAPE, TERMINATOR]);
        }
        TermType::I64 => {
            let encoded = BigEndian::read_u64(term) ^ SIGN_BIT;
            buf.extend_from_slice(&encoded.to_be_bytes());
        }
        TermType::U64 => buf.extend_from_slice(term),
        TermType::F64 => {
            let bits = BigEndian::read_u64(term);
            let encoded = if bits & SIGN_BIT != 0 {
                !bits
            } else {
                bits ^ SIGN_BIT
            };
            buf.extend_from_slice(&encoded.to_be_bytes());
        }
    }
    Ok(buf)
}

fn decode_term(metadata: &TermMetadata, bytes: &[u8]) -> Result<(Vec<u8>, usize)> {
    if metadata.term_type.is_numeric() {
        if bytes.len() < NUMERIC_TERM_LEN {
            return Err(TesseraError::decode(format!(
                "{} term needs {NUMERIC_TERM_LEN} bytes, got {}",
                metadata.term_type.type_name(),
                bytes.len()
            )));
        }
        let encoded = BigEndian::read_u64(&bytes[..NUMERIC_TERM_LEN]);
        let raw = match metadata.term_type {
            TermType::I64 => encoded ^ SIGN_BIT,
            TermType::F64 if encoded & SIGN_BIT != 0 => encoded ^ SIGN_BIT,
            TermType::F64 => !encoded,
            _ => encoded,
        };
        return Ok((raw.to_be_bytes().to_vec(), NUMERIC_TERM_LEN));
    }

    let mut term = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if b != ESCAPE {
            term.push(b);
            pos += 1;
            continue;
        }
        match bytes.get(pos + 1) {
            Some(&ESCAPED_ZERO) => {
                term.push(ESCAPE);
                pos += 2;
            }
            Some(&TERMINATOR) => return Ok((term, pos + 2)),
            Some(other) => {
                return Err(TesseraError::decode(format!(
                    "invalid escape sequence 0x00 {other:#04x} in term"
                )));
            }
            None => break,
        }
    }
    Err(TesseraError::decode("unterminated term"))
}

/// A half-open byte range `[start, end)` of encoded keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Inclusive start.
    pub start: Vec<u8>,
    /// Exclusive end; `None` means unbounded.
    pub end: Option<Vec<u8>>,
}

impl KeyRange {
    /// A range that contains no keys.
    pub fn empty() -> Self {
        KeyRange {
            start: Vec::new(),
            end: Some(Vec::new()),
        }
    }

    /// Whether `key` falls inside the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && self.end.as_deref().is_none_or(|end| key < end)
    }

    /// Whether the range can contain no key at all.
    pub fn is_empty(&self) -> bool {
        self.end
            .as_deref()
            .is_some_and(|end| end <= self.start.as_slice())
    }
}

/// Derive the byte range that covers `opts` within one field.
///
/// Both bounds are validated against the schema, then compared with the
/// schema comparator; an inverted range is returned as [`KeyRange::empty`].
pub fn key_range(key: &FieldKey, opts: &RangeOpts, metadata: &TermMetadata) -> Result<KeyRange> {
    for bound in [&opts.lower, &opts.upper].into_iter().flatten() {
        metadata.validate_term(bound)?;
    }

    if let (Some(lower), Some(upper)) = (&opts.lower, &opts.upper) {
        let inverted = match metadata.compare_terms(lower, upper) {
            Ordering::Greater => true,
            Ordering::Equal => !(opts.include_lower && opts.include_upper),
            Ordering::Less => false,
        };
        if inverted {
            return Ok(KeyRange::empty());
        }
    }

    let prefix = marshal_field_key(key);

    let start = match &opts.lower {
        None => prefix.clone(),
        Some(term) => {
            let encoded = marshal_term(key, term, metadata)?;
            if opts.include_lower {
                encoded
            } else {
                match prefix_successor(&encoded) {
                    Some(succ) => succ,
                    // Nothing sorts after an all-0xFF key.
                    None => return Ok(KeyRange::empty()),
                }
            }
        }
    };

    let end = match &opts.upper {
        None => prefix_successor(&prefix),
        Some(term) => {
            let encoded = marshal_term(key, term, metadata)?;
            if opts.include_upper {
                prefix_successor(&encoded)
            } else {
                Some(encoded)
            }
        }
    };

    Ok(KeyRange { start, end })
}
