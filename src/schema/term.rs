//! Term schema describing how field terms are laid out and compared.

use std::cmp::Ordering;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError};

/// Width of a numeric term in bytes.
pub const NUMERIC_TERM_LEN: usize = 8;

/// The logical type of the terms stored under a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    /// Arbitrary bytes compared lexicographically
    #[default]
    Bytes,
    /// 64-bit signed integer, big-endian
    I64,
    /// 64-bit unsigned integer, big-endian
    U64,
    /// 64-bit floating point, big-endian IEEE-754 bits
    F64,
}

impl TermType {
    /// Whether terms of this type are fixed-width numbers.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, TermType::Bytes)
    }

    /// Name used in messages and CLI output.
    pub fn type_name(&self) -> &'static str {
        match self {
            TermType::Bytes => "bytes",
            TermType::I64 => "i64",
            TermType::U64 => "u64",
            TermType::F64 => "f64",
        }
    }
}

/// Schema for the terms of one index.
///
/// Numeric terms are carried in their natural 8-byte big-endian form; the key
/// codec transforms them into an order-preserving encoding. Comparison of two
/// terms always goes through [`TermMetadata::compare_terms`], which compares
/// numbers by magnitude rather than by raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TermMetadata {
    /// The logical type of terms.
    #[serde(default)]
    pub term_type: TermType,
}

impl TermMetadata {
    /// Create metadata for the given term type.
    pub fn new(term_type: TermType) -> Self {
        TermMetadata { term_type }
    }

    /// Metadata for byte/string terms.
    pub fn bytes() -> Self {
        Self::new(TermType::Bytes)
    }

    /// Check that `term` has the shape this schema expects.
    pub fn validate_term(&self, term: &[u8]) -> Result<()> {
        if self.term_type.is_numeric() && term.len() != NUMERIC_TERM_LEN {
            return Err(TesseraError::encode(format!(
                "{} term must be {NUMERIC_TERM_LEN} bytes, got {}",
                self.term_type.type_name(),
                term.len()
            )));
        }
        if self.term_type == TermType::F64 && f64::from_bits(BigEndian::read_u64(term)).is_nan() {
            return Err(TesseraError::encode("f64 term must not be NaN"));
        }
        Ok(())
    }

    /// Compare two terms in the schema's logical order.
    ///
    /// Byte terms compare lexicographically. Numeric terms compare by value;
    /// a malformed numeric term falls back to byte order.
    pub fn compare_terms(&self, a: &[u8], b: &[u8]) -> Ordering {
        if !self.term_type.is_numeric()
            || a.len() != NUMERIC_TERM_LEN
            || b.len() != NUMERIC_TERM_LEN
        {
            return a.cmp(b);
        }

        match self.term_type {
            TermType::I64 => BigEndian::read_i64(a).cmp(&BigEndian::read_i64(b)),
            TermType::U64 => BigEndian::read_u64(a).cmp(&BigEndian::read_u64(b)),
            TermType::F64 => BigEndian::read_f64(a).total_cmp(&BigEndian::read_f64(b)),
            TermType::Bytes => a.cmp(b),
        }
    }

    /// Parse human-readable text into term bytes.
    pub fn parse_term(&self, text: &str) -> Result<Vec<u8>> {
        let bytes = match self.term_type {
            TermType::Bytes => return Ok(text.as_bytes().to_vec()),
            TermType::I64 => text
                .trim()
                .parse::<i64>()
                .map(|v| v.to_be_bytes())
                .map_err(|e| TesseraError::invalid_argument(format!("{text:?}: {e}")))?,
            TermType::U64 => text
                .trim()
                .parse::<u64>()
                .map(|v| v.to_be_bytes())
                .map_err(|e| TesseraError::invalid_argument(format!("{text:?}: {e}")))?,
            TermType::F64 => text
                .trim()
                .parse::<f64>()
                .map(|v| v.to_be_bytes())
                .map_err(|e| TesseraError::invalid_argument(format!("{text:?}: {e}")))?,
        };
        Ok(bytes.to_vec())
    }

    /// Render term bytes as text.
    pub fn format_term(&self, term: &[u8]) -> String {
        if term.len() != NUMERIC_TERM_LEN {
            return String::from_utf8_lossy(term).into_owned();
        }
        match self.term_type {
            TermType::Bytes => String::from_utf8_lossy(term).into_owned(),
            TermType::I64 => BigEndian::read_i64(term).to_string(),
            TermType::U64 => BigEndian::read_u64(term).to_string(),
            TermType::F64 => BigEndian::read_f64(term).to_string(),
        }
    }
}
