//! Query-scoped value types: field keys, fields, term ranges and posting values.

use serde::{Deserialize, Serialize};

use crate::index::posting::PostingSet;

/// Identifies a field within an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    /// Series (or shard) the field belongs to.
    pub series_id: u64,
    /// Index rule that produced the field.
    pub index_rule_id: u32,
}

impl FieldKey {
    /// Create a new field key.
    pub fn new(series_id: u64, index_rule_id: u32) -> Self {
        FieldKey {
            series_id,
            index_rule_id,
        }
    }
}

/// A field key plus a term and an optional value payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// The field this term belongs to.
    pub key: FieldKey,
    /// The matched sub-key, e.g. a tag value.
    pub term: Vec<u8>,
    /// Optional payload carried after the term.
    pub value: Option<Vec<u8>>,
}

impl Field {
    /// Create a field with a term and no value.
    pub fn new(key: FieldKey, term: impl Into<Vec<u8>>) -> Self {
        Field {
            key,
            term: term.into(),
            value: None,
        }
    }

    /// Attach a value payload.
    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Traversal direction of a field iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Whether the underlying cursor must run in reverse.
    pub fn is_reverse(&self) -> bool {
        matches!(self, SortOrder::Desc)
    }
}

/// Optional lower and upper term bounds with inclusive/exclusive flags.
///
/// A bound of `None` is unrestricted and its flag is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeOpts {
    pub lower: Option<Vec<u8>>,
    pub upper: Option<Vec<u8>>,
    pub include_lower: bool,
    pub include_upper: bool,
}

impl RangeOpts {
    /// An unrestricted range.
    pub fn all() -> Self {
        RangeOpts::default()
    }

    /// Set the lower bound.
    pub fn lower(mut self, term: impl Into<Vec<u8>>, inclusive: bool) -> Self {
        self.lower = Some(term.into());
        self.include_lower = inclusive;
        self
    }

    /// Set the upper bound.
    pub fn upper(mut self, term: impl Into<Vec<u8>>, inclusive: bool) -> Self {
        self.upper = Some(term.into());
        self.include_upper = inclusive;
        self
    }

    /// Whether neither side is bounded.
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

/// A term and the posting set of every item recorded under it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingValue {
    pub term: Vec<u8>,
    pub value: PostingSet,
}
