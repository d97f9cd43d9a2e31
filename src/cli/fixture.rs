//! JSON fixtures describing stored index entries.
//!
//! ```json
//! {
//!   "entries": [
//!     { "series_id": 1, "index_rule_id": 1, "term": "GET", "item_id": 1 },
//!     { "series_id": 1, "index_rule_id": 1, "term": "POST", "item_id": 4 }
//!   ]
//! }
//! ```
//!
//! Terms are written as text and parsed with the index's term schema, so
//! numeric indexes take `"term": "-42"`.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::codec;
use crate::index::config::IndexConfig;
use crate::index::field::FieldKey;
use crate::index::search::LsmIndex;
use crate::util::bytes::u64_to_bytes;

/// One stored `(field, term) -> item` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureEntry {
    pub series_id: u64,
    pub index_rule_id: u32,
    pub term: String,
    pub item_id: u64,
}

/// A set of stored entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub entries: Vec<FixtureEntry>,
}

impl Fixture {
    /// Parse a fixture from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a fixture file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Build an in-memory index holding these entries.
    pub fn into_index(self, config: IndexConfig) -> Result<LsmIndex> {
        let (index, store) = LsmIndex::in_memory(config)?;
        let metadata = *index.term_metadata();

        for entry in &self.entries {
            let term = metadata.parse_term(&entry.term)?;
            let key = codec::marshal_term(
                &FieldKey::new(entry.series_id, entry.index_rule_id),
                &term,
                &metadata,
            )?;
            store.put(key, u64_to_bytes(entry.item_id).to_vec())?;
        }

        debug!(
            "loaded {} fixture entries into index {}",
            self.entries.len(),
            index.config().name
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::field::Field;
    use crate::index::search::Searcher;
    use crate::schema::term::{TermMetadata, TermType};

    #[test]
    fn test_into_index() {
        let fixture = Fixture::from_json_str(
            r#"{"entries": [
                {"series_id": 1, "index_rule_id": 1, "term": "GET", "item_id": 2},
                {"series_id": 1, "index_rule_id": 1, "term": "GET", "item_id": 1}
            ]}"#,
        )
        .unwrap();
        let index = fixture.into_index(IndexConfig::default()).unwrap();
        let list = index
            .match_terms(&Field::new(FieldKey::new(1, 1), "GET"))
            .unwrap();
        assert_eq!(list.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_numeric_terms_are_parsed() {
        let fixture = Fixture {
            entries: vec![FixtureEntry {
                series_id: 3,
                index_rule_id: 4,
                term: "-7".to_string(),
                item_id: 9,
            }],
        };
        let config = IndexConfig::new("latency", TermMetadata::new(TermType::I64));
        let index = fixture.into_index(config).unwrap();
        let list = index
            .match_terms(&Field::new(FieldKey::new(3, 4), (-7i64).to_be_bytes()))
            .unwrap();
        assert_eq!(list.to_vec(), vec![9]);
    }

    #[test]
    fn test_bad_numeric_term() {
        let fixture = Fixture {
            entries: vec![FixtureEntry {
                series_id: 3,
                index_rule_id: 4,
                term: "seven".to_string(),
                item_id: 9,
            }],
        };
        let config = IndexConfig::new("latency", TermMetadata::new(TermType::I64));
        assert!(fixture.into_index(config).is_err());
    }
}
