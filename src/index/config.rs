//! Index configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError};
use crate::schema::term::TermMetadata;
use crate::storage::traits::StoreConfig;

/// Configuration for an [`LsmIndex`](crate::index::search::LsmIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Name used in log and error messages.
    pub name: String,

    /// Schema for the terms of this index.
    #[serde(default)]
    pub term_metadata: TermMetadata,

    /// Options for the backing store when the index owns it.
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            name: "default".to_string(),
            term_metadata: TermMetadata::default(),
            store: StoreConfig::default(),
        }
    }
}

impl IndexConfig {
    /// Create a configuration with the given name and term schema.
    pub fn new(name: impl Into<String>, term_metadata: TermMetadata) -> Self {
        IndexConfig {
            name: name.into(),
            term_metadata,
            ..IndexConfig::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the configuration for obvious mistakes.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TesseraError::invalid_config("index name must not be empty"));
        }
        if self.store.max_open_iterators == Some(0) {
            return Err(TesseraError::invalid_config(
                "max_open_iterators must be at least 1",
            ));
        }
        Ok(())
    }
}
