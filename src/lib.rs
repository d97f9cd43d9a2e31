//! # Tessera
//!
//! The query side of an inverted index kept in an ordered key-value store.
//!
//! ## Features
//!
//! - Order-preserving key encoding for byte and numeric terms
//! - Compressed 64-bit posting sets
//! - Term-grouping iteration in ascending or descending order
//! - Exact-term, whole-field and term-range queries
//! - Pluggable store backends

pub mod cli;
pub mod error;
pub mod index;
pub mod schema;
pub mod storage;
pub mod util;

pub mod prelude {
    pub use crate::error::{Result, TesseraError};
    pub use crate::index::{
        Field, FieldIterator, FieldKey, IndexConfig, LsmIndex, PostingSet, PostingValue,
        RangeOpts, Searcher, SortOrder,
    };
    pub use crate::schema::{TermMetadata, TermType};
    pub use crate::storage::{KvIterator, KvStore, MemoryKvStore};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
