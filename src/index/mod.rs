//! Inverted index read path.
//!
//! Fields are encoded into order-preserving keys ([`codec`]), scanned from the
//! ordered store term by term ([`iterator`]), and folded into compressed
//! posting sets ([`posting`]) behind the [`search::Searcher`] surface.

pub mod codec;
pub mod config;
pub mod field;
pub mod iterator;
pub mod posting;
pub mod search;

// Re-export commonly used types
pub use config::IndexConfig;
pub use field::{Field, FieldKey, PostingValue, RangeOpts, SortOrder};
pub use iterator::FieldIterator;
pub use posting::PostingSet;
pub use search::{LsmIndex, Searcher};
