//! Ordered key-value store abstraction and common types.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError};

/// A cursor over entries of an ordered store.
///
/// Entries are visited in lexicographic key order, reversed if the cursor was
/// opened in reverse. A key holding several values yields one entry per value.
/// The cursor must be closed by its owner to release store resources.
pub trait KvIterator: Send {
    /// Whether the cursor is positioned on an entry.
    fn valid(&self) -> bool;

    /// Advance to the next entry.
    fn next(&mut self);

    /// Key of the current entry. Only meaningful while `valid()`.
    fn key(&self) -> &[u8];

    /// Value of the current entry. Only meaningful while `valid()`.
    fn val(&self) -> &[u8];

    /// Release the cursor.
    fn close(&mut self) -> Result<()>;
}

/// Read capabilities of an ordered key-value store.
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Open a cursor.
    ///
    /// A forward cursor starts at the first key `>= seek`; a reverse cursor
    /// starts at the last key `<= seek`. Without `seek` the cursor starts at
    /// the first (or last) key of the store.
    fn iter(&self, seek: Option<&[u8]>, reverse: bool) -> Result<Box<dyn KvIterator>>;

    /// Visit every value stored under exactly `key`.
    ///
    /// Stops at the first error returned by `visit` and propagates it. Returns
    /// [`TesseraError::NotFound`] when the key holds no values.
    fn get_all(&self, key: &[u8], visit: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<()>;
}

/// Configuration for store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Drop duplicate values written under the same key.
    pub dedup_values: bool,

    /// Upper bound on open cursors, if any.
    pub max_open_iterators: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            dedup_values: true,
            max_open_iterators: None,
        }
    }
}

/// Error types specific to store operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Key holds no values.
    KeyNotFound(String),

    /// Cursor was already closed.
    IteratorClosed,

    /// Too many cursors are open.
    TooManyIterators(usize),

    /// Invalid operation.
    InvalidOperation(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::KeyNotFound(key) => write!(f, "Key not found: {key}"),
            StorageError::IteratorClosed => write!(f, "Iterator is already closed"),
            StorageError::TooManyIterators(limit) => {
                write!(f, "Too many open iterators (limit {limit})")
            }
            StorageError::InvalidOperation(msg) => write!(f, "Invalid operation: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for TesseraError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::KeyNotFound(_) => TesseraError::not_found(err.to_string()),
            other => TesseraError::storage(other.to_string()),
        }
    }
}

/// Render a key for messages.
pub fn display_key(key: &[u8]) -> String {
    key.iter().map(|b| format!("{b:02x}")).collect()
}
