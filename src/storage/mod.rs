//! Ordered key-value store abstraction.
//!
//! The index only reads through a cursor and an exact-key lookup, so any
//! ordered engine can sit behind [`KvStore`]. [`MemoryKvStore`] is the
//! in-process adapter used by tests and the CLI.

pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use memory::*;
pub use traits::*;
