//! Term schema for index fields.

pub mod term;

pub use term::{TermMetadata, TermType};
