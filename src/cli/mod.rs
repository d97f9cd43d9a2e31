//! Command Line Interface for Tessera.

pub mod args;
pub mod commands;
pub mod fixture;
pub mod output;

// Re-export commonly used types
pub use args::*;
pub use commands::*;
pub use fixture::*;
pub use output::*;
