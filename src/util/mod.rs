//! Utility modules for Tessera.

pub mod bytes;
