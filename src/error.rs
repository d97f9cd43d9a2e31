//! Error types for the Tessera library.
//!
//! All errors are represented by the [`TesseraError`] enum. Query paths that can
//! fail in more than one place (for example a merge failure followed by a cursor
//! close failure) report every failure through [`TesseraError::Multiple`].
//!
//! # Examples
//!
//! ```
//! use tessera::error::{TesseraError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TesseraError::decode("truncated key"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Tessera operations.
#[derive(Error, Debug)]
pub enum TesseraError {
    /// I/O errors (fixture files, serialization buffers)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A field does not conform to the term schema during marshaling
    #[error("Encode error: {0}")]
    Encode(String),

    /// Malformed or truncated bytes during unmarshaling
    #[error("Decode error: {0}")]
    Decode(String),

    /// A key is absent from the ordered store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Several failures collected from one operation
    #[error("{}", join_errors(.0))]
    Multiple(Vec<TesseraError>),

    /// Invalid configuration or arguments
    #[error("Error: {0}")]
    Other(String),
}

fn join_errors(errors: &[TesseraError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for operations that may fail with TesseraError.
pub type Result<T> = std::result::Result<T, TesseraError>;

impl TesseraError {
    /// Create a new encode error.
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        TesseraError::Encode(msg.into())
    }

    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        TesseraError::Decode(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        TesseraError::NotFound(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        TesseraError::Storage(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        TesseraError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TesseraError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Whether this error means the key was absent from the store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TesseraError::NotFound(_))
    }

    /// Collapse collected failures into a single result.
    ///
    /// No failures yields `Ok(())`, a single failure is returned as is, and
    /// several failures are kept together in [`TesseraError::Multiple`] in the
    /// order they happened. Nested aggregates are flattened.
    pub fn aggregate(errors: Vec<TesseraError>) -> Result<()> {
        let mut flat = Vec::with_capacity(errors.len());
        for error in errors {
            match error {
                TesseraError::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Ok(()),
            1 => Err(flat.remove(0)),
            _ => Err(TesseraError::Multiple(flat)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TesseraError::encode("term must be 8 bytes");
        assert_eq!(error.to_string(), "Encode error: term must be 8 bytes");

        let error = TesseraError::decode("truncated key");
        assert_eq!(error.to_string(), "Decode error: truncated key");

        let error = TesseraError::not_found("key");
        assert!(error.is_not_found());
        assert!(!TesseraError::storage("closed").is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let tessera_error = TesseraError::from(io_error);

        match tessera_error {
            TesseraError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_aggregate() {
        assert!(TesseraError::aggregate(Vec::new()).is_ok());

        let single = TesseraError::aggregate(vec![TesseraError::decode("bad")]).unwrap_err();
        assert!(matches!(single, TesseraError::Decode(_)));

        let both = TesseraError::aggregate(vec![
            TesseraError::decode("bad key"),
            TesseraError::storage("close failed"),
        ])
        .unwrap_err();
        match &both {
            TesseraError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("Expected aggregated error, got {other:?}"),
        }
        assert_eq!(
            both.to_string(),
            "Decode error: bad key; Storage error: close failed"
        );
    }

    #[test]
    fn test_aggregate_flattens_nested() {
        let nested = TesseraError::Multiple(vec![
            TesseraError::decode("a"),
            TesseraError::decode("b"),
        ]);
        let err = TesseraError::aggregate(vec![nested, TesseraError::storage("c")]).unwrap_err();
        match err {
            TesseraError::Multiple(errors) => assert_eq!(errors.len(), 3),
            other => panic!("Expected aggregated error, got {other:?}"),
        }
    }
}
