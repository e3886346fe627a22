//! Error types for ContextCore operations
//!
//! Every fallible operation in the library returns [`Result`], carrying a
//! [`ContextCoreError`] that names which tier of the resolution path failed.

use thiserror::Error;

/// Main error type for ledger, detector and arbiter operations
#[derive(Error, Debug)]
pub enum ContextCoreError {
    /// Malformed vector input (empty, NaN or infinite components)
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Request names no usable segment
    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    /// Vector length does not match the configured or stored dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Ledger rejected a write
    #[error("Ledger write failed: {0}")]
    LedgerWrite(String),

    /// Drift detector could not produce a verdict
    #[error("Drift detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// Fallback recompute failed
    #[error("Recompute failed: {0}")]
    Recompute(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for ContextCore operations
pub type Result<T> = std::result::Result<T, ContextCoreError>;

impl From<String> for ContextCoreError {
    fn from(s: String) -> Self {
        ContextCoreError::Other(s)
    }
}

impl From<&str> for ContextCoreError {
    fn from(s: &str) -> Self {
        ContextCoreError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for ContextCoreError {
    fn from(e: serde_json::Error) -> Self {
        ContextCoreError::SerializationError(e.to_string())
    }
}
