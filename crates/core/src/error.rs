//! Error types for the annotation store
//!
//! This module defines the errors surfaced to callers of the store.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Filter construction and script evaluation errors live in the filter crate:
//! they never reach a caller of `read_annotations`.

use thiserror::Error;

/// Result type alias for annotation store operations
pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Errors surfaced by the annotation store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    /// A read was issued with `start > stop` or at a level the binning
    /// scheme does not define. The request is rejected.
    #[error("Invalid range: {reason}")]
    InvalidRange {
        /// Human readable reason
        reason: String,
    },

    /// The backing storage failed. Propagated unchanged, never retried here.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The binning scheme is malformed (zero width, broken nesting, ...)
    #[error("Invalid binning: {0}")]
    InvalidBinning(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnnotationError {
    /// Build an `InvalidRange` error
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        AnnotationError::InvalidRange {
            reason: reason.into(),
        }
    }

    /// Build a `StorageUnavailable` error
    pub fn storage(reason: impl Into<String>) -> Self {
        AnnotationError::StorageUnavailable(reason.into())
    }

    /// Returns true if the error was caused by the caller's arguments
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, AnnotationError::InvalidRange { .. })
    }
}
