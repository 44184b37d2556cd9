//! Core error types for `SheetSync`.

use thiserror::Error;

/// Core error type for `SheetSync` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown entity kind name.
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),
}
