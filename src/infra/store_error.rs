//! Error type shared by the store abstractions

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure failure raised by a store backend.
///
/// The in-memory stores never produce these; durable backends may.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage backend unavailable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}
