//! Error types for geotrigger-state

use thiserror::Error;

/// Result type for state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur during state management
#[derive(Debug, Error)]
pub enum StateError {
    /// A snapshot could not be serialized
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
