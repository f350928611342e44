//! Error types for the monitoring engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the engine facade
///
/// Backend and collaborator failures never appear here; they are
/// logged and swallowed inside the worker (the engine degrades rather
/// than propagates). These variants cover the facade boundary only.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was asked to do backend work before a device was
    /// registered
    #[error("No registered device; engine is running geometry-only")]
    NotReady,

    /// A location sample failed the coordinate validity invariant
    #[error("Invalid location sample ({latitude}, {longitude}); discarded")]
    InvalidLocation {
        latitude: f64,
        longitude: f64,
    },

    /// The background worker is gone; the engine is unusable
    #[error("Engine worker disconnected")]
    WorkerDisconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EngineError::InvalidLocation {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(format!("{}", err).contains("91"));
        assert!(format!("{}", EngineError::NotReady).contains("geometry-only"));
    }
}
