//! Error types for the metrics engine.

use thiserror::Error;

/// Errors raised by the metrics engine.
///
/// Both kinds are unrecoverable at the point of computation and propagate to
/// the caller unchanged: the engine never clamps values, substitutes
/// defaults, or returns a partially filled bundle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An input value was malformed or out of range (negative load,
    /// non-finite number, empty label set, ...).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Threshold, weight, or projection configuration was missing or
    /// malformed for a requested metric kind.
    #[error("bad configuration: {0}")]
    Configuration(String),
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
