//! Error type for engine operations.
//!
//! Every failure is a local computation error. Components are pure, so an
//! error never leaves shared state half-updated.

/// Top-level error type for all engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid or missing configuration (half-life, window capacity, detection rules).
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Token budget was zero or negative.
    #[error("invalid token budget {0}: must be a positive integer")]
    InvalidBudget(i64),
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Create a configuration error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }
}
