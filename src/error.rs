//! Recoverable errors
//!
//! Gameplay invariants (slot indices, rank range, player count) are enforced by
//! assertions at the call site. Only configuration and persistence can fail at
//! runtime, and callers usually log the error and fall back to defaults.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// A configuration value is outside its valid range
    #[error("invalid config value `{name}` = {value}: expected {expected}")]
    InvalidConfig {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A URL query parameter could not be parsed
    #[error("bad query parameter `{key}`: {value:?}")]
    BadQuery { key: String, value: String },

    /// Stored JSON (scores, settings) could not be read or written
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser storage is unavailable or refused the write
    #[error("storage unavailable: {0}")]
    Storage(String),
}

pub type GameResult<T> = Result<T, GameError>;
