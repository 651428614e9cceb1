//! Core error types for restwell-core.
//!
//! The timer itself never fails on bad input: missing signals are skipped,
//! durations are clamped and invalid transitions are no-ops. Errors here
//! cover configuration, the engine lifecycle, and coaching sink failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for restwell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The engine was released and can no longer start a countdown
    #[error("Rest timer engine has been released")]
    EngineReleased,

    /// The engine was constructed outside of a tokio runtime
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Lower bound above upper bound
    #[error("Invalid range for '{field}': min ({min}) must not exceed max ({max})")]
    InvalidRange { field: String, min: u32, max: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failure reported by a coaching sink.
///
/// Sink failures never reach the caller of the engine; the dispatcher logs
/// them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink has not been initialized or was already released
    #[error("Coaching sink unavailable: {0}")]
    Unavailable(String),

    /// The underlying audio/voice output failed
    #[error("Playback failed: {0}")]
    Playback(String),
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        CoreError::Custom(format!("TOML serialization failed: {err}"))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
