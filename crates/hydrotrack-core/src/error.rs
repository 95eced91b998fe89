//! Core error types for hydrotrack-core.
//!
//! This module defines the error hierarchy using thiserror. None of these
//! errors is fatal to the host process: they are reported to the caller and
//! leave the tracked level and tracking state untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hydrotrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Rejected external commands
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Decay scheduling errors
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be prepared
    #[error("Cannot prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Water amount must be a positive, finite number of milliliters
    #[error("Invalid amount {amount}: must be a positive, finite number of milliliters")]
    InvalidAmount { amount: f64 },

    /// Adding the amount would push the level past the representable range
    #[error("Adding {amount} ml to {level} ml overflows the hydration level")]
    LevelOverflow { level: f64, amount: f64 },

    /// Engine setting outside its allowed range
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while decoding an external command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Empty input line
    #[error("Empty command")]
    Empty,

    /// Command name not recognised
    #[error("Unknown command: '{0}'")]
    Unknown(String),

    /// Command recognised but its payload is malformed
    #[error("Malformed payload for '{command}': {message}")]
    MalformedPayload { command: String, message: String },
}

/// Errors raised when the decay timer cannot be armed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No tokio runtime is reachable from the arming thread
    #[error("No async runtime available to drive decay ticks")]
    NoRuntime,

    /// A zero period would fire continuously
    #[error("Decay period must be greater than zero")]
    ZeroPeriod,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
