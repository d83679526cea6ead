//! Core error types for draftclock-core.
//!
//! A stall failure is *not* an error: it is a normal session outcome and is
//! reported through [`crate::Event::TimeExpired`]. The types here cover
//! misconfiguration and persistence problems.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for draftclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Surface save / recoverable store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

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

    /// Key does not exist in the config tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home / data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors raised before any session state is touched.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Goal amount must be positive
    #[error("goal amount must be greater than zero (got {0})")]
    NonPositiveGoal(i64),
}

/// Persistence errors from surfaces and recoverable stores.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing the draft to its backing location failed
    #[error("Failed to save draft to {path}: {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Appending to the kill file failed
    #[error("Failed to stash killed text in {path}: {message}")]
    StashFailed { path: PathBuf, message: String },

    /// A kill file line could not be decoded
    #[error("Corrupt kill file entry at line {line}: {message}")]
    CorruptEntry { line: usize, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
