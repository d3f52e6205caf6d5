//! Core error types for voxtimer-core.
//!
//! User-facing results (a timer that cannot be found, a declined prompt) are
//! modelled as outcome enums in [`crate::timer`]. The types here cover internal
//! faults only: persistence and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for voxtimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Snapshot persistence errors
    #[error("Snapshot error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while reading or writing the timer snapshot.
///
/// The engine never surfaces these to the caller; they are logged as degraded
/// persistence and the in-memory set stays authoritative.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// Snapshot blob could not be encoded or decoded
    #[error("Corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Failed to determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Backend refused the write (used by in-memory fakes)
    #[error("Snapshot backend unavailable")]
    Unavailable,
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
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
