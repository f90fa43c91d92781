//! Core error types for teawindow-core.
//!
//! Session transitions never fail: an action that makes no sense in the
//! current mode is a silent no-op, and a progress write that fails during
//! a completion is absorbed (the in-memory counters stay authoritative).
//! The errors below cover the fallible edges: configuration, the SQLite
//! store, and the geolocation lookup. Each edge surfaces its own enum;
//! callers that mix them hold a `Box<dyn Error>`.

use std::path::PathBuf;
use thiserror::Error;

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Data directory could not be created
    #[error("Failed to prepare store directory: {0}")]
    DirFailed(#[from] std::io::Error),

    /// Failed to open the store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Store migration failed: {0}")]
    MigrationFailed(String),

    /// Store is locked by another process
    #[error("Store is locked")]
    Locked,
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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Geolocation-specific errors.
///
/// Callers treat every variant the same way (fall back to the fixed sun
/// times); the distinctions exist for logging and tests.
#[derive(Error, Debug)]
pub enum GeoError {
    /// Lookup did not answer within the budget
    #[error("Location lookup timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Transport-level failure
    #[error("Location request failed: {0}")]
    Http(String),

    /// Response body did not carry usable coordinates
    #[error("Malformed location response: {0}")]
    Malformed(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        GeoError::Http(err.to_string())
    }
}
