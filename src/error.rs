//! Error types for the Sluice library.
//!
//! All errors are represented by the [`SluiceError`] enum. Only fatal
//! preconditions (bad configuration, empty inputs, a store that cannot be
//! opened or a bucket that cannot be created) travel back to the caller as
//! `Err`. Failures of a single record or a single batch are logged and
//! counted by the worker that hit them.
//!
//! # Examples
//!
//! ```
//! use sluice::error::{SluiceError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SluiceError::invalid_config("worker_count must be at least 1"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Sluice operations.
#[derive(Error, Debug)]
pub enum SluiceError {
    /// I/O errors (reading input files, creating directories)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input errors (missing or empty identity list or corpus)
    #[error("Input error: {0}")]
    Input(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Record encoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool construction errors
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SluiceError.
pub type Result<T> = std::result::Result<T, SluiceError>;

impl SluiceError {
    /// Create a new configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SluiceError::Config(msg.into())
    }

    /// Create a new input error.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        SluiceError::Input(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SluiceError::Storage(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        SluiceError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SluiceError::Other(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        SluiceError::Other(format!("Not found: {}", msg.into()))
    }

    /// Whether this error aborts a run before any worker starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SluiceError::Config(_)
                | SluiceError::Input(_)
                | SluiceError::Storage(_)
                | SluiceError::ThreadPool(_)
                | SluiceError::Io(_)
        )
    }
}

impl From<rocksdb::Error> for SluiceError {
    fn from(err: rocksdb::Error) -> Self {
        SluiceError::Storage(err.to_string())
    }
}
