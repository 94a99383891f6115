//! Error types for Remuda.
//!
//! A single error enum covers the whole create flow: request validation,
//! local file I/O during hashing and modelfile loading, transport failures
//! against the backend, and errors the backend reports inside a create
//! progress stream.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Remuda operations.
#[derive(Debug, Error)]
pub enum RemudaError {
    // Request validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    // Configuration / environment errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// The backend answered with a status that is neither success nor a
    /// classified not-found. Never conflated with blob absence.
    #[error("Backend returned {status} for {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The backend reported a failure inside a create progress line.
    #[error("Model creation failed: {message}")]
    Backend { message: String },
}

/// Result type alias for Remuda operations.
pub type Result<T> = std::result::Result<T, RemudaError>;

// Conversion implementations for common error types

impl From<std::io::Error> for RemudaError {
    fn from(err: std::io::Error) -> Self {
        RemudaError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for RemudaError {
    fn from(err: serde_json::Error) -> Self {
        RemudaError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for RemudaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemudaError::Timeout(std::time::Duration::from_secs(0))
        } else {
            RemudaError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl RemudaError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RemudaError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        RemudaError::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        RemudaError::Config {
            message: message.into(),
        }
    }
}
