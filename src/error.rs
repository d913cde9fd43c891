//! Error handling for the upload orchestrator
//!
//! This module defines the error type shared by the hasher, compressor,
//! upload pipeline and batch orchestrator, together with the helper
//! constructors collaborators use to report failures.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UploadError>;

/// Error types that can occur while processing an upload batch
#[derive(Error, Debug)]
pub enum UploadError {
    /// Reading the local solve cache failed
    #[error("Cache lookup failed: {message}")]
    CacheLookup { message: String },

    /// Image bytes could not be decoded or re-encoded
    #[error("Compression failed: {message}")]
    Compression { message: String },

    /// Transport failure while talking to the remote solver
    #[error("Network error: {message}")]
    Network { message: String },

    /// The remote solver reported that the job failed
    #[error("Remote job failed: {message}")]
    RemoteJob { message: String },

    /// Persisting or reading a stored result failed
    #[error("Storage operation failed: {operation} - {message}")]
    Storage { operation: String, message: String },

    /// Reading a selected image failed
    #[error("Image source error: {message}")]
    Source { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Polling exceeded the configured deadline
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// Operation was cancelled
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background task panicked or was aborted
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl UploadError {
    /// Create a new cache lookup error
    pub fn cache_lookup(message: impl Into<String>) -> Self {
        UploadError::CacheLookup {
            message: message.into(),
        }
    }

    /// Create a new compression error
    pub fn compression(message: impl Into<String>) -> Self {
        UploadError::Compression {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        UploadError::Network {
            message: message.into(),
        }
    }

    /// Create a new remote job error
    pub fn remote_job(message: impl Into<String>) -> Self {
        UploadError::RemoteJob {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new image source error
    pub fn image_source(message: impl Into<String>) -> Self {
        UploadError::Source {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        UploadError::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        UploadError::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a new cancelled error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        UploadError::Cancelled {
            operation: operation.into(),
        }
    }

    /// The message recorded on a failed batch item.
    ///
    /// Network and remote job failures carry the collaborator's message as-is,
    /// so the user sees exactly what the transport or solver reported.
    pub fn item_message(&self) -> String {
        match self {
            UploadError::Network { message } | UploadError::RemoteJob { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
