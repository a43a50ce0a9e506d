//! Error types for queue-worker.

use thiserror::Error;

/// Main error type for all worker operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (oversized frame, bad flags, malformed envelope, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connecting to the broker took longer than the configured timeout.
    #[error("Connect timed out")]
    ConnectTimeout,

    /// A command handler reported an unrecoverable failure.
    #[error("Handler error: {0}")]
    Handler(String),
}

/// Result type alias using WorkerError.
pub type Result<T> = std::result::Result<T, WorkerError>;
