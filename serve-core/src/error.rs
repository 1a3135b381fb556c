//! Error types for serve

use thiserror::Error;

/// Result type for serve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for serve
///
/// Only startup and lifecycle failures surface here. Per-request failures
/// are turned into HTTP responses by the handler and never reach this type.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Signal handlers could not be installed
    #[error("Signal error: {0}")]
    Signal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
