//! Common error types for shipform

use thiserror::Error;

/// Common result type for shipform operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across shipform crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payload from a collaborator did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),
}
