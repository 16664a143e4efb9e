//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The envelope could not be decoded, authenticated, or parsed.
    /// Deliberately coarse: callers must not learn which step failed.
    #[error("invalid envelope")]
    InvalidEnvelope,

    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    #[error("encryption failed: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
