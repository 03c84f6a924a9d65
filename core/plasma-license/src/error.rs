//! Error types for the licensing module.

use std::path::PathBuf;
use thiserror::Error;

/// Licensing-specific errors.
///
/// Unknown, expired and already-used keys are not errors: they come back
/// as a [`crate::ValidationReason`] inside a [`crate::Validation`].
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Duration descriptor or code name could not be parsed.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A custom code with this name already exists.
    #[error("custom code already exists: {0}")]
    CodeExists(String),

    /// A store file exists but cannot be decrypted or parsed.
    #[error("corrupt store file {}: {reason}", path.display())]
    Corrupt {
        /// The offending file.
        path: PathBuf,
        /// What went wrong while reading it.
        reason: String,
    },

    /// Validator configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Network error talking to a remote license server.
    #[error("network error: {0}")]
    Network(String),

    /// Master key or sealing failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] plasma_crypto::CryptoError),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
