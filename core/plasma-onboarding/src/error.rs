//! Error types for client launching.

use thiserror::Error;

/// Failure to hand a credential to the client process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The launcher is not usable as configured.
    #[error("launcher misconfigured: {0}")]
    Config(String),

    /// The client process could not be spawned.
    #[error("failed to spawn client: {0}")]
    Spawn(#[from] std::io::Error),

    /// The launcher refused the request.
    #[error("launch rejected: {0}")]
    Rejected(String),
}

pub type LaunchResult<T> = Result<T, LaunchError>;
