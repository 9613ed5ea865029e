// ABOUTME: Transport-level failures from connection providers.
// ABOUTME: Wraps SSH errors and local process failures of the push tool.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not open session: {0}")]
    Open(String),

    #[error("remote execution failed: {0}")]
    Exec(String),

    #[error("push failed: {0}")]
    Push(String),

    #[error(transparent)]
    Ssh(#[from] crate::ssh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
