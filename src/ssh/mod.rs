// ABOUTME: SSH transport for remote command execution on reserved nodes.
// ABOUTME: Supports explicit key, SSH agent, and default key authentication with known_hosts checks.

mod client;
mod error;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
