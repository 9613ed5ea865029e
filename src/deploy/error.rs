// ABOUTME: Error types for deploy and clean operations.
// ABOUTME: Configuration, connectivity, remote command and size-constraint failures.

use crate::fanout::TaskPanic;
use crate::remote::TransportError;
use crate::types::{NodeId, RemotePathError};
use std::fmt;
use std::path::PathBuf;

/// A source file larger than the gateway's maximum object size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeViolation {
    pub path: PathBuf,
    pub size: u64,
}

/// Every oversized file of a plan, with the limit they were checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeViolations {
    pub limit: u64,
    pub files: Vec<SizeViolation>,
}

impl fmt::Display for SizeViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) exceed the maximum object size of {} bytes:",
            self.files.len(),
            self.limit
        )?;
        for violation in &self.files {
            write!(
                f,
                " {} ({} bytes > {} bytes);",
                violation.path.display(),
                violation.size,
                self.limit
            )?;
        }
        Ok(())
    }
}

/// Errors that can occur while deploying or cleaning a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Destination or clean path failed sanitization.
    #[error("invalid remote path: {0}")]
    InvalidPath(#[from] RemotePathError),

    #[error("no source paths given")]
    NoSources,

    #[error("source path does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("invalid plugin arguments: {0}")]
    InvalidArgs(String),

    #[error("invalid stripe size {0} MiB: must be at least 4 and a multiple of 4")]
    InvalidStripe(u64),

    #[error("admin node {0} is not part of the reservation")]
    UnknownAdmin(NodeId),

    /// Catch-all for configuration problems detected before remote work.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not connect to node {node}: {reason}")]
    Connectivity { node: NodeId, reason: String },

    #[error("command failed on node {node} (exit code {exit_code}): {stderr}")]
    RemoteCommand {
        node: NodeId,
        exit_code: u32,
        stderr: String,
    },

    /// The session broke while a command was running.
    #[error("transport failure on node {node}: {reason}")]
    Transport { node: NodeId, reason: String },

    #[error("{0}")]
    SizeConstraint(SizeViolations),

    /// Failure reported by an external strategy executable.
    #[error("plugin failure: {0}")]
    Plugin(String),

    #[error(transparent)]
    Panicked(#[from] TaskPanic),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Rejected before any remote work started.
    Configuration,
    /// A session could not be opened.
    Connectivity,
    /// A remote command or push exited non-zero or lost its session.
    RemoteCommand,
    /// A file is too large for the storage layout.
    SizeConstraint,
    /// An external strategy reported failure.
    Plugin,
    /// A worker task panicked.
    Internal,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::InvalidPath(_)
            | DeployError::NoSources
            | DeployError::SourceNotFound(_)
            | DeployError::SourceRead { .. }
            | DeployError::UnknownPlugin(_)
            | DeployError::InvalidArgs(_)
            | DeployError::InvalidStripe(_)
            | DeployError::UnknownAdmin(_)
            | DeployError::Config(_) => DeployErrorKind::Configuration,
            DeployError::Connectivity { .. } => DeployErrorKind::Connectivity,
            DeployError::RemoteCommand { .. } | DeployError::Transport { .. } => {
                DeployErrorKind::RemoteCommand
            }
            DeployError::SizeConstraint(_) => DeployErrorKind::SizeConstraint,
            DeployError::Plugin(_) => DeployErrorKind::Plugin,
            DeployError::Panicked(_) => DeployErrorKind::Internal,
        }
    }

    /// Node the failure happened on, if it is node-specific.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            DeployError::Connectivity { node, .. }
            | DeployError::RemoteCommand { node, .. }
            | DeployError::Transport { node, .. } => Some(*node),
            DeployError::UnknownAdmin(node) => Some(*node),
            _ => None,
        }
    }

    pub fn connectivity(node: NodeId, err: TransportError) -> Self {
        DeployError::Connectivity {
            node,
            reason: err.to_string(),
        }
    }

    pub fn transport(node: NodeId, err: TransportError) -> Self {
        DeployError::Transport {
            node,
            reason: err.to_string(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        DeployError::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_constraint_names_every_file_and_both_sizes() {
        let err = DeployError::SizeConstraint(SizeViolations {
            limit: 4 * 1024 * 1024,
            files: vec![
                SizeViolation {
                    path: PathBuf::from("big.bin"),
                    size: 10 * 1024 * 1024,
                },
                SizeViolation {
                    path: PathBuf::from("bigger.bin"),
                    size: 20 * 1024 * 1024,
                },
            ],
        });

        let message = err.to_string();
        assert!(message.contains("big.bin (10485760 bytes > 4194304 bytes)"));
        assert!(message.contains("bigger.bin (20971520 bytes"));
        assert_eq!(err.kind(), DeployErrorKind::SizeConstraint);
    }

    #[test]
    fn kinds_group_configuration_errors() {
        assert_eq!(DeployError::NoSources.kind(), DeployErrorKind::Configuration);
        assert_eq!(
            DeployError::InvalidStripe(6).kind(),
            DeployErrorKind::Configuration
        );
        assert_eq!(
            DeployError::from(RemotePathError::HomeDirectory).kind(),
            DeployErrorKind::Configuration
        );
    }

    #[test]
    fn remote_command_carries_node() {
        let err = DeployError::RemoteCommand {
            node: NodeId::new(3),
            exit_code: 1,
            stderr: "no space left".to_string(),
        };
        assert_eq!(err.node(), Some(NodeId::new(3)));
        assert_eq!(err.kind(), DeployErrorKind::RemoteCommand);
        assert!(err.to_string().contains("no space left"));
    }
}
