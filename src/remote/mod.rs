// ABOUTME: Boundary between the deploy engine and the machines it drives.
// ABOUTME: Per-node command sessions, control-machine pushes, and the typed remote task table.

mod error;
mod ssh;
mod task;

pub use error::TransportError;
pub use ssh::{SshConnection, SshProvider, SshSettings};
pub use task::{ForwardTarget, RemoteScript, RemoteTask, quote, quote_glob};

pub use crate::ssh::CommandOutput;

use crate::reservation::Node;
use crate::types::RemotePath;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// An open command-execution session on one node.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Node this session is attached to.
    fn node(&self) -> &Node;

    /// Run a command through the remote shell with `input` on its stdin,
    /// and wait for it to finish.
    async fn run(&self, command: &str, input: &[u8]) -> Result<CommandOutput, TransportError>;

    /// Close the session. Closing twice is harmless.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Opens sessions and moves bytes from the control machine to nodes.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn open(&self, node: &Node) -> Result<Arc<dyn Connection>, TransportError>;

    /// Copy a local file or directory into `dest` on `node`, keeping its basename.
    async fn push(
        &self,
        node: &Node,
        source: &Path,
        dest: &RemotePath,
    ) -> Result<CommandOutput, TransportError>;
}

/// Run a script on a connection, turning a transport failure into an error.
pub async fn run_script(
    connection: &dyn Connection,
    script: &RemoteScript,
) -> Result<CommandOutput, TransportError> {
    let command = script.render();
    let input = script.input();
    tracing::debug!(
        node = %connection.node().id,
        input_bytes = input.len(),
        "running: {}",
        command
    );
    connection.run(&command, input.as_bytes()).await
}
