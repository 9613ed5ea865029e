// ABOUTME: Connection provider backed by russh sessions and rsync over ssh.
// ABOUTME: Resolves per-node login users and applies the configured SSH settings.

use super::error::TransportError;
use super::{CommandOutput, Connection, ConnectionProvider};
use crate::reservation::Node;
use crate::ssh::{Session, SessionConfig};
use crate::types::RemotePath;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// SSH options shared by every node of a run.
#[derive(Debug, Clone)]
pub struct SshSettings {
    pub key_path: Option<PathBuf>,
    pub trust_first_connection: bool,
    pub known_hosts_path: Option<PathBuf>,
    pub command_timeout: Duration,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            key_path: None,
            trust_first_connection: true,
            known_hosts_path: None,
            command_timeout: Duration::from_secs(300),
        }
    }
}

impl SshSettings {
    fn login_user(node: &Node) -> String {
        node.user()
            .map(str::to_string)
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()))
    }

    fn session_config(&self, node: &Node) -> SessionConfig {
        let mut config = SessionConfig::new(&node.ip_public, Self::login_user(node))
            .port(node.port)
            .trust_on_first_use(self.trust_first_connection)
            .command_timeout(self.command_timeout);
        if let Some(key) = &self.key_path {
            config = config.key_path(key);
        }
        if let Some(known_hosts) = &self.known_hosts_path {
            config = config.known_hosts_path(known_hosts);
        }
        config
    }

    /// The `-e` argument rsync uses to reach a node.
    fn rsync_shell(&self, node: &Node) -> String {
        let mut shell = format!("ssh -p {}", node.port);
        if self.trust_first_connection {
            shell.push_str(" -o StrictHostKeyChecking=accept-new");
        }
        if let Some(known_hosts) = &self.known_hosts_path {
            shell.push_str(&format!(
                " -o UserKnownHostsFile={}",
                super::quote(&known_hosts.to_string_lossy())
            ));
        }
        if let Some(key) = &self.key_path {
            shell.push_str(&format!(
                " -o IdentitiesOnly=yes -i {}",
                super::quote(&key.to_string_lossy())
            ));
        }
        shell
    }
}

/// Provider that reaches nodes over SSH.
#[derive(Debug, Clone, Default)]
pub struct SshProvider {
    settings: SshSettings,
}

impl SshProvider {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SshSettings {
        &self.settings
    }
}

#[async_trait]
impl ConnectionProvider for SshProvider {
    async fn open(&self, node: &Node) -> Result<Arc<dyn Connection>, TransportError> {
        let session = Session::connect(self.settings.session_config(node))
            .await
            .map_err(|e| TransportError::Open(format!("node {} ({}): {}", node.id, node.ip_public, e)))?;
        Ok(Arc::new(SshConnection {
            node: node.clone(),
            session,
        }))
    }

    async fn push(
        &self,
        node: &Node,
        source: &Path,
        dest: &RemotePath,
    ) -> Result<CommandOutput, TransportError> {
        let target = format!(
            "{}@{}:{}/",
            SshSettings::login_user(node),
            node.ip_public,
            dest.as_str().trim_end_matches('/')
        );
        tracing::debug!("rsync {} -> {}", source.display(), target);

        let output = Command::new("rsync")
            .arg("-e")
            .arg(self.settings.rsync_shell(node))
            .args(["-s", "-q", "-aHAXL", "--inplace"])
            .arg(source)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TransportError::Push(format!("failed to spawn rsync: {}", e)))?;

        Ok(CommandOutput {
            // Killed by a signal: report as a generic failure.
            exit_code: output.status.code().map(|c| c as u32).unwrap_or(255),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A node session over SSH.
#[derive(Debug)]
pub struct SshConnection {
    node: Node,
    session: Session,
}

#[async_trait]
impl Connection for SshConnection {
    fn node(&self) -> &Node {
        &self.node
    }

    async fn run(&self, command: &str, input: &[u8]) -> Result<CommandOutput, TransportError> {
        Ok(self.session.exec(command, input).await?)
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(self.session.disconnect().await?)
    }
}
