// ABOUTME: Connection provider whose nodes are directories on the local machine.
// ABOUTME: Remote commands run through `sh -c` inside the node directory; pushes use `cp -R`.

use async_trait::async_trait;
use data_deploy::remote::{CommandOutput, Connection, ConnectionProvider, TransportError};
use data_deploy::reservation::{Node, Reservation};
use data_deploy::types::RemotePath;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub struct LocalCluster {
    root: TempDir,
    nodes: Vec<Node>,
}

impl LocalCluster {
    pub fn new(count: u32) -> Arc<Self> {
        let root = tempfile::tempdir().unwrap();
        let nodes = super::nodes(count);
        for node in &nodes {
            std::fs::create_dir_all(root.path().join(node.hostname.as_str())).unwrap();
        }
        Arc::new(Self { root, nodes })
    }

    pub fn reservation(&self) -> Reservation {
        Reservation::new(self.nodes.clone()).unwrap()
    }

    /// Home directory of node `id`; relative remote paths resolve here.
    pub fn node_dir(&self, id: u32) -> PathBuf {
        self.root.path().join(format!("node{id}"))
    }

    fn dir_of(&self, node: &Node) -> PathBuf {
        self.root.path().join(node.hostname.as_str())
    }

    /// Sorted file names directly inside `path` on node `id`.
    pub fn list(&self, id: u32, path: &str) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.node_dir(id).join(path)) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    pub fn read(&self, id: u32, path: &str) -> String {
        std::fs::read_to_string(self.node_dir(id).join(path)).unwrap()
    }

    pub fn exists(&self, id: u32, path: &str) -> bool {
        self.node_dir(id).join(path).exists()
    }
}

fn to_output(output: std::process::Output) -> CommandOutput {
    CommandOutput {
        exit_code: output.status.code().map(|c| c as u32).unwrap_or(255),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

fn resolve(dir: &Path, path: &str) -> PathBuf {
    dir.join(path.trim_start_matches('/'))
}

#[async_trait]
impl ConnectionProvider for LocalCluster {
    async fn open(&self, node: &Node) -> Result<Arc<dyn Connection>, TransportError> {
        let dir = self.dir_of(node);
        if !dir.is_dir() {
            return Err(TransportError::Open(format!("no directory for node {}", node.id)));
        }
        Ok(Arc::new(LocalConnection {
            node: node.clone(),
            dir,
        }))
    }

    async fn push(
        &self,
        node: &Node,
        source: &Path,
        dest: &RemotePath,
    ) -> Result<CommandOutput, TransportError> {
        let target = resolve(&self.dir_of(node), dest.as_str());
        let output = Command::new("cp")
            .arg("-R")
            .arg(source)
            .arg(format!("{}/", target.display()))
            .stdin(Stdio::null())
            .output()
            .await?;
        Ok(to_output(output))
    }
}

pub struct LocalConnection {
    node: Node,
    dir: PathBuf,
}

#[async_trait]
impl Connection for LocalConnection {
    fn node(&self) -> &Node {
        &self.node
    }

    async fn run(&self, command: &str, input: &[u8]) -> Result<CommandOutput, TransportError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.dir)
            .env("HOME", &self.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child.stdin.take().unwrap();
        let input = input.to_vec();
        let writer = tokio::spawn(async move {
            // The command may exit without reading; a broken pipe is fine.
            let _ = stdin.write_all(&input).await;
        });
        let output = child.wait_with_output().await?;
        writer.await.unwrap();
        Ok(to_output(output))
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
