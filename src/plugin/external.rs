// ABOUTME: Strategies implemented by executables in the plugin directory.
// ABOUTME: Talks to them with JSON over argv, stdin and stdout.

use super::{PluginArgs, Strategy};
use crate::deploy::{DeployError, DeployRequest};
use crate::diagnostics::{Phase, StrategyReport};
use crate::remote::ConnectionProvider;
use crate::reservation::Reservation;
use crate::types::{Multiplier, RemotePath};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// File name suffix that marks an executable as a strategy plugin.
pub const PLUGIN_EXTENSION: &str = ".deploy-plugin";

/// Every `<name>.deploy-plugin` file in `dir`, sorted by name.
pub fn find_plugins(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("no plugins loaded from {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut plugins: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let name = file_name.strip_suffix(PLUGIN_EXTENSION)?;
            (!name.is_empty()).then(|| (name.to_string(), entry.path()))
        })
        .collect();
    plugins.sort();
    plugins
}

#[derive(Debug, Deserialize)]
struct Description {
    description: String,
    #[serde(default)]
    origin: Option<String>,
}

/// Request document written to the plugin's stdin on `execute`.
#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    nodes: &'a Reservation,
    key_path: Option<&'a Path>,
    sources: &'a [PathBuf],
    destination: &'a RemotePath,
    silent: bool,
    sudo: bool,
    copy_multiplier: Multiplier,
    link_multiplier: Multiplier,
    positional: &'a [String],
    options: &'a BTreeMap<String, String>,
}

/// A strategy backed by an external executable.
#[derive(Debug, Clone)]
pub struct ExternalStrategy {
    name: String,
    path: PathBuf,
    description: String,
    origin: String,
}

impl ExternalStrategy {
    /// Load a plugin by asking it to describe itself.
    pub async fn load(name: &str, path: &Path) -> Result<Self, String> {
        let output = invoke(path, &["describe".to_string()], None).await?;
        if !output.status.success() {
            return Err(format!(
                "describe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let description: Description = serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("invalid describe output: {}", e))?;
        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            description: description.description,
            origin: description
                .origin
                .unwrap_or_else(|| path.display().to_string()),
        })
    }
}

#[async_trait]
impl Strategy for ExternalStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    async fn parse(&self, argv: &[String]) -> Result<PluginArgs, DeployError> {
        let mut args = vec!["parse".to_string()];
        args.extend(argv.iter().cloned());

        let output = invoke(&self.path, &args, None)
            .await
            .map_err(DeployError::Plugin)?;
        if !output.status.success() {
            return Err(DeployError::InvalidArgs(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| DeployError::Plugin(format!("invalid parse output: {}", e)))
    }

    async fn execute(
        &self,
        _provider: Arc<dyn ConnectionProvider>,
        request: &DeployRequest,
        args: &PluginArgs,
    ) -> StrategyReport {
        let options = &request.options;
        let document = ExecuteRequest {
            nodes: &request.reservation,
            key_path: request.key_path.as_deref(),
            sources: &request.sources,
            destination: &options.dest,
            silent: options.silent,
            sudo: options.sudo,
            copy_multiplier: options.copy_multiplier,
            link_multiplier: options.link_multiplier,
            positional: &args.positional,
            options: &args.options,
        };
        let input = match serde_json::to_vec(&document) {
            Ok(input) => input,
            Err(e) => {
                return StrategyReport::rejected(
                    &self.name,
                    Phase::Plugin,
                    DeployError::Plugin(format!("cannot encode request: {}", e)),
                );
            }
        };

        let mut report = StrategyReport::new(&self.name);
        match invoke(&self.path, &["execute".to_string()], Some(&input)).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let mut lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty());
                let first = lines.next();
                if first.is_none() {
                    report.fail(
                        Phase::Plugin,
                        DeployError::Plugin(format!("{} exited with {}", self.name, output.status)),
                    );
                }
                for line in first.into_iter().chain(lines) {
                    report.fail(Phase::Plugin, DeployError::Plugin(line.to_string()));
                }
            }
            Err(e) => report.fail(Phase::Plugin, DeployError::Plugin(e)),
        }
        report
    }
}

async fn invoke(path: &Path, args: &[String], input: Option<&[u8]>) -> Result<Output, String> {
    tracing::debug!("running plugin {} {}", path.display(), args.join(" "));

    let mut child = Command::new(path)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to run {}: {}", path.display(), e))?;

    // Plugins may print before they read the request.
    let stdin = child.stdin.take();
    let write = async move {
        if let (Some(input), Some(mut stdin)) = (input, stdin) {
            stdin.write_all(input).await?;
        }
        Ok::<(), std::io::Error>(())
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output.map_err(|e| format!("failed to wait for {}: {}", path.display(), e))?;

    match written {
        // Exited without reading the whole request.
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(output),
        Err(e) => Err(format!("failed to write request: {}", e)),
        Ok(()) => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_only_plugin_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zeta.deploy-plugin"), "").unwrap();
        fs::write(dir.path().join("alpha.deploy-plugin"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join(".deploy-plugin"), "").unwrap();
        fs::create_dir(dir.path().join("dir.deploy-plugin")).unwrap();

        let names: Vec<_> = find_plugins(dir.path())
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_plugins(&dir.path().join("absent")).is_empty());
    }
}
