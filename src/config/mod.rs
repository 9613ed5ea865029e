// ABOUTME: Configuration types and parsing for data-deploy.yml.
// ABOUTME: Handles file discovery, defaults and the optional node list.

mod node;
mod ssh;

pub use node::NodeConfig;
pub use ssh::SshConfig;

use crate::error::{Error, Result};
use crate::reservation::Reservation;
use node::NodeEntry;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "data-deploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "data-deploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".data-deploy/config.yml";

/// Directory under `$HOME` searched for external plugins.
pub const PLUGIN_DIRNAME: &str = ".data-deploy";

pub const DEFAULT_DEST: &str = "~/data";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub key_path: Option<PathBuf>,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default = "default_dest")]
    pub dest: String,

    #[serde(default)]
    pub retries: u32,

    #[serde(default)]
    pub max_workers: Option<usize>,

    #[serde(default)]
    pub plugin_dir: Option<PathBuf>,

    #[serde(default)]
    reservation: Option<Vec<NodeEntry>>,
}

fn default_dest() -> String {
    DEFAULT_DEST.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_path: None,
            ssh: SshConfig::default(),
            dest: default_dest(),
            retries: 0,
            max_workers: None,
            plugin_dir: None,
            reservation: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        if config.max_workers == Some(0) {
            return Err(Error::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        // Surface bad node lists at load time rather than mid-command.
        config.reservation()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("using config file {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Load `explicit` if given, otherwise discover in `dir`, otherwise defaults.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::discover(dir) {
            Ok(config) => Ok(config),
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Nodes listed in the file, if any.
    pub fn reservation(&self) -> Result<Option<Reservation>> {
        let Some(entries) = &self.reservation else {
            return Ok(None);
        };

        let nodes = entries
            .iter()
            .cloned()
            .enumerate()
            .map(|(position, entry)| {
                entry
                    .into_node_config()
                    .map(|c| c.into_node(position, self.ssh.port))
                    .map_err(Error::InvalidConfig)
            })
            .collect::<Result<Vec<_>>>()?;

        Reservation::new(nodes).map(Some).map_err(Error::from)
    }

    /// Plugin directory, falling back to `$HOME/.data-deploy`.
    pub fn plugin_dir(&self) -> Option<PathBuf> {
        self.plugin_dir.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(PLUGIN_DIRNAME))
        })
    }
}
