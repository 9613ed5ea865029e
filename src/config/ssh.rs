// ABOUTME: SSH section of the config file.
// ABOUTME: Port, host-key trust, known-hosts location and command timeout.

use crate::remote::SshSettings;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SshConfig {
    /// Port for config-listed nodes that do not name one.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

fn default_port() -> u16 {
    22
}

fn default_trust_first_connection() -> bool {
    true
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            trust_first_connection: default_trust_first_connection(),
            known_hosts: None,
            command_timeout: default_command_timeout(),
        }
    }
}

impl SshConfig {
    /// Connection settings for a run using `key_path`.
    pub fn settings(&self, key_path: Option<PathBuf>) -> SshSettings {
        SshSettings {
            key_path,
            trust_first_connection: self.trust_first_connection,
            known_hosts_path: self.known_hosts.clone(),
            command_timeout: self.command_timeout,
        }
    }
}
