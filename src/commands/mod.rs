// ABOUTME: Command module aggregator for the data-deploy CLI.
// ABOUTME: Holds what every command shares: config, SSH provider and reservation input.

mod clean;
mod deploy;
mod plugin;

pub use clean::clean;
pub use deploy::deploy;
pub use plugin::list_plugins;

use data_deploy::config::Config;
use data_deploy::error::{Error, Result};
use data_deploy::plugin::Registry;
use data_deploy::remote::{ConnectionProvider, SshProvider};
use data_deploy::reservation::{Reservation, read_reservation};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings resolved from global flags and the config file.
pub struct Context {
    pub config: Config,
    pub key_path: Option<PathBuf>,
}

impl Context {
    pub fn new(config: Config, key_path: Option<PathBuf>) -> Self {
        let key_path = key_path.or_else(|| config.key_path.clone());
        Self { config, key_path }
    }

    pub fn provider(&self) -> Arc<dyn ConnectionProvider> {
        Arc::new(SshProvider::new(
            self.config.ssh.settings(self.key_path.clone()),
        ))
    }

    pub fn registry(&self) -> Registry {
        Registry::discover(self.config.plugin_dir().as_deref())
    }

    /// Reservation from `file`, else the config file, else stdin.
    pub fn reservation(&self, file: Option<&Path>) -> Result<Reservation> {
        if let Some(path) = file {
            let text = std::fs::read_to_string(path)?;
            return Ok(Reservation::from_text(&text)?);
        }
        if let Some(reservation) = self.config.reservation()? {
            return Ok(reservation);
        }

        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            eprintln!("Paste the reservation, then an empty line:");
        }
        read_reservation(stdin.lock()).ok_or(Error::NoReservation)
    }
}
