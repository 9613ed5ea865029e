// ABOUTME: Caller-supplied parameters of a deployment.
// ABOUTME: Destination, inflation multipliers, privilege and worker-pool settings.

use crate::reservation::Reservation;
use crate::types::{Multiplier, NodeId, RemotePath};
use std::path::PathBuf;

/// How a dataset is placed and inflated on the nodes.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub dest: RemotePath,
    pub copy_multiplier: Multiplier,
    pub link_multiplier: Multiplier,
    /// Run remote file operations with sudo.
    pub sudo: bool,
    /// Suppress progress output.
    pub silent: bool,
    /// Node that receives the data first for relay and gateway strategies.
    pub admin: Option<NodeId>,
    /// Extra whole-strategy attempts after a failed one.
    pub retries: u32,
    /// Upper bound for any fan-out pool.
    pub max_workers: Option<usize>,
}

impl DeployOptions {
    pub fn new(dest: RemotePath) -> Self {
        Self {
            dest,
            copy_multiplier: Multiplier::ONE,
            link_multiplier: Multiplier::ONE,
            sudo: false,
            silent: false,
            admin: None,
            retries: 0,
            max_workers: None,
        }
    }

    pub fn copies(mut self, multiplier: Multiplier) -> Self {
        self.copy_multiplier = multiplier;
        self
    }

    pub fn links(mut self, multiplier: Multiplier) -> Self {
        self.link_multiplier = multiplier;
        self
    }

    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn admin(mut self, admin: Option<NodeId>) -> Self {
        self.admin = admin;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// True when either multiplier asks for extra entries.
    pub fn inflates(&self) -> bool {
        self.copy_multiplier.extra() > 0 || self.link_multiplier.extra() > 0
    }
}

/// Everything a strategy needs to run one deployment.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub reservation: Reservation,
    pub sources: Vec<PathBuf>,
    pub options: DeployOptions,
    /// SSH key handed to external strategies.
    pub key_path: Option<PathBuf>,
}

impl DeployRequest {
    pub fn new(reservation: Reservation, sources: Vec<PathBuf>, options: DeployOptions) -> Self {
        Self {
            reservation,
            sources,
            options,
            key_path: None,
        }
    }

    pub fn key_path(mut self, key_path: Option<PathBuf>) -> Self {
        self.key_path = key_path;
        self
    }
}
