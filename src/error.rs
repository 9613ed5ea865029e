// ABOUTME: Application-wide error types for data-deploy.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::deploy::DeployError;
use crate::diagnostics::Failure;
use crate::plugin::RegistryError;
use crate::reservation::{ParseReservationError, ReservationError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no reservation given (use --reservation, the config file or stdin)")]
    NoReservation,

    #[error("invalid reservation: {0}")]
    Reservation(#[from] ReservationError),

    #[error("invalid reservation file: {0}")]
    ReservationFile(#[from] ParseReservationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("{strategy} failed with {} error(s): {}", failures.len(), first_failure(failures))]
    Failed {
        strategy: String,
        failures: Vec<Failure>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn first_failure(failures: &[Failure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
