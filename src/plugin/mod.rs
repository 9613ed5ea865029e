// ABOUTME: Transfer strategies as plugins: the capability trait, parsed arguments and registry.
// ABOUTME: Built-in strategies come from a static table; user strategies are external executables.

mod builtin;
mod external;
mod registry;

pub use builtin::{BUILTINS, Direct, Gateway, Relay};
pub use external::{ExternalStrategy, PLUGIN_EXTENSION, find_plugins};
pub use registry::{COLLISION_MARKER, PluginDescriptor, PluginSource, Registry, RegistryError};

use crate::deploy::{DeployError, DeployRequest};
use crate::diagnostics::StrategyReport;
use crate::remote::ConnectionProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

/// Origin tag of strategies compiled into this binary.
pub const BUILTIN_ORIGIN: &str = "builtin";
/// Origin tag of plugins found in the plugin directory, until they describe themselves.
pub const EXTERNAL_ORIGIN: &str = "external";

/// Strategy arguments after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginArgs {
    #[serde(default)]
    pub positional: Vec<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl PluginArgs {
    pub fn option(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.insert(key.into(), value.to_string());
        self
    }

    /// Typed lookup of an option.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, DeployError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.options
            .get(key)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|e| DeployError::InvalidArgs(format!("--{}: {}", key, e)))
            })
            .transpose()
    }
}

/// A way of moving a dataset onto the reserved nodes.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name the strategy reports under.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn origin(&self) -> &str;

    /// Parse strategy-specific arguments. Runs before any remote work.
    async fn parse(&self, argv: &[String]) -> Result<PluginArgs, DeployError>;

    /// Run one deployment attempt.
    async fn execute(
        &self,
        provider: Arc<dyn ConnectionProvider>,
        request: &DeployRequest,
        args: &PluginArgs,
    ) -> StrategyReport;
}
