// ABOUTME: Name-addressed collection of strategy plugins with lazy, single-shot loading.
// ABOUTME: Colliding names are disambiguated instead of rejected.

use super::external::{ExternalStrategy, find_plugins};
use super::{BUILTIN_ORIGIN, EXTERNAL_ORIGIN, Strategy, builtin::BUILTINS};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Appended to a plugin name that is already taken.
pub const COLLISION_MARKER: &str = "0";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no plugin named '{0}'")]
    NotFound(String),

    #[error("cannot load plugin '{0}': already loaded")]
    AlreadyLoaded(String),

    #[error("failed to load plugin '{name}': {reason}")]
    Load { name: String, reason: String },
}

/// Where a plugin's implementation comes from.
#[derive(Clone)]
pub enum PluginSource {
    Builtin(fn() -> Arc<dyn Strategy>),
    External(PathBuf),
}

impl fmt::Debug for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSource::Builtin(_) => f.write_str("Builtin"),
            PluginSource::External(path) => f.debug_tuple("External").field(path).finish(),
        }
    }
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSource::Builtin(_) => f.write_str("<builtin>"),
            PluginSource::External(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Registry metadata of one plugin.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub origin: String,
    pub source: PluginSource,
}

impl PluginDescriptor {
    pub fn builtin(name: impl Into<String>, constructor: fn() -> Arc<dyn Strategy>) -> Self {
        Self {
            name: name.into(),
            origin: BUILTIN_ORIGIN.to_string(),
            source: PluginSource::Builtin(constructor),
        }
    }

    pub fn external(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            origin: EXTERNAL_ORIGIN.to_string(),
            source: PluginSource::External(path.into()),
        }
    }
}

struct Entry {
    descriptor: PluginDescriptor,
    loaded: OnceCell<Arc<dyn Strategy>>,
}

/// All strategies known to this process, in registration order.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.descriptor.name))
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, constructor) in BUILTINS {
            registry.register(PluginDescriptor::builtin(*name, *constructor));
        }
        registry
    }

    /// Built-ins first, then every external plugin found in `plugin_dir`.
    pub fn discover(plugin_dir: Option<&Path>) -> Self {
        let mut registry = Self::with_builtins();
        if let Some(dir) = plugin_dir {
            for (name, path) in find_plugins(dir) {
                registry.register(PluginDescriptor::external(name, path));
            }
        }
        registry
    }

    /// Add a plugin and return the name it was registered under.
    ///
    /// A taken name gets [`COLLISION_MARKER`] appended until it is unique.
    pub fn register(&mut self, mut descriptor: PluginDescriptor) -> String {
        if self.contains(&descriptor.name) {
            let original = descriptor.name.clone();
            while self.contains(&descriptor.name) {
                descriptor.name.push_str(COLLISION_MARKER);
            }
            tracing::warn!(
                "plugin name collision: '{}' from {} registered as '{}'",
                original,
                descriptor.source,
                descriptor.name
            );
        }

        let name = descriptor.name.clone();
        self.entries.push(Entry {
            descriptor,
            loaded: OnceCell::new(),
        });
        name
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_ok()
    }

    fn entry(&self, name: &str) -> Result<&Entry, RegistryError> {
        self.entries
            .iter()
            .find(|e| e.descriptor.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&PluginDescriptor, RegistryError> {
        self.entry(name).map(|e| &e.descriptor)
    }

    pub fn list(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Description of a plugin, loading it if needed.
    pub async fn describe(&self, name: &str) -> Result<String, RegistryError> {
        self.strategy(name)
            .await
            .map(|strategy| strategy.description().to_string())
    }

    pub fn is_loaded(&self, name: &str) -> Result<bool, RegistryError> {
        self.entry(name).map(|e| e.loaded.initialized())
    }

    /// Load a plugin explicitly. Loading the same plugin twice is an error.
    pub async fn load(&self, name: &str) -> Result<Arc<dyn Strategy>, RegistryError> {
        let entry = self.entry(name)?;
        if entry.loaded.initialized() {
            return Err(RegistryError::AlreadyLoaded(name.to_string()));
        }

        let strategy = instantiate(&entry.descriptor).await?;
        entry
            .loaded
            .set(Arc::clone(&strategy))
            .map_err(|_| RegistryError::AlreadyLoaded(name.to_string()))?;
        Ok(strategy)
    }

    /// The loaded strategy, loading it on first use.
    pub async fn strategy(&self, name: &str) -> Result<Arc<dyn Strategy>, RegistryError> {
        let entry = self.entry(name)?;
        entry
            .loaded
            .get_or_try_init(|| instantiate(&entry.descriptor))
            .await
            .map(Arc::clone)
    }
}

async fn instantiate(descriptor: &PluginDescriptor) -> Result<Arc<dyn Strategy>, RegistryError> {
    tracing::debug!("loading plugin '{}'", descriptor.name);
    match &descriptor.source {
        PluginSource::Builtin(constructor) => Ok(constructor()),
        PluginSource::External(path) => {
            let strategy = ExternalStrategy::load(&descriptor.name, path)
                .await
                .map_err(|reason| RegistryError::Load {
                    name: descriptor.name.clone(),
                    reason,
                })?;
            Ok(Arc::new(strategy))
        }
    }
}
