//! Plugin registry and the per-step plugin runner.

use crate::PluginConfig;
use crate::flow::PacketGroup;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::Packet;
use tessera_error::{PluginError, PluginErrorKind, TesseraResult};
use tessera_interface::{ContentProvider, ExecutionContext, OutputPaths, RuntimeServices};

/// Registry of content providers, keyed by name.
///
/// Built once at startup and injected into the pipeline; there is no global
/// registration.
///
/// # Example
///
/// ```rust,ignore
/// use tessera_pipeline::PluginRegistry;
///
/// let mut registry = PluginRegistry::with_builtins();
/// registry.register(Arc::new(SearchProvider::new(api_key)));
/// ```
#[derive(Clone, Default)]
pub struct PluginRegistry {
    providers: HashMap<String, Arc<dyn ContentProvider>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in providers (`static`, `split`, `text`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for provider in crate::plugins::builtin_providers() {
            registry.register(provider);
        }
        registry
    }

    /// Register a provider under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn ContentProvider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::warn!(plugin = %name, "Replacing registered plugin");
        }
    }

    /// Look up a provider.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no provider has that name.
    pub fn get(&self, name: &str) -> TesseraResult<&Arc<dyn ContentProvider>> {
        self.providers
            .get(name)
            .ok_or_else(|| PluginError::new(PluginErrorKind::NotRegistered(name.to_string())).into())
    }

    /// Whether a provider is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Outcome of running a step's plugins.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRun {
    /// Running context after every plugin's output was merged
    pub context: JsonValue,
    /// Packets of every plugin, grouped under the plugin's context key, in plugin order
    pub groups: Vec<PacketGroup>,
}

impl PluginRun {
    /// Packets of every plugin, in plugin order.
    pub fn packets(&self) -> Vec<&Packet> {
        self.groups
            .iter()
            .flat_map(|group| group.packets.iter())
            .collect()
    }
}

/// Runs the ordered plugins of one step.
#[derive(Debug, Clone)]
pub struct PluginRunner {
    registry: Arc<PluginRegistry>,
}

impl PluginRunner {
    /// Create a runner over a registry.
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Run `plugins` sequentially against `initial_context`.
    ///
    /// Each plugin's configuration is resolved against the context as it stands when
    /// the plugin starts. A plugin that returns exactly one packet has its data stored
    /// under its context key and, for objects, its fields spread into the top level
    /// of the context, so later plugins can reference it.
    ///
    /// # Errors
    ///
    /// Returns an error if a plugin is not registered, its configuration cannot be
    /// resolved or it fails to execute.
    #[tracing::instrument(skip_all, fields(step_index = step_index, plugins = plugins.len()))]
    pub async fn run(
        &self,
        plugins: &[PluginConfig],
        initial_context: JsonValue,
        step_index: usize,
        services: &RuntimeServices,
        paths: &OutputPaths,
    ) -> TesseraResult<PluginRun> {
        let mut context = match initial_context {
            JsonValue::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other);
                map
            }
        };
        let mut groups = Vec::with_capacity(plugins.len());

        for plugin in plugins {
            let provider = self.registry.get(plugin.name())?;
            let snapshot = JsonValue::Object(context.clone());

            let resolved = provider.prepare(plugin.config(), &snapshot).map_err(|e| {
                tracing::error!(plugin = %plugin.name(), error = %e, "Plugin configuration could not be resolved");
                e
            })?;

            let execution = ExecutionContext {
                context: &snapshot,
                step_index,
                services,
                paths,
            };
            let produced = provider.execute(&resolved, &execution).await.map_err(|e| {
                tracing::error!(plugin = %plugin.name(), error = %e, "Plugin failed");
                e
            })?;

            tracing::debug!(
                plugin = %plugin.name(),
                packets = produced.len(),
                "Plugin executed"
            );

            if let [single] = produced.as_slice() {
                context.insert(plugin.context_key().to_string(), single.data.clone());
                if let JsonValue::Object(fields) = &single.data {
                    for (key, value) in fields {
                        context.insert(key.clone(), value.clone());
                    }
                }
            }

            let mut group = PacketGroup::new(plugin.context_key(), produced);
            group.strategy = plugin.output().clone();
            groups.push(group);
        }

        Ok(PluginRun {
            context: JsonValue::Object(context),
            groups,
        })
    }
}
