//! Provider lifecycle and the aggregate tool registry.
//!
//! `McpManager` owns every provider connection, the discovery caches,
//! and the combined tool list handed to reasoning loops. Nothing here is
//! a singleton; the manager is constructed from config and passed where
//! it is needed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use otto_types::Tool;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheStats, TimedCache};
use crate::client::{McpClient, ToolDescriptor};
use crate::config::{McpConfig, McpServerConfig};
use crate::error::McpError;
use crate::resource::{McpResource, ResourceContent, ResourceTemplate};
use crate::tool::McpTool;

const TOOL_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
const TOOL_CACHE_REFRESH: Duration = Duration::from_secs(5 * 60);
const RESOURCE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
const RESOURCE_CACHE_REFRESH: Duration = Duration::from_secs(3 * 60);

/// Counters of both discovery caches.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ManagerCacheStats {
    pub tools: CacheStats,
    pub resources: CacheStats,
}

/// Registry of connected providers and their adapted tools.
pub struct McpManager {
    config: McpConfig,
    clients: RwLock<HashMap<String, Arc<McpClient>>>,
    tools: RwLock<Vec<Arc<dyn Tool>>>,
    tool_cache: Arc<TimedCache<Vec<ToolDescriptor>>>,
    resource_cache: Arc<TimedCache<Vec<McpResource>>>,
}

impl McpManager {
    /// Connect every enabled provider from the config.
    ///
    /// A provider that fails to come up is logged and skipped so one bad
    /// entry cannot take down the rest. Never fails itself.
    pub async fn start(config: McpConfig) -> Self {
        let manager = Self {
            config,
            clients: RwLock::new(HashMap::new()),
            tools: RwLock::new(Vec::new()),
            tool_cache: Arc::new(TimedCache::new(TOOL_CACHE_TTL, TOOL_CACHE_REFRESH)),
            resource_cache: Arc::new(TimedCache::new(
                RESOURCE_CACHE_TTL,
                RESOURCE_CACHE_REFRESH,
            )),
        };

        if !manager.config.enabled {
            tracing::info!("MCP integration disabled, no providers started");
            return manager;
        }

        let servers: Vec<(String, McpServerConfig)> = manager
            .config
            .servers
            .iter()
            .map(|(name, server)| (name.clone(), server.clone()))
            .collect();
        for (name, server) in servers {
            if !server.enabled {
                tracing::info!("provider '{name}' disabled, skipping");
                continue;
            }
            if let Err(e) = manager.init_provider(&name, &server).await {
                tracing::warn!("failed to start provider '{name}': {e}");
            }
        }
        manager
    }

    /// Connect one provider, prime its tool cache, and register adapters
    /// for everything it advertises.
    async fn init_provider(&self, name: &str, server: &McpServerConfig) -> Result<(), McpError> {
        let client = Arc::new(McpClient::connect(name, server).await?);

        let loader_client = Arc::clone(&client);
        let descriptors = self
            .tool_cache
            .get(name, move || async move {
                loader_client.list_tools().await.ok()
            })
            .await;

        let mut adapters: Vec<Arc<dyn Tool>> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors.iter() {
            adapters.push(Arc::new(McpTool::new(
                name,
                descriptor,
                Arc::clone(&client),
                Arc::clone(&self.tool_cache),
            )));
        }
        tracing::info!("provider '{name}' registered {} tools", adapters.len());

        self.clients.write().await.insert(name.to_string(), client);
        self.tools.write().await.extend(adapters);
        Ok(())
    }

    /// Tear down one provider and bring it back up from its config.
    ///
    /// Restart errors are logged rather than returned; a reload that
    /// fails leaves the provider absent, same as a failed start.
    pub async fn reload_provider(&self, name: &str) {
        tracing::info!("reloading provider '{name}'");
        let prefix = format!("{name}:");
        self.tools
            .write()
            .await
            .retain(|tool| !tool.name().starts_with(&prefix));
        self.tool_cache.invalidate(name).await;
        self.resource_cache.invalidate(name).await;
        if let Some(old) = self.clients.write().await.remove(name) {
            old.close().await;
        }

        match self.config.servers.get(name) {
            Some(server) if server.enabled => {
                if let Err(e) = self.init_provider(name, server).await {
                    tracing::warn!("failed to restart provider '{name}': {e}");
                }
            }
            Some(_) => tracing::info!("provider '{name}' disabled, not restarted"),
            None => tracing::warn!("no configuration for provider '{name}'"),
        }
    }

    /// Snapshot of every registered tool, safe to hold across awaits.
    pub async fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.read().await.clone()
    }

    /// The registered tools belonging to one provider.
    pub async fn tools_by_provider(&self, name: &str) -> Vec<Arc<dyn Tool>> {
        let prefix = format!("{name}:");
        self.tools
            .read()
            .await
            .iter()
            .filter(|tool| tool.name().starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Names of the currently connected providers, sorted.
    pub async fn connected_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Connected providers with their registered tool counts.
    pub async fn provider_summary(&self) -> Vec<(String, usize)> {
        let names = self.connected_providers().await;
        let tools = self.tools.read().await;
        names
            .into_iter()
            .map(|name| {
                let prefix = format!("{name}:");
                let count = tools
                    .iter()
                    .filter(|tool| tool.name().starts_with(&prefix))
                    .count();
                (name, count)
            })
            .collect()
    }

    async fn client(&self, name: &str) -> Option<Arc<McpClient>> {
        self.clients.read().await.get(name).cloned()
    }

    /// Cached resource list of one provider. Unknown providers yield an
    /// empty list.
    pub async fn resources(&self, provider: &str) -> Vec<McpResource> {
        let Some(client) = self.client(provider).await else {
            tracing::warn!("resources requested for unknown provider '{provider}'");
            return Vec::new();
        };
        let loaded = self
            .resource_cache
            .get(provider, move || async move {
                client.list_resources().await.ok()
            })
            .await;
        loaded.as_ref().clone()
    }

    /// Resource lists of every connected provider, keyed by name.
    pub async fn all_resources(&self) -> HashMap<String, Vec<McpResource>> {
        let mut all = HashMap::new();
        for name in self.connected_providers().await {
            let resources = self.resources(&name).await;
            all.insert(name, resources);
        }
        all
    }

    pub async fn read_resource(
        &self,
        provider: &str,
        uri: &str,
    ) -> Result<ResourceContent, McpError> {
        let Some(client) = self.client(provider).await else {
            return Err(McpError::NotRunning {
                name: provider.to_string(),
            });
        };
        client.read_resource(uri).await
    }

    /// Resource templates of one provider; failures degrade to empty.
    pub async fn resource_templates(&self, provider: &str) -> Vec<ResourceTemplate> {
        let Some(client) = self.client(provider).await else {
            return Vec::new();
        };
        client.list_resource_templates().await.unwrap_or_default()
    }

    pub async fn read_resource_template(
        &self,
        provider: &str,
        template: &str,
        args: &serde_json::Map<String, Value>,
    ) -> Result<ResourceContent, McpError> {
        let Some(client) = self.client(provider).await else {
            return Err(McpError::NotRunning {
                name: provider.to_string(),
            });
        };
        client.read_resource_template(template, args).await
    }

    pub async fn subscribe_resource(&self, provider: &str, uri: &str) -> Result<(), McpError> {
        let Some(client) = self.client(provider).await else {
            return Err(McpError::NotRunning {
                name: provider.to_string(),
            });
        };
        client.subscribe_resource(uri).await
    }

    pub async fn unsubscribe_resource(&self, provider: &str, uri: &str) -> Result<(), McpError> {
        let Some(client) = self.client(provider).await else {
            return Err(McpError::NotRunning {
                name: provider.to_string(),
            });
        };
        client.unsubscribe_resource(uri).await
    }

    /// Reload one provider's tool list in the background.
    pub async fn refresh_tool_cache(&self, provider: &str) {
        let Some(client) = self.client(provider).await else {
            return;
        };
        self.tool_cache.refresh(provider, move || async move {
            client.list_tools().await.ok()
        });
    }

    /// Reload one provider's resource list in the background.
    pub async fn refresh_resource_cache(&self, provider: &str) {
        let Some(client) = self.client(provider).await else {
            return;
        };
        self.resource_cache.refresh(provider, move || async move {
            client.list_resources().await.ok()
        });
    }

    pub async fn clear_tool_cache(&self) {
        self.tool_cache.invalidate_all().await;
    }

    pub async fn clear_resource_cache(&self) {
        self.resource_cache.invalidate_all().await;
    }

    pub async fn cache_stats(&self) -> ManagerCacheStats {
        ManagerCacheStats {
            tools: self.tool_cache.stats().await,
            resources: self.resource_cache.stats().await,
        }
    }

    /// Close every provider and drop all cached state. Safe to call twice.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down MCP manager");
        self.tools.write().await.clear();
        self.tool_cache.invalidate_all().await;
        self.resource_cache.invalidate_all().await;
        let clients: Vec<Arc<McpClient>> = {
            let mut map = self.clients.write().await;
            map.drain().map(|(_, client)| client).collect()
        };
        for client in clients {
            client.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_config_starts_no_providers() {
        let config = McpConfig {
            enabled: false,
            servers: HashMap::from([(
                "ignored".to_string(),
                McpServerConfig {
                    command: "this_command_does_not_exist_xyz123".to_string(),
                    args: vec![],
                    env: HashMap::new(),
                    timeout_ms: 1000,
                    enabled: true,
                },
            )]),
        };

        let manager = McpManager::start(config).await;
        assert!(manager.tools().await.is_empty());
        assert!(manager.connected_providers().await.is_empty());
    }

    #[tokio::test]
    async fn failed_provider_is_skipped_not_fatal() {
        let mut config = McpConfig::default();
        config.servers.insert(
            "ghost".to_string(),
            McpServerConfig {
                command: "this_command_does_not_exist_xyz123".to_string(),
                args: vec![],
                env: HashMap::new(),
                timeout_ms: 1000,
                enabled: true,
            },
        );

        let manager = McpManager::start(config).await;
        assert!(manager.connected_providers().await.is_empty());
        assert!(manager.tools().await.is_empty());

        // Operations against the missing provider degrade gracefully.
        assert!(manager.resources("ghost").await.is_empty());
        assert!(manager.resource_templates("ghost").await.is_empty());
        assert!(matches!(
            manager.read_resource("ghost", "file:///x").await,
            Err(McpError::NotRunning { .. })
        ));
    }

    #[tokio::test]
    async fn disabled_server_is_skipped() {
        let mut config = McpConfig::default();
        config.servers.insert(
            "sleeper".to_string(),
            McpServerConfig {
                command: "cat".to_string(),
                args: vec![],
                env: HashMap::new(),
                timeout_ms: 1000,
                enabled: false,
            },
        );

        let manager = McpManager::start(config).await;
        assert!(manager.connected_providers().await.is_empty());
        manager.shutdown().await;
        // Shutting down twice must be harmless.
        manager.shutdown().await;
    }
}
