//! Adapter exposing one provider tool through the common [`Tool`] trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use otto_types::{Tool, ToolError};
use serde_json::{Value, json};

use crate::cache::TimedCache;
use crate::client::{McpClient, ToolDescriptor};

/// One remote tool bound to its provider connection.
///
/// The advertised name is qualified as `provider:tool` so tools from
/// different providers can never collide in a registry. Schema lookups
/// go through the shared discovery cache instead of hitting the
/// provider each time.
pub struct McpTool {
    qualified_name: String,
    provider: String,
    remote_name: String,
    description: String,
    client: Arc<McpClient>,
    tool_cache: Arc<TimedCache<Vec<ToolDescriptor>>>,
}

impl McpTool {
    pub fn new(
        provider: &str,
        descriptor: &ToolDescriptor,
        client: Arc<McpClient>,
        tool_cache: Arc<TimedCache<Vec<ToolDescriptor>>>,
    ) -> Self {
        Self {
            qualified_name: format!("{provider}:{}", descriptor.name),
            provider: provider.to_string(),
            remote_name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            client,
            tool_cache,
        }
    }

    /// The provider this tool belongs to.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The tool's name on the provider side, without the prefix.
    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }
}

impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.qualified_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move {
            let client = Arc::clone(&self.client);
            let descriptors = self
                .tool_cache
                .get(&self.provider, move || async move {
                    client.list_tools().await.ok()
                })
                .await;
            descriptors
                .iter()
                .find(|d| d.name == self.remote_name)
                .map(|d| d.input_schema.clone())
                .unwrap_or_else(|| json!({}))
        })
    }

    fn execute(
        &self,
        params: Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>> {
        Box::pin(async move {
            tracing::info!("executing {} with params {params}", self.qualified_name);
            match self.client.call_tool(&self.remote_name, params).await {
                Ok(text) => Ok(text),
                // A broken connection is still an observation for the
                // model, not a crash of the reasoning loop.
                Err(e) => Ok(format!("Error: tool execution failed - {e}")),
            }
        })
    }
}
