//! MCP client: handshake and typed request wrappers for one provider.

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::resource::{McpResource, ResourceContent, ResourceTemplate, resolve_uri_template};
use crate::transport::StdioTransport;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// MCP protocol revision spoken by this client.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// A tool advertised by a provider via `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_schema", rename = "inputSchema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    json!({})
}

#[derive(Deserialize)]
struct ToolsListResult {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

#[derive(Deserialize)]
struct ResourcesListResult {
    #[serde(default)]
    resources: Vec<McpResource>,
}

#[derive(Deserialize)]
struct TemplatesListResult {
    #[serde(default, rename = "resourceTemplates")]
    resource_templates: Vec<ResourceTemplate>,
}

#[derive(Deserialize)]
struct CallToolResult {
    #[serde(default)]
    content: Vec<ContentChunk>,
}

#[derive(Deserialize)]
struct ContentChunk {
    #[serde(default)]
    text: Option<String>,
}

/// Join the text chunks of a `tools/call` result with newlines.
///
/// Non-text chunks are skipped; a result with no recognizable content
/// flattens to the empty string.
fn flatten_content(result: Value) -> String {
    match serde_json::from_value::<CallToolResult>(result) {
        Ok(parsed) => parsed
            .content
            .into_iter()
            .filter_map(|chunk| chunk.text)
            .collect::<Vec<_>>()
            .join("\n"),
        Err(_) => String::new(),
    }
}

/// A connected MCP provider.
///
/// Construction performs the full initialize handshake; a value of this
/// type always represents a provider that completed it.
pub struct McpClient {
    name: String,
    transport: StdioTransport,
}

impl McpClient {
    /// Spawn the provider process and run the initialize handshake.
    pub async fn connect(name: &str, config: &McpServerConfig) -> Result<Self, McpError> {
        let transport = StdioTransport::spawn(
            name,
            &config.command,
            &config.args,
            &config.env,
            config.timeout_ms,
        )?;

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "otto",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        let resp = transport.send_request("initialize", Some(params)).await?;
        if let Some(err) = resp.error {
            transport.close().await;
            return Err(McpError::Handshake {
                name: name.to_string(),
                message: err.message,
            });
        }
        tracing::debug!("provider '{name}' initialize result: {:?}", resp.result);

        transport
            .send_notification("notifications/initialized", Some(json!({})))
            .await?;
        tracing::info!("provider '{name}' initialized");

        Ok(Self {
            name: name.to_string(),
            transport,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the underlying transport still accepts requests.
    pub fn is_running(&self) -> bool {
        self.transport.is_running()
    }

    /// List the tools this provider offers.
    ///
    /// A malformed result shape or a JSON-RPC error response yields an
    /// empty list rather than an error; only transport faults are `Err`.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let resp = self.transport.send_request("tools/list", Some(json!({}))).await?;
        if let Some(err) = resp.error {
            tracing::warn!("provider '{}' rejected tools/list: {}", self.name, err.message);
            return Ok(Vec::new());
        }
        let Some(result) = resp.result else {
            return Ok(Vec::new());
        };
        match serde_json::from_value::<ToolsListResult>(result) {
            Ok(parsed) => Ok(parsed.tools),
            Err(e) => {
                tracing::warn!("provider '{}' sent malformed tools/list result: {e}", self.name);
                Ok(Vec::new())
            }
        }
    }

    /// Look up one tool's parameter schema from a fresh `tools/list`.
    ///
    /// Unknown tools get an empty schema. This always asks the provider;
    /// cached lookups go through the manager's tool cache instead.
    pub async fn tool_schema(&self, tool: &str) -> Result<Value, McpError> {
        let tools = self.list_tools().await?;
        Ok(tools
            .into_iter()
            .find(|t| t.name == tool)
            .map(|t| t.input_schema)
            .unwrap_or_else(empty_schema))
    }

    /// Invoke a tool and flatten its content to text.
    ///
    /// A JSON-RPC error response is not a transport fault; it comes back
    /// as `Error: <message>` text so callers can treat it as data.
    pub async fn call_tool(&self, tool: &str, arguments: Value) -> Result<String, McpError> {
        let params = json!({
            "name": tool,
            "arguments": arguments,
        });
        let resp = self.transport.send_request("tools/call", Some(params)).await?;
        if let Some(err) = resp.error {
            return Ok(format!("Error: {}", err.message));
        }
        match resp.result {
            Some(result) => Ok(flatten_content(result)),
            None => Ok(String::new()),
        }
    }

    /// List the concrete resources this provider exposes.
    pub async fn list_resources(&self) -> Result<Vec<McpResource>, McpError> {
        let resp = self
            .transport
            .send_request("resources/list", Some(json!({})))
            .await?;
        if let Some(err) = resp.error {
            tracing::warn!(
                "provider '{}' rejected resources/list: {}",
                self.name,
                err.message
            );
            return Ok(Vec::new());
        }
        let Some(result) = resp.result else {
            return Ok(Vec::new());
        };
        match serde_json::from_value::<ResourcesListResult>(result) {
            Ok(parsed) => Ok(parsed.resources),
            Err(e) => {
                tracing::warn!(
                    "provider '{}' sent malformed resources/list result: {e}",
                    self.name
                );
                Ok(Vec::new())
            }
        }
    }

    /// Read one resource by URI.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContent, McpError> {
        let resp = self
            .transport
            .send_request("resources/read", Some(json!({ "uri": uri })))
            .await?;
        if let Some(err) = resp.error {
            return Err(McpError::Protocol {
                name: self.name.clone(),
                message: format!("failed to read resource '{uri}': {}", err.message),
            });
        }
        let content = resp
            .result
            .and_then(|result| serde_json::from_value::<ResourceContent>(result).ok())
            .unwrap_or_else(|| ResourceContent {
                uri: uri.to_string(),
                ..Default::default()
            });
        Ok(content)
    }

    /// List the parameterized resource templates this provider exposes.
    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
        let resp = self
            .transport
            .send_request("resources/templates/list", Some(json!({})))
            .await?;
        if let Some(err) = resp.error {
            tracing::warn!(
                "provider '{}' rejected resources/templates/list: {}",
                self.name,
                err.message
            );
            return Ok(Vec::new());
        }
        let Some(result) = resp.result else {
            return Ok(Vec::new());
        };
        match serde_json::from_value::<TemplatesListResult>(result) {
            Ok(parsed) => Ok(parsed.resource_templates),
            Err(e) => {
                tracing::warn!(
                    "provider '{}' sent malformed template list: {e}",
                    self.name
                );
                Ok(Vec::new())
            }
        }
    }

    /// Expand a URI template with the given arguments and read the result.
    pub async fn read_resource_template(
        &self,
        template: &str,
        args: &serde_json::Map<String, Value>,
    ) -> Result<ResourceContent, McpError> {
        let uri = resolve_uri_template(template, args);
        self.read_resource(&uri).await
    }

    /// Ask the provider for change notifications on a resource.
    ///
    /// Providers without subscription support answer with an error; that
    /// is logged and swallowed since nothing downstream depends on it.
    pub async fn subscribe_resource(&self, uri: &str) -> Result<(), McpError> {
        let resp = self
            .transport
            .send_request("resources/subscribe", Some(json!({ "uri": uri })))
            .await?;
        if let Some(err) = resp.error {
            tracing::warn!(
                "provider '{}' rejected subscribe for '{uri}': {}",
                self.name,
                err.message
            );
        }
        Ok(())
    }

    /// Cancel a resource subscription.
    pub async fn unsubscribe_resource(&self, uri: &str) -> Result<(), McpError> {
        let resp = self
            .transport
            .send_request("resources/unsubscribe", Some(json!({ "uri": uri })))
            .await?;
        if let Some(err) = resp.error {
            tracing::warn!(
                "provider '{}' rejected unsubscribe for '{uri}': {}",
                self.name,
                err.message
            );
        }
        Ok(())
    }

    /// Close the connection and terminate the provider process.
    pub async fn close(&self) {
        self.transport.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_descriptor_defaults_missing_fields() {
        let descriptor: ToolDescriptor =
            serde_json::from_value(json!({ "name": "calc" })).unwrap();
        assert_eq!(descriptor.name, "calc");
        assert!(descriptor.description.is_empty());
        assert_eq!(descriptor.input_schema, json!({}));
    }

    #[test]
    fn tool_descriptor_reads_camel_case_schema() {
        let descriptor: ToolDescriptor = serde_json::from_value(json!({
            "name": "calc",
            "description": "does math",
            "inputSchema": {"type": "object"},
        }))
        .unwrap();
        assert_eq!(descriptor.input_schema["type"], "object");
    }

    #[test]
    fn flatten_joins_text_chunks_with_newlines() {
        let result = json!({
            "content": [
                {"type": "text", "text": "line one"},
                {"type": "text", "text": "line two"},
            ]
        });
        assert_eq!(flatten_content(result), "line one\nline two");
    }

    #[test]
    fn flatten_skips_non_text_chunks() {
        let result = json!({
            "content": [
                {"type": "image", "data": "aGVsbG8="},
                {"type": "text", "text": "caption"},
            ]
        });
        assert_eq!(flatten_content(result), "caption");
    }

    #[test]
    fn flatten_defaults_to_empty_on_malformed_shapes() {
        assert_eq!(flatten_content(json!({})), "");
        assert_eq!(flatten_content(json!({"content": "oops"})), "");
        assert_eq!(flatten_content(json!(42)), "");
    }
}
