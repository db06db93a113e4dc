//! Provider configuration.
//!
//! Providers are declared in the `[mcp.servers.<name>]` tables of the
//! Otto config file. Each entry names a command to spawn plus optional
//! arguments, environment, and a per-request timeout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Top-level MCP section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Master switch. When false no providers are spawned at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Providers keyed by name. The key becomes the tool name prefix.
    #[serde(default)]
    pub servers: HashMap<String, McpServerConfig>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            servers: HashMap::new(),
        }
    }
}

/// One provider process definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Executable to spawn.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child process.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// How long a single request may wait for its response.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Disabled providers stay in the config but are never spawned.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_server_entry() {
        let toml = r#"
            [servers.files]
            command = "mcp-files"
        "#;
        let config: McpConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        let server = &config.servers["files"];
        assert_eq!(server.command, "mcp-files");
        assert!(server.args.is_empty());
        assert!(server.env.is_empty());
        assert_eq!(server.timeout_ms, 30_000);
        assert!(server.enabled);
    }

    #[test]
    fn parses_full_server_entry() {
        let toml = r#"
            enabled = true

            [servers.search]
            command = "npx"
            args = ["-y", "@example/mcp-search"]
            timeout_ms = 10000
            enabled = false

            [servers.search.env]
            SEARCH_API_KEY = "secret"
        "#;
        let config: McpConfig = toml::from_str(toml).unwrap();
        let server = &config.servers["search"];
        assert_eq!(server.args, vec!["-y", "@example/mcp-search"]);
        assert_eq!(server.timeout_ms, 10_000);
        assert_eq!(server.env["SEARCH_API_KEY"], "secret");
        assert!(!server.enabled);
    }

    #[test]
    fn default_config_is_enabled_and_empty() {
        let config = McpConfig::default();
        assert!(config.enabled);
        assert!(config.servers.is_empty());
    }
}
