//! TOML configuration for Otto.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use otto_mcp::McpConfig;
use otto_types::ConfigError;

/// The default completion endpoint (a local Ollama instance).
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";

/// The default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The default max tokens for a completion.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// The default reasoning step budget per run.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Resolved configuration for an Otto run.
#[derive(Debug, Clone)]
pub struct OttoConfig {
    pub base_url: String,
    /// Optional: local endpoints such as Ollama accept requests without one.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_steps: usize,
    pub mcp: McpConfig,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub mcp: McpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    pub max_steps: Option<usize>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_steps: Option<usize>,
    pub config_dir: Option<PathBuf>,
}

impl OttoConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables (`OTTO_BASE_URL`, `OTTO_API_KEY`, `OTTO_MODEL`)
    /// 3. Config file (~/.otto/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = overrides.config_dir.unwrap_or_else(config_dir);
        let settings = load_settings_file(&config_dir.join("config.toml"));

        let base_url = overrides
            .base_url
            .or_else(|| std::env::var("OTTO_BASE_URL").ok())
            .or(settings.llm.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = overrides
            .api_key
            .or_else(|| std::env::var("OTTO_API_KEY").ok())
            .or(settings.llm.api_key);

        let model = overrides
            .model
            .or_else(|| std::env::var("OTTO_MODEL").ok())
            .or(settings.llm.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = settings.llm.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let max_tokens = settings.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);

        let max_steps = overrides
            .max_steps
            .or(settings.agent.max_steps)
            .unwrap_or(DEFAULT_MAX_STEPS);
        if max_steps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "agent.max_steps".into(),
                message: "must be at least 1".into(),
            });
        }

        Ok(OttoConfig {
            base_url,
            api_key,
            model,
            temperature,
            max_tokens,
            max_steps,
            mcp: settings.mcp,
            config_dir,
        })
    }
}

/// Get the Otto config directory path (~/.otto/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OTTO_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".otto")
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &std::path::Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
