//! Error hierarchy for Otto.
//!
//! Only transport-level faults are surfaced as errors; protocol-level
//! failures, tool failures inside a run, and cache-load failures are all
//! modeled as data so callers always receive a structured result.

use thiserror::Error;

/// Errors from tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("invalid input for tool '{tool}': {message}")]
    InvalidInput { tool: String, message: String },

    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("tool timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Errors from the completion endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("authentication failed: {message}")]
    Auth { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::Server { .. }
                | LlmError::Network(_)
                | LlmError::Timeout
        )
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
