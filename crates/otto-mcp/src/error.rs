//! Errors raised by MCP provider communication.

use thiserror::Error;

/// A transport or protocol fault talking to an MCP provider.
///
/// Only faults of the connection itself surface here. A provider that
/// answers a `tools/call` with a JSON-RPC error object is still a working
/// provider, and that error is returned to the caller as result text
/// rather than through this type.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("failed to spawn provider '{name}': {source}")]
    SpawnFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("provider '{name}' is not running")]
    NotRunning { name: String },

    #[error("initialize handshake with provider '{name}' failed: {message}")]
    Handshake { name: String, message: String },

    #[error("request '{method}' to provider '{name}' timed out after {timeout_ms}ms")]
    Timeout {
        name: String,
        method: String,
        timeout_ms: u64,
    },

    #[error("protocol error from provider '{name}': {message}")]
    Protocol { name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
