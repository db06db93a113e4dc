//! MCP (Model Context Protocol) integration for Otto.
//!
//! Providers are external processes spoken to over newline-delimited
//! JSON-RPC on stdio. This crate spawns them, runs the initialize
//! handshake, adapts their tools to the common [`Tool`] trait, and keeps
//! discovery results in refresh-ahead caches so reasoning loops never
//! wait on a provider round trip for a tool list.
//!
//! [`Tool`]: otto_types::Tool

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod manager;
pub mod resource;
pub mod tool;
mod transport;

pub use cache::{CacheStats, TimedCache};
pub use client::{McpClient, PROTOCOL_VERSION, ToolDescriptor};
pub use config::{McpConfig, McpServerConfig};
pub use error::McpError;
pub use manager::{ManagerCacheStats, McpManager};
pub use resource::{
    McpResource, ResourceContent, ResourceContentItem, ResourceTemplate, resolve_uri_template,
};
pub use tool::McpTool;
