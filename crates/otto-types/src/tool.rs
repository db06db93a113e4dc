//! Tool trait shared by local tools and provider-backed adapters.

use crate::error::ToolError;
use std::future::Future;
use std::pin::Pin;

/// A named capability the agent can invoke with structured input.
///
/// Tools take a JSON object of parameters and return text. Implementations
/// backed by a remote provider must convert their own failures into textual
/// results rather than `Err` — a tool failure feeds the reasoning loop as an
/// observation, it must never abort the run.
pub trait Tool: Send + Sync {
    /// Unique tool name as it appears in the catalogue and in model output.
    fn name(&self) -> &str;

    /// Human-readable description embedded in the agent prompt.
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    ///
    /// Async because provider-backed tools look the schema up through the
    /// discovery cache. Defaults to an empty object.
    fn parameter_schema(&self) -> Pin<Box<dyn Future<Output = serde_json::Value> + Send + '_>> {
        Box::pin(std::future::ready(serde_json::json!({})))
    }

    /// Execute the tool with the given JSON parameters.
    fn execute(
        &self,
        params: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + '_>>;
}
