//! Tool registry for name-based lookup and prompt catalogues.

use std::sync::Arc;

use otto_types::Tool;

/// Ordered collection of the tools available to a reasoning loop.
///
/// Order is preserved because the registry also renders the tool
/// catalogue embedded in prompts, and a stable ordering keeps prompts
/// reproducible. Lookup is by case-insensitive exact name since models
/// frequently change capitalization.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry with all built-in local tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::CalculatorTool));
        registry.register(Arc::new(super::DateTimeTool));
        registry
    }

    /// Append one tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Append a batch of tools, e.g. the MCP manager's aggregate.
    pub fn extend(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) {
        self.tools.extend(tools);
    }

    /// Every registered tool, in registration order.
    pub fn all(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by case-insensitive exact name.
    pub fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The `- name: description` block listing every tool, one per line.
    pub fn catalog(&self) -> String {
        self.tools
            .iter()
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
