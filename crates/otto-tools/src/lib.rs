//! Built-in local tools and the tool registry.

mod calculator;
mod datetime;
mod registry;

pub use calculator::CalculatorTool;
pub use datetime::DateTimeTool;
pub use registry::ToolRegistry;
