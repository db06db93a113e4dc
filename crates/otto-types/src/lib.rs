//! Shared types and error hierarchy for Otto.

pub mod error;
pub mod run;
pub mod tool;

pub use error::{ConfigError, LlmError, ToolError};
pub use run::{AgentRun, ReasoningStep, RunOutcome, StepKind};
pub use tool::Tool;
