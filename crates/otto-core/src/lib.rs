//! Core reasoning loop for Otto.
//!
//! [`ReactAgent`] drives a completion model against a tool registry:
//! each iteration sends the task plus the transcript so far, parses the
//! model's reply with [`parser::parse`], and either executes the
//! requested tool or finishes the run.

pub mod agent;
pub mod parser;

pub use agent::{DEFAULT_MAX_STEPS, ReactAgent};
pub use parser::{ParseError, ReactOutput};
