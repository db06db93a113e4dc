//! The bounded reason-act loop that drives a model against a tool registry.

use std::sync::Arc;

use otto_llm::CompletionModel;
use otto_tools::ToolRegistry;
use otto_types::{AgentRun, ReasoningStep};

use crate::parser::{self, ReactOutput};

/// Maximum number of reasoning iterations before a run is abandoned.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Runs tasks by alternating model completions with tool executions
/// until the model produces a final answer or the step budget runs out.
pub struct ReactAgent {
    model: Arc<dyn CompletionModel>,
    registry: ToolRegistry,
    max_steps: usize,
}

impl ReactAgent {
    pub fn new(model: Arc<dyn CompletionModel>, registry: ToolRegistry) -> Self {
        Self {
            model,
            registry,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Instruction preamble sent on every completion: the format the
    /// model must reply in, plus the tool catalog for this registry.
    fn build_prompt(&self, task: &str) -> String {
        let catalog = if self.registry.is_empty() {
            "No tools available.".to_string()
        } else {
            self.registry.catalog()
        };
        format!(
            "You are a helpful assistant that solves tasks step by step, \
             using tools when they help.\n\
             \n\
             Available tools:\n\
             {catalog}\n\
             \n\
             Reply in exactly this format:\n\
             \n\
             Thought: reason about what to do next\n\
             Action: the tool to use, one of the names above\n\
             Action Input: the tool parameters as a JSON object\n\
             Observation: the tool result (this is filled in for you)\n\
             ... (Thought/Action/Action Input/Observation can repeat)\n\
             Thought: I now know the final answer\n\
             Final Answer: the answer to the original task\n\
             \n\
             Task: {task}\n\
             \n"
        )
    }

    /// Execute one task to completion.
    ///
    /// This never returns an error: every way a run can end, including
    /// model failures and malformed responses, is recorded in the
    /// returned [`AgentRun`]'s outcome.
    pub async fn execute(&self, task: &str) -> AgentRun {
        let mut run = AgentRun::begin(task);
        tracing::info!("run {} started: {task}", run.id);

        let base_prompt = self.build_prompt(task);
        let mut transcript = String::new();

        for step in 1..=self.max_steps {
            let prompt = format!("{base_prompt}{transcript}");
            let response = match self.model.complete(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("model call failed on step {step}: {e}");
                    return run.fail(e.to_string());
                }
            };
            run.steps_used = step;

            let parsed = match parser::parse(&response) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("unparseable response on step {step}: {e}");
                    return run.fail(e.to_string());
                }
            };

            match parsed {
                ReactOutput::Final { answer } => {
                    tracing::info!("run {} finished after {step} step(s)", run.id);
                    return run.succeed(answer);
                }
                ReactOutput::Step {
                    thought,
                    action,
                    input,
                } => {
                    if let Some(thought) = thought {
                        transcript.push_str(&format!("Thought: {thought}\n"));
                        run.steps.push(ReasoningStep::thought(thought));
                    }

                    let Some(tool) = self.registry.find(&action) else {
                        tracing::warn!("model requested unknown tool '{action}'");
                        return run.fail(format!("tool not found: {action}"));
                    };

                    run.steps.push(ReasoningStep::action(format!("{action} {input}")));
                    let observation = match tool.execute(input.clone()).await {
                        Ok(output) => output,
                        Err(e) => format!("Error: {e}"),
                    };
                    tracing::debug!("observation from {action}: {observation}");
                    transcript.push_str(&format!(
                        "Action: {action}\nAction Input: {input}\nObservation: {observation}\n\n"
                    ));
                    run.steps.push(ReasoningStep::observation(observation));
                }
            }
        }

        tracing::warn!(
            "run {} used all {} steps without a final answer",
            run.id,
            self.max_steps
        );
        run.fail("max steps exceeded")
    }
}
