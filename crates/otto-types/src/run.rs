//! Reasoning-trace types produced by the agent loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a single step in a reasoning trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Thought,
    Action,
    Observation,
}

/// One step of a run's trace: a thought, an action, or an observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub kind: StepKind,
    pub content: String,
}

impl ReasoningStep {
    pub fn thought(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Thought,
            content: content.into(),
        }
    }

    pub fn action(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Action,
            content: content.into(),
        }
    }

    pub fn observation(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Observation,
            content: content.into(),
        }
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Success { final_answer: String },
    Failure { error: String },
}

/// One complete task execution: the task, its ordered trace, and how it ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    pub id: Uuid,
    pub task: String,
    pub steps: Vec<ReasoningStep>,
    pub outcome: RunOutcome,
    /// Number of loop iterations consumed (bounded by the agent's step budget).
    pub steps_used: usize,
    pub started_at: DateTime<Utc>,
}

impl AgentRun {
    /// Start a new run for the given task with an empty trace.
    pub fn begin(task: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task: task.into(),
            steps: Vec::new(),
            outcome: RunOutcome::Failure {
                error: "run not completed".to_string(),
            },
            steps_used: 0,
            started_at: Utc::now(),
        }
    }

    /// Finish the run successfully.
    pub fn succeed(mut self, final_answer: impl Into<String>) -> Self {
        self.outcome = RunOutcome::Success {
            final_answer: final_answer.into(),
        };
        self
    }

    /// Finish the run as failed.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.outcome = RunOutcome::Failure {
            error: error.into(),
        };
        self
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Success { .. })
    }

    pub fn final_answer(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Success { final_answer } => Some(final_answer),
            RunOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Success { .. } => None,
            RunOutcome::Failure { error } => Some(error),
        }
    }
}
