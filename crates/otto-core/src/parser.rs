//! Parser for ReAct-format model responses.
//!
//! A response is a loose line protocol built from four keywords:
//! `Thought:`, `Action:`, `Action Input:`, and `Final Answer:`. A
//! keyword at the start of a line opens a section, and the section runs
//! until the next keyword line or the end of the text. `Final Answer:`
//! takes precedence over everything else in the response.

use serde_json::Value;
use thiserror::Error;

/// A structurally invalid model response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("could not parse action")]
    MissingAction,

    #[error("could not parse action input")]
    MissingActionInput,

    #[error("invalid action input JSON: {input}")]
    InvalidActionInput { input: String },
}

/// A structurally valid model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactOutput {
    /// The model is done; the run ends with this answer.
    Final { answer: String },
    /// The model wants a tool invoked and the result fed back.
    Step {
        thought: Option<String>,
        action: String,
        input: Value,
    },
}

#[derive(Clone, Copy)]
enum Section {
    Thought,
    Action,
    ActionInput,
}

/// Matches a section keyword at the start of a line. `Action Input:`
/// must be tried before `Action:` since the latter is its prefix.
fn section_start(line: &str) -> Option<(Section, &str)> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("Action Input:") {
        return Some((Section::ActionInput, rest));
    }
    if let Some(rest) = trimmed.strip_prefix("Action:") {
        return Some((Section::Action, rest));
    }
    if let Some(rest) = trimmed.strip_prefix("Thought:") {
        return Some((Section::Thought, rest));
    }
    None
}

/// Stores a finished section. The first non-empty occurrence of each
/// keyword wins; later repeats are ignored.
fn flush_section(
    section: Section,
    fragments: Vec<&str>,
    thought: &mut Option<String>,
    action: &mut Option<String>,
    input_text: &mut Option<String>,
) {
    let slot = match section {
        Section::Thought => thought,
        Section::Action => action,
        Section::ActionInput => input_text,
    };
    if slot.is_some() {
        return;
    }
    let text = fragments.join("\n").trim().to_string();
    if !text.is_empty() {
        *slot = Some(text);
    }
}

/// Parses one model response.
///
/// If any line carries `Final Answer:`, the answer is that line's
/// remainder plus everything after it, and the rest of the response is
/// ignored. Otherwise the first `Thought:`, `Action:`, and
/// `Action Input:` sections are extracted; the action input must be a
/// valid JSON value.
pub fn parse(text: &str) -> Result<ReactOutput, ParseError> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if let Some(rest) = line.trim_start().strip_prefix("Final Answer:") {
            let mut answer_lines = vec![rest];
            answer_lines.extend_from_slice(&lines[i + 1..]);
            let answer = answer_lines.join("\n").trim().to_string();
            return Ok(ReactOutput::Final { answer });
        }
    }

    let mut thought: Option<String> = None;
    let mut action: Option<String> = None;
    let mut input_text: Option<String> = None;
    let mut current: Option<(Section, Vec<&str>)> = None;

    for line in &lines {
        if let Some((section, rest)) = section_start(line) {
            if let Some((open, fragments)) = current.take() {
                flush_section(open, fragments, &mut thought, &mut action, &mut input_text);
            }
            current = Some((section, vec![rest]));
        } else if let Some((_, fragments)) = current.as_mut() {
            fragments.push(line);
        }
        // Lines before the first keyword are preamble and dropped.
    }
    if let Some((open, fragments)) = current.take() {
        flush_section(open, fragments, &mut thought, &mut action, &mut input_text);
    }

    let action = action.ok_or(ParseError::MissingAction)?;
    let input_text = input_text.ok_or(ParseError::MissingActionInput)?;

    match serde_json::from_str::<Value>(&input_text) {
        Ok(input) => Ok(ReactOutput::Step {
            thought,
            action,
            input,
        }),
        Err(_) => Err(ParseError::InvalidActionInput { input: input_text }),
    }
}
