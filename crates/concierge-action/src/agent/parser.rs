//! Parser for ReAct-formatted LLM output.

use regex::Regex;
use std::sync::LazyLock;

const FINAL_ANSWER: &str = "Final Answer:";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action:[ \t]*(.*?)[\n]*Action Input:[ \t]*(.*)").expect("Invalid action regex")
});

/// A tool invocation requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    pub tool: String,
    pub input: String,
    /// Raw LLM text that produced this action.
    pub log: String,
}

/// The LLM's final reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentFinish {
    pub output: String,
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// Classify one LLM completion.
///
/// `Final Answer:` wins over any action in the same text. Text with neither
/// marker is treated as the final answer verbatim.
pub fn parse_output(text: &str) -> AgentStep {
    if let Some(idx) = text.rfind(FINAL_ANSWER) {
        return AgentStep::Finish(AgentFinish {
            output: text[idx + FINAL_ANSWER.len()..].trim().to_string(),
            log: text.to_string(),
        });
    }

    let Some(caps) = ACTION_RE.captures(text) else {
        return AgentStep::Finish(AgentFinish {
            output: text.to_string(),
            log: text.to_string(),
        });
    };

    // Models sometimes hallucinate the observation; cut it off.
    let raw_input = caps[2]
        .split("\nObservation:")
        .next()
        .unwrap_or_default();

    AgentStep::Action(AgentAction {
        tool: caps[1].trim().to_string(),
        input: raw_input.trim().trim_matches('"').trim().to_string(),
        log: text.to_string(),
    })
}
