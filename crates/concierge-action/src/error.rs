//! Error types for tools and the agent loop.

use concierge_core::error::ConciergeError;
use concierge_llm::LlmError;

/// Errors from tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not registered: {0}")]
    UnknownTool(String),
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Prompt failed: {0}")]
    Prompt(String),
    #[error("Document search failed: {0}")]
    Search(String),
    #[error("Storage error: {0}")]
    Storage(#[from] ConciergeError),
}

impl ToolError {
    /// Errors the user has to see rather than the LLM.
    ///
    /// A closed input stream or a contact field that kept failing validation
    /// ends the turn; anything else is reported back to the agent as an
    /// observation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ToolError::Validation(_) | ToolError::Prompt(_))
    }
}

/// Errors from the agent executor.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Agent stopped after {0} iterations without a final answer")]
    IterationLimit(usize),
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::UnknownTool("Send_Email".to_string());
        assert_eq!(err.to_string(), "Tool not registered: Send_Email");

        let err = ToolError::Validation("too many invalid emails".to_string());
        assert_eq!(err.to_string(), "Validation failed: too many invalid emails");

        let err: ToolError = ConciergeError::Storage("disk full".to_string()).into();
        assert!(matches!(err, ToolError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_fatal_errors() {
        assert!(ToolError::Validation("x".into()).is_fatal());
        assert!(ToolError::Prompt("eof".into()).is_fatal());
        assert!(!ToolError::Search("x".into()).is_fatal());
        assert!(!ToolError::UnknownTool("x".into()).is_fatal());
    }

    #[test]
    fn test_agent_error_display() {
        assert_eq!(
            AgentError::IterationLimit(4).to_string(),
            "Agent stopped after 4 iterations without a final answer"
        );
        let err: AgentError = LlmError::EmptyResponse.into();
        assert_eq!(err.to_string(), "LLM error: LLM returned no choices");
    }
}
