//! Error types for the conversational layer.

use concierge_action::{AgentError, ToolError};
use concierge_core::error::ConciergeError;
use concierge_llm::LlmError;

/// Errors from handling a chat message.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),
    #[error("search error: {0}")]
    Search(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<ConciergeError> for ChatError {
    fn from(err: ConciergeError) -> Self {
        match err {
            ConciergeError::Search(m) | ConciergeError::Embedding(m) => ChatError::Search(m),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

impl From<AgentError> for ChatError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Llm(e) => ChatError::Llm(e),
            AgentError::Tool(e) => ChatError::Tool(e),
            other => ChatError::Search(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::Search("index offline".to_string()).to_string(),
            "search error: index offline"
        );
        let err: ChatError = LlmError::EmptyResponse.into();
        assert_eq!(err.to_string(), "LLM error: LLM returned no choices");
    }

    #[test]
    fn test_from_concierge_error() {
        let err: ChatError = ConciergeError::Search("bad query".to_string()).into();
        assert!(matches!(err, ChatError::Search(m) if m == "bad query"));

        let err: ChatError = ConciergeError::Storage("disk full".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_from_agent_error() {
        let err: ChatError = AgentError::Llm(LlmError::Timeout(5)).into();
        assert!(matches!(err, ChatError::Llm(LlmError::Timeout(5))));

        let err: ChatError = AgentError::Tool(ToolError::Prompt("eof".into())).into();
        assert!(matches!(err, ChatError::Tool(ToolError::Prompt(_))));
    }
}
