//! Error types for LLM calls.

use concierge_core::error::ConciergeError;

/// Errors from a chat-completion call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key not set: export {0} or add it to .env")]
    MissingApiKey(String),
    #[error("LLM API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("LLM returned no choices")]
    EmptyResponse,
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),
}

impl From<LlmError> for ConciergeError {
    fn from(err: LlmError) -> Self {
        ConciergeError::Llm(err.to_string())
    }
}
