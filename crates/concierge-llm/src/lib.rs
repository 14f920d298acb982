//! Concierge LLM crate - chat-completion client and the `ChatModel` seam.
//!
//! Everything that talks to a language model goes through [`ChatModel`]. The
//! production implementation is [`OpenAiCompatibleClient`] (Groq by default);
//! tests drive the higher layers with [`ScriptedModel`].

pub mod client;
pub mod error;
pub mod message;
pub mod scripted;

use async_trait::async_trait;

pub use client::OpenAiCompatibleClient;
pub use error::LlmError;
pub use message::{ChatMessage, Role};
pub use scripted::ScriptedModel;

/// A chat-completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and return the assistant's reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
