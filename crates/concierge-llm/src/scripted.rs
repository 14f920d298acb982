//! Scripted chat model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::message::ChatMessage;
use crate::ChatModel;

/// Returns queued replies in order and records every conversation it was sent.
///
/// Once the queue is drained, `complete` fails with [`LlmError::Request`]
/// unless a fallback reply is set.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply used once the scripted replies run out.
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply.into());
        }
    }

    /// Every conversation sent so far, oldest first.
    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .map_err(|e| LlmError::Request(format!("Lock poisoned: {}", e)))?
            .push(messages.to_vec());

        let next = self
            .replies
            .lock()
            .map_err(|e| LlmError::Request(format!("Lock poisoned: {}", e)))?
            .pop_front();

        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| LlmError::Request("scripted model has no replies left".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_and_records_prompts() {
        let model = ScriptedModel::new(["first", "second"]);
        let a = model.complete(&[ChatMessage::user("one")]).await.unwrap();
        let b = model.complete(&[ChatMessage::user("two")]).await.unwrap();

        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.prompts()[1][0].content, "two");
    }

    #[tokio::test]
    async fn test_exhausted_script_errors() {
        let model = ScriptedModel::new(Vec::<String>::new());
        assert!(matches!(
            model.complete(&[]).await,
            Err(LlmError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_reply() {
        let model = ScriptedModel::new(["only"]).with_fallback("again");
        model.complete(&[]).await.unwrap();
        assert_eq!(model.complete(&[]).await.unwrap(), "again");
        assert_eq!(model.complete(&[]).await.unwrap(), "again");
    }

    #[tokio::test]
    async fn test_push_reply() {
        let model = ScriptedModel::default();
        model.push_reply("late");
        assert_eq!(model.complete(&[]).await.unwrap(), "late");
    }
}
