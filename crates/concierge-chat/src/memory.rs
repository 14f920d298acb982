//! Conversation memory buffer.

use std::collections::VecDeque;

use concierge_llm::ChatMessage;

/// Ordered buffer of past user and assistant messages.
///
/// Holds at most `max_messages`. Whole exchanges are evicted oldest first,
/// so the buffer always starts on a user message.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    messages: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl ConversationMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages: max_messages.max(2),
        }
    }

    /// Record one exchange.
    pub fn push_turn(&mut self, user: &str, assistant: &str) {
        self.messages.push_back(ChatMessage::user(user));
        self.messages.push_back(ChatMessage::assistant(assistant));
        while self.messages.len() > self.max_messages {
            self.messages.drain(..2);
        }
    }

    /// All retained messages, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(50)
    }
}
