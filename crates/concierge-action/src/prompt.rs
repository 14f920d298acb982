//! Interactive prompting seam.
//!
//! Tools that need more input from the user mid-turn (contact details, a new
//! email address) ask through a [`Prompter`]. The terminal app implements it
//! over stdin; tests use [`ScriptedPrompter`].

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ToolError;

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Show `question` and return the user's answer, without the newline.
    async fn ask(&self, question: &str) -> Result<String, ToolError>;

    /// Show a message that needs no answer.
    async fn notify(&self, message: &str) -> Result<(), ToolError>;
}

/// Prompter that answers from a fixed script and records what it was shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Queue more answers.
    pub fn push<I, S>(&self, answers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut queue) = self.answers.lock() {
            queue.extend(answers.into_iter().map(Into::into));
        }
    }

    /// Every question and notice shown so far.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn record(&self, line: &str) -> Result<(), ToolError> {
        self.transcript
            .lock()
            .map_err(|e| ToolError::Prompt(format!("Lock poisoned: {}", e)))?
            .push(line.to_string());
        Ok(())
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&self, question: &str) -> Result<String, ToolError> {
        self.record(question)?;
        self.answers
            .lock()
            .map_err(|e| ToolError::Prompt(format!("Lock poisoned: {}", e)))?
            .pop_front()
            .ok_or_else(|| ToolError::Prompt("input closed".to_string()))
    }

    async fn notify(&self, message: &str) -> Result<(), ToolError> {
        self.record(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_answers_in_order() {
        let prompter = ScriptedPrompter::new(["Asha", "asha@example.com"]);
        assert_eq!(prompter.ask("name?").await.unwrap(), "Asha");
        prompter.notify("noted").await.unwrap();
        assert_eq!(prompter.ask("email?").await.unwrap(), "asha@example.com");
        assert_eq!(prompter.transcript(), vec!["name?", "noted", "email?"]);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_prompt_error() {
        let prompter = ScriptedPrompter::default();
        assert!(matches!(
            prompter.ask("anything?").await,
            Err(ToolError::Prompt(_))
        ));
    }

    #[tokio::test]
    async fn test_push_more_answers() {
        let prompter = ScriptedPrompter::default();
        prompter.push(["late"]);
        assert_eq!(prompter.ask("q").await.unwrap(), "late");
        assert!(prompter.ask("again?").await.is_err());
    }
}
