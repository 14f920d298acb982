//! Terminal input shared by the chat loop and mid-turn prompts.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use concierge_action::{Prompter, ToolError};

/// A source of user input lines.
#[async_trait]
pub trait LineSource: Send + Sync {
    /// The next line without its newline, or `None` at end of input.
    async fn next_line(&self) -> std::io::Result<Option<String>>;
}

/// Line reader over stdin. Cloning shares the same underlying reader so
/// tool prompts and the chat loop never race for input.
#[derive(Clone)]
pub struct Console {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSource for Console {
    async fn next_line(&self) -> std::io::Result<Option<String>> {
        self.lines.lock().await.next_line().await
    }
}

#[async_trait]
impl Prompter for Console {
    async fn ask(&self, question: &str) -> Result<String, ToolError> {
        print!("{}", question);
        std::io::stdout()
            .flush()
            .map_err(|e| ToolError::Prompt(e.to_string()))?;
        match self.next_line().await {
            Ok(Some(line)) => Ok(line.trim().to_string()),
            Ok(None) => Err(ToolError::Prompt("input closed".to_string())),
            Err(e) => Err(ToolError::Prompt(e.to_string())),
        }
    }

    async fn notify(&self, message: &str) -> Result<(), ToolError> {
        println!("{}", message);
        Ok(())
    }
}
