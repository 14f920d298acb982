//! Document search tool.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::tools::ToolHandler;

/// Answers a question from the document corpus.
///
/// Implemented by the retrieval chain in `concierge-chat`.
#[async_trait]
pub trait DocumentQa: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String, ToolError>;
}

pub struct SearchTool {
    qa: Arc<dyn DocumentQa>,
}

impl SearchTool {
    pub fn new(qa: Arc<dyn DocumentQa>) -> Self {
        Self { qa }
    }
}

#[async_trait]
impl ToolHandler for SearchTool {
    fn name(&self) -> &'static str {
        "Search_Documents"
    }

    fn description(&self) -> &'static str {
        "Use this to answer questions about the loaded documents. Input is a standalone question."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        if input.trim().is_empty() {
            return Err(ToolError::InvalidInput(
                "search question must not be empty".to_string(),
            ));
        }
        self.qa.answer(input).await
    }
}
