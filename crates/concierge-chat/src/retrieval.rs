//! Conversational retrieval chain.
//!
//! With prior conversation, the LLM first rewrites the follow-up into a
//! standalone question. The question is then used to fetch the top-k chunks,
//! which are stuffed into a QA prompt for the final answer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use concierge_action::{DocumentQa, ToolError};
use concierge_llm::{ChatMessage, ChatModel, Role};
use concierge_vector::{DocumentStore, RetrievedChunk};

use crate::error::ChatError;

const CONDENSE_PROMPT: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

const QA_PROMPT: &str = "Use the following pieces of context to answer the user's question.\n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------";

/// Answer plus the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct ChainAnswer {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

pub struct RetrievalChain {
    store: Arc<DocumentStore>,
    llm: Arc<dyn ChatModel>,
    top_k: usize,
}

impl RetrievalChain {
    pub fn new(store: Arc<DocumentStore>, llm: Arc<dyn ChatModel>, top_k: usize) -> Self {
        Self { store, llm, top_k }
    }

    /// Answer `question` given the prior conversation.
    pub async fn ask(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<ChainAnswer, ChatError> {
        let standalone = self.condense(question, history).await?;
        let sources = self.store.search(&standalone, self.top_k).await?;
        debug!(
            question = %standalone,
            chunks = sources.len(),
            "Retrieved context"
        );

        let context = sources
            .iter()
            .map(|s| s.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = [
            ChatMessage::system(format!("{}\n{}", QA_PROMPT, context)),
            ChatMessage::user(standalone),
        ];
        let answer = self.llm.complete(&messages).await?;

        Ok(ChainAnswer {
            answer: answer.trim().to_string(),
            sources,
        })
    }

    /// Rewrite a follow-up into a standalone question. Without history the
    /// question is returned unchanged and no LLM call is made.
    pub async fn condense(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String, ChatError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = format!(
            "{}\n\nChat History:\n{}\nFollow Up Input: {}\nStandalone question:",
            CONDENSE_PROMPT,
            format_history(history),
            question
        );
        let rewritten = self.llm.complete(&[ChatMessage::user(prompt)]).await?;
        let rewritten = rewritten.trim();

        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(rewritten.to_string())
        }
    }
}

#[async_trait]
impl DocumentQa for RetrievalChain {
    async fn answer(&self, question: &str) -> Result<String, ToolError> {
        self.ask(question, &[])
            .await
            .map(|a| a.answer)
            .map_err(|e| ToolError::Search(e.to_string()))
    }
}

fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| match m.role {
            Role::User => format!("Human: {}", m.content),
            _ => format!("Assistant: {}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_llm::ScriptedModel;
    use concierge_vector::{Document, HashEmbedding, RecursiveTextSplitter};

    async fn store() -> Arc<DocumentStore> {
        let store = DocumentStore::new(
            Arc::new(HashEmbedding::new(256)),
            RecursiveTextSplitter::new(200, 20).unwrap(),
        );
        store
            .ingest(&[
                Document::new("hours.txt", "The office is open from nine to five on weekdays."),
                Document::new("refunds.txt", "Refunds are issued within fourteen days."),
            ])
            .await
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_ask_without_history_skips_condense() {
        let model = Arc::new(ScriptedModel::new(["Nine to five."]));
        let chain = RetrievalChain::new(store().await, model.clone(), 1);

        let answer = chain.ask("When is the office open?", &[]).await.unwrap();
        assert_eq!(answer.answer, "Nine to five.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].chunk.source, "hours.txt");

        assert_eq!(model.call_count(), 1);
        let prompts = model.prompts();
        let sent = &prompts[0];
        assert!(sent[0].content.contains("don't know"));
        assert!(sent[0].content.contains("open from nine to five"));
        assert_eq!(sent[1].content, "When is the office open?");
    }

    #[tokio::test]
    async fn test_ask_with_history_condenses_first() {
        let model = Arc::new(ScriptedModel::new([
            "How long do refunds take?",
            "Fourteen days.",
        ]));
        let chain = RetrievalChain::new(store().await, model.clone(), 4);
        let history = vec![
            ChatMessage::user("Tell me about refunds"),
            ChatMessage::assistant("We offer refunds."),
        ];

        let answer = chain.ask("how long?", &history).await.unwrap();
        assert_eq!(answer.answer, "Fourteen days.");

        let prompts = model.prompts();
        let condense = &prompts[0][0].content;
        assert!(condense.contains("Human: Tell me about refunds\nAssistant: We offer refunds."));
        assert!(condense.ends_with("Follow Up Input: how long?\nStandalone question:"));
        assert_eq!(prompts[1][1].content, "How long do refunds take?");
    }

    #[tokio::test]
    async fn test_blank_condense_falls_back_to_question() {
        let model = Arc::new(ScriptedModel::new(["   ", "answer"]));
        let chain = RetrievalChain::new(store().await, model.clone(), 4);
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];

        chain.ask("refunds?", &history).await.unwrap();
        assert_eq!(model.prompts()[1][1].content, "refunds?");
    }

    #[tokio::test]
    async fn test_document_qa_maps_errors() {
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let chain = RetrievalChain::new(store().await, model, 4);
        assert!(matches!(
            chain.answer("anything").await,
            Err(ToolError::Search(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_store_still_answers() {
        let empty = Arc::new(DocumentStore::new(
            Arc::new(HashEmbedding::default()),
            RecursiveTextSplitter::new(100, 10).unwrap(),
        ));
        let model = Arc::new(ScriptedModel::new(["I don't know."]));
        let chain = RetrievalChain::new(empty, model, 4);

        let answer = chain.ask("anything?", &[]).await.unwrap();
        assert_eq!(answer.answer, "I don't know.");
        assert!(answer.sources.is_empty());
    }
}
