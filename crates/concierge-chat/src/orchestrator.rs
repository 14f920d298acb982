//! Chat orchestrator: routes each message, runs the chosen handler and
//! records the exchange in conversation memory.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use concierge_action::{
    AgentError, AgentExecutor, ContactTool, DateParser, Prompter, SchedulingTool, SearchTool,
    ToolRegistry,
};
use concierge_core::config::ConciergeConfig;
use concierge_llm::{ChatMessage, ChatModel};
use concierge_storage::{AppointmentRepository, ContactRepository, Database};
use concierge_vector::DocumentStore;

use crate::error::ChatError;
use crate::memory::ConversationMemory;
use crate::response::{self, HELP_TEXT, HISTORY_CLEARED, SCHEDULING_HELP};
use crate::retrieval::RetrievalChain;
use crate::router::{QueryRouter, Route};

/// Messages shown by the recall command: the last two exchanges.
const RECALL_MESSAGES: usize = 4;

/// The assistant: one per conversation.
pub struct ChatBot {
    router: QueryRouter,
    memory: Mutex<ConversationMemory>,
    chain: Arc<RetrievalChain>,
    agent: Option<AgentExecutor>,
    scheduler: Arc<SchedulingTool>,
    contact: Arc<ContactTool>,
    dates: DateParser,
}

impl ChatBot {
    /// Wire the tools, agent and retrieval chain from configuration.
    pub fn new(
        config: &ConciergeConfig,
        db: Arc<Database>,
        store: Arc<DocumentStore>,
        llm: Arc<dyn ChatModel>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let dates = DateParser::new(config.timezone());

        let contact = Arc::new(ContactTool::new(
            Arc::new(ContactRepository::new(db.clone())),
            prompter,
            config.agent.max_prompt_attempts,
        ));
        let scheduler = Arc::new(SchedulingTool::new(
            Arc::new(AppointmentRepository::new(db)),
            contact.clone(),
            dates,
        ));
        let chain = Arc::new(RetrievalChain::new(
            store,
            llm.clone(),
            config.retrieval.top_k,
        ));

        let agent = if config.agent.llm_dispatch {
            let mut tools = ToolRegistry::new();
            tools.register(Arc::new(SearchTool::new(chain.clone())));
            tools.register(scheduler.clone());
            tools.register(contact.clone());
            Some(AgentExecutor::new(
                llm,
                Arc::new(tools),
                config.agent.max_iterations,
            ))
        } else {
            None
        };

        info!(
            llm_dispatch = agent.is_some(),
            timezone = %config.general.timezone,
            "Chatbot ready"
        );

        Self {
            router: QueryRouter::new(),
            memory: Mutex::new(ConversationMemory::new(config.memory.max_messages)),
            chain,
            agent,
            scheduler,
            contact,
            dates,
        }
    }

    /// Handle one user message and return the reply.
    ///
    /// Every handled exchange except a history clear is appended to memory.
    pub async fn process_query(&self, query: &str) -> Result<String, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let has_contact = self.contact.current()?.is_some();
        let route = self.router.route(query, has_contact, self.dates.today());
        debug!(?route, has_contact, "Routed query");

        let reply = match route {
            Route::ClearHistory => {
                self.lock_memory()?.clear();
                info!("Conversation history cleared");
                return Ok(HISTORY_CLEARED.to_string());
            }
            Route::ListCalls => self.scheduler.list()?,
            Route::Help => HELP_TEXT.to_string(),
            Route::Recall => {
                let recent = self.lock_memory()?.recent(RECALL_MESSAGES);
                response::history_summary(&recent)
            }
            Route::Schedule => self.scheduler.schedule(query).await?,
            Route::Cancel => self.scheduler.cancel()?,
            Route::UpdateContact(field) => self.contact.update(field).await?,
            Route::SchedulingHelp => SCHEDULING_HELP.to_string(),
            Route::Agent => self.answer(query).await?,
        };

        self.lock_memory()?.push_turn(query, &reply);
        Ok(reply)
    }

    /// Snapshot of the conversation memory, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.memory
            .lock()
            .map(|m| m.messages())
            .unwrap_or_default()
    }

    async fn answer(&self, query: &str) -> Result<String, ChatError> {
        let history = self.history();

        let Some(agent) = &self.agent else {
            return Ok(self.chain.ask(query, &history).await?.answer);
        };

        match agent.run(query, &history).await {
            Ok(answer) => Ok(answer),
            Err(AgentError::IterationLimit(n)) => {
                warn!(iterations = n, "Agent gave up; answering from documents");
                Ok(self.chain.ask(query, &history).await?.answer)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn lock_memory(&self) -> Result<std::sync::MutexGuard<'_, ConversationMemory>, ChatError> {
        self.memory
            .lock()
            .map_err(|e| ChatError::Storage(format!("memory lock poisoned: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_action::ScriptedPrompter;
    use concierge_llm::ScriptedModel;
    use concierge_vector::{Document, HashEmbedding, RecursiveTextSplitter};

    struct Harness {
        bot: ChatBot,
        model: Arc<ScriptedModel>,
        prompter: Arc<ScriptedPrompter>,
    }

    async fn harness(llm_dispatch: bool) -> Harness {
        let mut config = ConciergeConfig::default();
        config.agent.llm_dispatch = llm_dispatch;

        let store = DocumentStore::new(
            Arc::new(HashEmbedding::new(256)),
            RecursiveTextSplitter::new(200, 20).unwrap(),
        );
        store
            .ingest(&[Document::new(
                "hours.txt",
                "The office is open from nine to five on weekdays.",
            )])
            .await
            .unwrap();

        let model = Arc::new(ScriptedModel::default());
        let prompter = Arc::new(ScriptedPrompter::default());
        let bot = ChatBot::new(
            &config,
            Arc::new(Database::in_memory().unwrap()),
            Arc::new(store),
            model.clone(),
            prompter.clone(),
        );
        Harness {
            bot,
            model,
            prompter,
        }
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let h = harness(true).await;
        assert!(matches!(
            h.bot.process_query("   ").await,
            Err(ChatError::EmptyMessage)
        ));
    }

    #[tokio::test]
    async fn test_help_is_recorded_in_memory() {
        let h = harness(true).await;
        let reply = h.bot.process_query("help").await.unwrap();
        assert_eq!(reply, HELP_TEXT);
        assert_eq!(h.bot.history().len(), 2);
        assert_eq!(h.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_history_not_recorded() {
        let h = harness(true).await;
        h.bot.process_query("help").await.unwrap();
        let reply = h.bot.process_query("clear chat").await.unwrap();
        assert_eq!(reply, HISTORY_CLEARED);
        assert!(h.bot.history().is_empty());
    }

    #[tokio::test]
    async fn test_recall_with_and_without_history() {
        let h = harness(true).await;
        assert_eq!(
            h.bot.process_query("what did I just say?").await.unwrap(),
            response::START_OF_CONVERSATION
        );

        h.bot.process_query("call").await.unwrap();
        let recap = h.bot.process_query("previous").await.unwrap();
        assert!(recap.starts_with("Recent conversation:"));
        assert!(recap.contains("You: call"));
    }

    #[tokio::test]
    async fn test_agent_route_uses_llm() {
        let h = harness(true).await;
        h.model.push_reply("Final Answer: Hello!");
        assert_eq!(h.bot.process_query("hi there").await.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_agent_exhaustion_falls_back_to_chain() {
        let h = harness(true).await;
        for _ in 0..4 {
            h.model
                .push_reply("Action: Search_Documents\nAction Input: opening hours");
            h.model.push_reply("Nine to five.");
        }
        h.model.push_reply("We are open nine to five.");

        let reply = h.bot.process_query("when are you open?").await.unwrap();
        assert_eq!(reply, "We are open nine to five.");
        // 4 agent turns, 4 tool calls into the chain, 1 fallback answer.
        assert_eq!(h.model.call_count(), 9);
    }

    #[tokio::test]
    async fn test_dispatch_disabled_uses_chain() {
        let h = harness(false).await;
        h.model.push_reply("Nine to five.");
        let reply = h.bot.process_query("when are you open?").await.unwrap();
        assert_eq!(reply, "Nine to five.");

        let prompts = h.model.prompts();
        assert!(prompts[0][0].content.contains("open from nine to five"));
    }

    #[tokio::test]
    async fn test_schedule_flow() {
        let h = harness(true).await;
        h.prompter
            .push(["Asha", "asha@example.com", "+977 9818000000"]);

        let reply = h.bot.process_query("I want to schedule a call").await.unwrap();
        assert_eq!(reply, "When would you like to schedule the call?");

        let reply = h.bot.process_query("tomorrow morning").await.unwrap();
        assert!(reply.starts_with("I've scheduled a call for "));
        assert!(reply.ends_with("Name: Asha\nEmail: asha@example.com\nPhone: +977 9818000000"));

        let listing = h.bot.process_query("show scheduled calls").await.unwrap();
        assert!(listing.contains("Name: Asha"));

        let reply = h.bot.process_query("cancel my appointment").await.unwrap();
        assert!(reply.contains("has been cancelled"));
        assert_eq!(
            h.bot.process_query("show scheduled calls").await.unwrap(),
            "No scheduled calls at the moment."
        );
        assert_eq!(h.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_contact_flow() {
        let h = harness(true).await;
        h.prompter
            .push(["Asha", "asha@example.com", "+977 9818000000", "bad-email"]);
        h.bot.process_query("book a call").await.unwrap();

        let reply = h.bot.process_query("change my email").await.unwrap();
        assert_eq!(reply, "Invalid email format. No changes made.");
    }

    #[tokio::test]
    async fn test_llm_failure_surfaces_as_error() {
        let h = harness(true).await;
        let err = h.bot.process_query("tell me a story").await.unwrap_err();
        assert!(matches!(err, ChatError::Llm(_)));
        assert!(h.bot.history().is_empty());
    }
}
