//! Conversational layer for Concierge.
//!
//! Routes each user message to canned replies, the scheduling and contact
//! tools, the LLM agent, or the document retrieval chain, and keeps the
//! conversation memory that feeds later LLM calls.

pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod response;
pub mod retrieval;
pub mod router;

pub use error::ChatError;
pub use memory::ConversationMemory;
pub use orchestrator::ChatBot;
pub use retrieval::{ChainAnswer, RetrievalChain};
pub use router::{QueryRouter, Route};
