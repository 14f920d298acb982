//! Tools and agent loop for Concierge.
//!
//! Parses natural-language dates, validates contact details, runs the
//! scheduling, contact and document-search tools, and drives a ReAct-style
//! agent that lets the LLM pick a tool for free-form requests.

pub mod agent;
pub mod date_parser;
pub mod error;
pub mod prompt;
pub mod tools;
pub mod validate;

pub use agent::{parse_output, AgentAction, AgentExecutor, AgentFinish, AgentStep};
pub use date_parser::DateParser;
pub use error::{AgentError, ToolError};
pub use prompt::{Prompter, ScriptedPrompter};
pub use tools::contact::ContactTool;
pub use tools::schedule::SchedulingTool;
pub use tools::search::{DocumentQa, SearchTool};
pub use tools::{ToolHandler, ToolRegistry};
