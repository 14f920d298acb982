//! ReAct-style agent: the LLM reasons in text, names a tool, reads the
//! observation, and repeats until it gives a final answer.

pub mod executor;
pub mod parser;

pub use executor::AgentExecutor;
pub use parser::{parse_output, AgentAction, AgentFinish, AgentStep};
