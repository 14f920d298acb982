//! Agent loop: ask the LLM, run the tool it names, feed back the result.

use std::sync::Arc;

use tracing::{debug, info, warn};

use concierge_llm::{ChatMessage, ChatModel};

use crate::agent::parser::{parse_output, AgentStep};
use crate::error::{AgentError, ToolError};
use crate::tools::ToolRegistry;

pub struct AgentExecutor {
    llm: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, max_iterations: usize) -> Self {
        Self {
            llm,
            tools,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Run the agent on `query` with prior conversation `history`.
    ///
    /// Returns the final answer, or [`AgentError::IterationLimit`] when the
    /// LLM keeps calling tools past `max_iterations`.
    pub async fn run(&self, query: &str, history: &[ChatMessage]) -> Result<String, AgentError> {
        let system = ChatMessage::system(self.system_prompt());
        let mut scratchpad = String::new();

        for iteration in 1..=self.max_iterations {
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(system.clone());
            messages.extend_from_slice(history);
            messages.push(ChatMessage::user(format!(
                "Question: {}\n{}",
                query, scratchpad
            )));

            let reply = self.llm.complete(&messages).await?;

            let action = match parse_output(&reply) {
                AgentStep::Finish(finish) => {
                    info!(iteration, "Agent finished");
                    return Ok(finish.output);
                }
                AgentStep::Action(action) => action,
            };

            debug!(iteration, tool = %action.tool, "Agent chose tool");
            let observation = match self.tools.execute(&action.tool, &action.input).await {
                Ok(output) => output,
                Err(ToolError::UnknownTool(name)) => {
                    warn!(tool = %name, "Agent named an unknown tool");
                    format!(
                        "{} is not a valid tool, try one of [{}].",
                        name,
                        self.tools.names().join(", ")
                    )
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(tool = %action.tool, error = %e, "Tool failed");
                    format!("Error: {}", e)
                }
            };

            let thought = action
                .log
                .split("\nObservation:")
                .next()
                .unwrap_or_default()
                .trim_end();
            scratchpad.push_str(&format!(
                "{}\nObservation: {}\nThought: ",
                thought, observation
            ));
        }

        warn!(max = self.max_iterations, "Agent hit iteration limit");
        Err(AgentError::IterationLimit(self.max_iterations))
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a helpful assistant. Answer the user's request as best you can. \
You have access to the following tools:\n\n{tools}\n\n\
Use the following format:\n\n\
Question: the input you must respond to\n\
Thought: think about what to do\n\
Action: the action to take, one of [{names}]\n\
Action Input: the input to the action\n\
Observation: the result of the action\n\
... (Thought/Action/Action Input/Observation can repeat)\n\
Thought: I now know the final answer\n\
Final Answer: the reply to the user\n\n\
If no tool is needed, reply with a Final Answer straight away.",
            tools = self.tools.describe(),
            names = self.tools.names().join(", ")
        )
    }
}
