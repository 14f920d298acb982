//! Tool trait and registry.
//!
//! Defines the `ToolHandler` async trait and the registry the agent uses to
//! look tools up by the name the LLM emits.

pub mod contact;
pub mod schedule;
pub mod search;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolError;

/// A capability the agent can invoke by name.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name the LLM uses in `Action:` lines.
    fn name(&self) -> &'static str;

    /// One-line description shown to the LLM.
    fn description(&self) -> &'static str;

    /// Run the tool and return the observation text.
    async fn run(&self, input: &str) -> Result<String, ToolError>;
}

/// Tools keyed by name, kept in registration order for prompting.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn ToolHandler>>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) {
        let name = tool.name();
        if self.tools.insert(name, tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    /// `name: description` lines for the agent prompt.
    pub fn describe(&self) -> String {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn execute(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::info!(tool = name, input_len = input.len(), "Running tool");
        tool.run(input).await
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl ToolHandler for Echo {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "Repeats its input"
        }

        async fn run(&self, input: &str) -> Result<String, ToolError> {
            Ok(format!("{}:{}", self.0, input))
        }
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("A")));
        registry.register(Arc::new(Echo("B")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["A", "B"]);
        assert_eq!(registry.execute("B", "hi").await.unwrap(), "B:hi");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.execute("Nope", "").await,
            Err(ToolError::UnknownTool(name)) if name == "Nope"
        ));
    }

    #[test]
    fn test_reregister_keeps_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("A")));
        registry.register(Arc::new(Echo("B")));
        registry.register(Arc::new(Echo("A")));
        assert_eq!(registry.names(), vec!["A", "B"]);
    }

    #[test]
    fn test_describe() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("A")));
        assert_eq!(registry.describe(), "A: Repeats its input");
    }
}
