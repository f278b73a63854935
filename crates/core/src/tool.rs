//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! execute shell commands, read and edit files, and so on. The orchestrator
//! only sees the trait and the registry below.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::ToolError;
use crate::message::ToolInput;
use crate::provider::ToolDefinition;

/// The outcome of a tool execution.
///
/// `output` is populated on success and `error` on failure; either may be
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Output text on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Error text on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }

    /// The text reported back to the model: `output` on success, `error` on
    /// failure, empty when the relevant field is absent.
    pub fn content(&self) -> &str {
        let text = if self.success { &self.output } else { &self.error };
        text.as_deref().unwrap_or_default()
    }
}

/// The core Tool trait.
///
/// Each tool (shell, read_file, write_file, edit_file, ...) implements this
/// trait. Tools are registered in the [`ToolRegistry`] and dispatched by the
/// agent loop. Operational failures should come back as
/// `ToolResult { success: false, .. }`; a returned `ToolError` is converted
/// the same way by the dispatcher.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given named parameters.
    async fn execute(&self, input: ToolInput) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, keyed by name.
///
/// Schemas are exported in registration order. Registering a second tool
/// under an existing name replaces the first in place.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if name.is_empty() {
            warn!("Ignoring tool registration with an empty name");
            return;
        }

        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name. `None` means the model asked for an unknown tool.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&slot| self.tools[slot].as_ref())
    }

    /// One descriptor per registered tool, in registration order.
    pub fn export_schemas(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool {
        name: &'static str,
        description: &'static str,
    }

    impl EchoTool {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                description: "Echoes back the input",
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            self.description
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, input: ToolInput) -> std::result::Result<ToolResult, ToolError> {
            let text = input
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;
            Ok(ToolResult::ok(text))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::named("echo")));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_exports_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::named("zeta")));
        registry.register(Box::new(EchoTool::named("alpha")));
        registry.register(Box::new(EchoTool::named("mid")));

        let names: Vec<_> = registry.export_schemas().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.export_schemas()[0].parameters["type"], "object");
    }

    #[test]
    fn registry_last_write_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::named("echo")));
        registry.register(Box::new(EchoTool::named("other")));
        registry.register(Box::new(EchoTool {
            name: "echo",
            description: "Replacement",
        }));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("echo").unwrap().description(), "Replacement");
        assert_eq!(registry.names(), vec!["echo", "other"]);
    }

    #[test]
    fn registry_ignores_empty_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::named("")));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn tool_reports_invalid_arguments() {
        let tool = EchoTool::named("echo");
        let err = tool.execute(ToolInput::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn result_content_follows_success_flag() {
        assert_eq!(ToolResult::ok("hello").content(), "hello");
        assert_eq!(ToolResult::err("boom").content(), "boom");
        let bare = ToolResult {
            success: false,
            output: Some("ignored".into()),
            error: None,
        };
        assert_eq!(bare.content(), "");
    }
}
