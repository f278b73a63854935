//! Agent-level observer events.
//!
//! `AgentEvent`s report tool activity while a run is in flight. They are
//! sent over an unbounded channel and never awaited, so a slow or closed
//! receiver cannot hold up dispatch.

use serde::{Deserialize, Serialize};
use tinyagent_core::message::ToolInput;
use tinyagent_core::tool::ToolResult;

/// Events emitted by the agent while dispatching tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The agent is about to invoke a tool.
    ToolCall {
        id: String,
        name: String,
        input: ToolInput,
    },

    /// A tool invocation completed (successfully or not).
    ToolResult {
        id: String,
        name: String,
        result: ToolResult,
    },
}

impl AgentEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
        }
    }

    /// Correlation id of the tool-use block this event belongs to.
    pub fn id(&self) -> &str {
        match self {
            Self::ToolCall { id, .. } | Self::ToolResult { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_tool_call() {
        let mut input = ToolInput::new();
        input.insert("cmd".into(), serde_json::json!("ls"));
        let event = AgentEvent::ToolCall {
            id: "toolu_1".into(),
            name: "shell".into(),
            input,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call""#));
        assert!(json.contains(r#""name":"shell""#));
        assert_eq!(event.event_type(), "tool_call");
    }

    #[test]
    fn event_serialization_tool_result() {
        let event = AgentEvent::ToolResult {
            id: "toolu_1".into(),
            name: "shell".into(),
            result: ToolResult::err("boom"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_result""#));
        assert!(json.contains(r#""success":false"#));
        assert_eq!(event.id(), "toolu_1");
    }
}
