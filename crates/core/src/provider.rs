//! Provider trait: the abstraction over completion backends.
//!
//! A Provider takes the ordered conversation plus the exported tool schemas
//! and answers with an ordered list of content blocks. Whether the backend
//! streamed the answer or returned it in one piece is invisible here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{ContentBlock, Message};

/// A tool descriptor sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// One completion: the model's answer to the submitted conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Ordered content blocks (text and tool-use requests)
    pub content: Vec<ContentBlock>,

    /// Token usage, when the backend reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Why the model stopped, when the backend reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl CompletionResponse {
    /// A response holding only the given blocks.
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            usage: None,
            stop_reason: None,
        }
    }

    /// Whether any block asks for a tool invocation.
    pub fn has_tool_use(&self) -> bool {
        self.content.iter().any(ContentBlock::is_tool_use)
    }
}

/// The core Provider trait.
///
/// Every completion backend implements this single method. The agent loop
/// depends on nothing else, so decorators (retry) and test doubles slot in
/// freely.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send the conversation and available tools, get a complete response.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}
