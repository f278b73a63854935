//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Streaming via SSE when a text sink is attached

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tinyagent_core::error::ProviderError;
use tinyagent_core::message::{Content, ContentBlock, Message, Role};
use tinyagent_core::provider::{CompletionResponse, Provider, ToolDefinition, Usage};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace, warn};

use crate::sse::SseParser;
use crate::stream::{StreamAssembler, StreamEvent};

const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Everything the provider needs, passed in explicitly.
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub request_timeout: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: reqwest::Client,
    /// When set, requests stream and text deltas are forwarded here.
    text_sink: Option<UnboundedSender<String>>,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(mut config: AnthropicConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Anthropic API key is empty".into(),
            ));
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            text_sink: None,
        })
    }

    /// Stream completions, forwarding text deltas to `sink` as they arrive.
    ///
    /// Deltas are sent per attempt. Behind [`crate::RetryProvider`], an
    /// attempt interrupted mid-stream has already sent its partial text, and
    /// the retried attempt sends its text again from the start.
    pub fn with_text_sink(mut self, sink: UnboundedSender<String>) -> Self {
        self.text_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    pub fn is_streaming(&self) -> bool {
        self.text_sink.is_some()
    }

    /// Extract system messages from the message list.
    /// Anthropic puts system prompt as a top-level field, not in messages.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<String> = Vec::new();
        let mut non_system: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(msg.content.text()),
                _ => non_system.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, non_system)
    }

    /// Convert messages to Anthropic API format.
    ///
    /// Tool results travel as `tool_result` blocks in a user message; a run of
    /// consecutive tool messages becomes one user message.
    fn to_api_messages(messages: &[&Message]) -> Vec<AnthropicMessage> {
        let mut result: Vec<AnthropicMessage> = Vec::new();
        let mut pending_results: Vec<ContentBlock> = Vec::new();

        let flush_results = |result: &mut Vec<AnthropicMessage>, pending: &mut Vec<ContentBlock>| {
            if !pending.is_empty() {
                result.push(AnthropicMessage {
                    role: "user".into(),
                    content: AnthropicContent::Blocks(std::mem::take(pending)),
                });
            }
        };

        for msg in messages {
            match msg.role {
                Role::Tool => {
                    pending_results.extend(
                        msg.content
                            .blocks()
                            .into_iter()
                            .filter(|b| matches!(b, ContentBlock::ToolResult { .. })),
                    );
                }
                Role::User => {
                    flush_results(&mut result, &mut pending_results);
                    result.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::from(&msg.content),
                    });
                }
                Role::Assistant => {
                    flush_results(&mut result, &mut pending_results);
                    let blocks: Vec<ContentBlock> = msg
                        .content
                        .blocks()
                        .into_iter()
                        .filter(|b| !matches!(b, ContentBlock::Text { text } if text.is_empty()))
                        .collect();
                    // The API rejects empty assistant turns
                    if blocks.is_empty() {
                        continue;
                    }
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
                Role::System => {} // handled separately
            }
        }
        flush_results(&mut result, &mut pending_results);

        result
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    }

    fn build_body(&self, messages: &[Message], tools: &[ToolDefinition]) -> serde_json::Value {
        let (system, messages) = Self::extract_system(messages);
        let api_messages = Self::to_api_messages(&messages);

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": api_messages,
            "max_tokens": self.config.max_tokens,
        });

        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        if let Some(temperature) = self.config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if self.is_streaming() {
            body["stream"] = serde_json::json!(true);
        }

        body
    }

    /// Send the request and map non-success statuses to provider errors.
    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/v1/messages", self.config.base_url);

        let mut request = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json");
        if self.is_streaming() {
            request = request.header("Accept", "text/event-stream");
        }

        let response = request.json(body).send().await.map_err(map_transport_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }

    async fn read_stream(
        &self,
        response: reqwest::Response,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut assembler = StreamAssembler::new();
        if let Some(sink) = &self.text_sink {
            assembler = assembler.with_text_sink(sink.clone());
        }

        let mut parser = SseParser::new();
        let mut byte_stream = response.bytes_stream();

        'stream: while let Some(chunk) = byte_stream.next().await {
            let bytes = chunk.map_err(|e| ProviderError::StreamInterrupted(e.to_string()))?;
            for frame in parser.push(&bytes) {
                if let Some(event) = StreamEvent::from_frame(&frame)
                    && assembler.apply(event)?
                {
                    break 'stream;
                }
            }
        }

        if !assembler.is_finished() {
            if let Some(event) = parser.finish().as_ref().and_then(StreamEvent::from_frame) {
                assembler.apply(event)?;
            }
            if !assembler.is_finished() {
                debug!("Stream ended without message_stop");
            }
        }

        Ok(assembler.into_response())
    }

    /// Convert an Anthropic API response into ordered content blocks.
    ///
    /// Block types other than text and tool_use are skipped, and empty text
    /// blocks are dropped, matching what the stream assembler produces.
    fn parse_response(resp: AnthropicResponse) -> CompletionResponse {
        let content = resp
            .content
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ContentBlock>(raw) {
                Ok(ContentBlock::Text { text }) if text.is_empty() => None,
                Ok(block @ (ContentBlock::Text { .. } | ContentBlock::ToolUse { .. })) => {
                    Some(block)
                }
                Ok(_) => None,
                Err(e) => {
                    trace!(error = %e, "Skipping unsupported content block");
                    None
                }
            })
            .collect();

        CompletionResponse {
            content,
            usage: resp.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
            stop_reason: resp.stop_reason,
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let body = self.build_body(messages, tools);

        debug!(
            provider = "anthropic",
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            streaming = self.is_streaming(),
            "Sending completion request"
        );

        let response = self.send(&body).await?;

        if self.is_streaming() {
            return self.read_stream(response).await;
        }

        let api_resp: AnthropicResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        Ok(Self::parse_response(api_resp))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl From<&Content> for AnthropicContent {
    fn from(content: &Content) -> Self {
        match content {
            Content::Text(text) => Self::Text(text.clone()),
            Content::Blocks(blocks) => Self::Blocks(blocks.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<serde_json::Value>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
