//! Streaming response assembly.
//!
//! A streamed completion arrives as a sequence of low-level events. The
//! [`StreamAssembler`] folds them into the same `ContentBlock` sequence a
//! non-streaming call returns, forwarding text deltas to an optional sink
//! as they arrive.

use tinyagent_core::error::ProviderError;
use tinyagent_core::message::{ContentBlock, ToolInput};
use tinyagent_core::provider::{CompletionResponse, Usage};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::sse::SseFrame;

/// The event vocabulary the assembler understands.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextBlockStart,
    ToolUseBlockStart { id: String, name: String },
    TextDelta(String),
    InputJsonDelta(String),
    BlockStop,
    MessageStop,
    /// Token counts and stop reason reported around the content.
    Metadata {
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
        stop_reason: Option<String>,
    },
    /// The server aborted the stream.
    Error(String),
}

impl StreamEvent {
    /// Decode one SSE frame. Frames outside the vocabulary (ping, thinking
    /// blocks, unparseable data) yield `None`.
    pub fn from_frame(frame: &SseFrame) -> Option<Self> {
        let data: serde_json::Value = match serde_json::from_str(&frame.data) {
            Ok(v) => v,
            Err(e) => {
                trace!(error = %e, data = %frame.data, "Ignoring unparseable SSE data");
                serde_json::Value::Null
            }
        };

        let kind = data["type"]
            .as_str()
            .or(frame.event.as_deref())
            .unwrap_or("");

        match kind {
            "content_block_start" => {
                let block = &data["content_block"];
                match block["type"].as_str() {
                    Some("text") => Some(Self::TextBlockStart),
                    Some("tool_use") => Some(Self::ToolUseBlockStart {
                        id: block["id"].as_str().unwrap_or_default().to_string(),
                        name: block["name"].as_str().unwrap_or_default().to_string(),
                    }),
                    _ => None,
                }
            }
            "content_block_delta" => {
                let delta = &data["delta"];
                match delta["type"].as_str() {
                    Some("text_delta") => delta["text"]
                        .as_str()
                        .map(|text| Self::TextDelta(text.to_string())),
                    Some("input_json_delta") => delta["partial_json"]
                        .as_str()
                        .map(|partial| Self::InputJsonDelta(partial.to_string())),
                    _ => None,
                }
            }
            "content_block_stop" => Some(Self::BlockStop),
            "message_stop" => Some(Self::MessageStop),
            "message_start" => {
                let usage = &data["message"]["usage"];
                Some(Self::Metadata {
                    input_tokens: usage["input_tokens"].as_u64().map(|n| n as u32),
                    output_tokens: usage["output_tokens"].as_u64().map(|n| n as u32),
                    stop_reason: None,
                })
            }
            "message_delta" => Some(Self::Metadata {
                input_tokens: None,
                output_tokens: data["usage"]["output_tokens"].as_u64().map(|n| n as u32),
                stop_reason: data["delta"]["stop_reason"].as_str().map(str::to_string),
            }),
            "error" => {
                let message = data["error"]["message"]
                    .as_str()
                    .unwrap_or("stream error")
                    .to_string();
                Some(Self::Error(message))
            }
            other => {
                trace!(event = %other, "Ignoring SSE event");
                None
            }
        }
    }
}

/// Where the assembler currently is inside a content block.
#[derive(Debug, Clone, Default, PartialEq)]
enum AssemblyState {
    #[default]
    Idle,
    AccumulatingText {
        buffer: String,
    },
    AccumulatingToolInput {
        id: String,
        name: String,
        partial_json: String,
    },
}

/// Folds stream events into ordered content blocks.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    state: AssemblyState,
    blocks: Vec<ContentBlock>,
    text_sink: Option<UnboundedSender<String>>,
    usage: Option<Usage>,
    stop_reason: Option<String>,
    finished: bool,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every text delta to `sink` as soon as it is seen.
    pub fn with_text_sink(mut self, sink: UnboundedSender<String>) -> Self {
        self.text_sink = Some(sink);
        self
    }

    /// Whether a `MessageStop` has been applied.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one event. Returns `Ok(true)` once the message is complete;
    /// further events are ignored after that.
    pub fn apply(&mut self, event: StreamEvent) -> Result<bool, ProviderError> {
        if self.finished {
            return Ok(true);
        }

        match event {
            StreamEvent::TextBlockStart => {
                self.flush();
                self.state = AssemblyState::AccumulatingText {
                    buffer: String::new(),
                };
            }
            StreamEvent::ToolUseBlockStart { id, name } => {
                self.flush();
                self.state = AssemblyState::AccumulatingToolInput {
                    id,
                    name,
                    partial_json: String::new(),
                };
            }
            StreamEvent::TextDelta(delta) => match &mut self.state {
                AssemblyState::AccumulatingText { buffer } => {
                    if let Some(sink) = &self.text_sink {
                        // A dropped receiver only loses the live echo.
                        let _ = sink.send(delta.clone());
                    }
                    buffer.push_str(&delta);
                }
                _ => trace!("Text delta outside a text block"),
            },
            StreamEvent::InputJsonDelta(fragment) => match &mut self.state {
                AssemblyState::AccumulatingToolInput { partial_json, .. } => {
                    partial_json.push_str(&fragment);
                }
                _ => trace!("Input delta outside a tool-use block"),
            },
            StreamEvent::BlockStop => self.flush(),
            StreamEvent::MessageStop => {
                if self.state != AssemblyState::Idle {
                    debug!("Message stopped with an open block; discarding it");
                }
                self.state = AssemblyState::Idle;
                self.finished = true;
            }
            StreamEvent::Metadata {
                input_tokens,
                output_tokens,
                stop_reason,
            } => {
                let usage = self.usage.get_or_insert_with(Usage::default);
                if let Some(n) = input_tokens {
                    usage.input_tokens = n;
                }
                if let Some(n) = output_tokens {
                    usage.output_tokens = n;
                }
                if stop_reason.is_some() {
                    self.stop_reason = stop_reason;
                }
            }
            StreamEvent::Error(message) => {
                return Err(ProviderError::StreamInterrupted(message));
            }
        }

        Ok(self.finished)
    }

    /// The blocks emitted so far, in the order their blocks started.
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    /// Finish assembly. An unterminated open block is discarded.
    pub fn into_response(self) -> CompletionResponse {
        CompletionResponse {
            content: self.blocks,
            usage: self.usage,
            stop_reason: self.stop_reason,
        }
    }

    /// Close the open block, emitting it if it carries anything.
    fn flush(&mut self) {
        match std::mem::take(&mut self.state) {
            AssemblyState::Idle => {}
            AssemblyState::AccumulatingText { buffer } => {
                if !buffer.is_empty() {
                    self.blocks.push(ContentBlock::text(buffer));
                }
            }
            AssemblyState::AccumulatingToolInput {
                id,
                name,
                partial_json,
            } => {
                let input = parse_tool_input(&partial_json);
                self.blocks.push(ContentBlock::tool_use(id, name, input));
            }
        }
    }
}

/// Parse accumulated tool input. Empty, malformed, or non-object JSON
/// degrades to an empty map.
fn parse_tool_input(raw: &str) -> ToolInput {
    if raw.trim().is_empty() {
        return ToolInput::new();
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            debug!(input = %other, "Tool input is not an object; using empty input");
            ToolInput::new()
        }
        Err(e) => {
            debug!(error = %e, "Unparseable tool input; using empty input");
            ToolInput::new()
        }
    }
}
