//! Concurrent tool dispatch.
//!
//! Every tool-use block of one completion becomes a future; the batch is
//! joined, never raced. Each invocation is isolated: unknown names, returned
//! errors, panics and timeouts all become a failed `ToolResult` for that
//! block alone.

use futures::FutureExt;
use futures::future::join_all;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tinyagent_core::error::ToolError;
use tinyagent_core::message::{ContentBlock, ToolInput};
use tinyagent_core::tool::{Tool, ToolRegistry, ToolResult};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::event::AgentEvent;

/// Reported for a tool-use block naming a tool the registry lacks.
pub const UNKNOWN_TOOL: &str = "unknown tool";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: ToolInput,
}

impl ToolCall {
    pub fn from_block(block: &ContentBlock) -> Option<Self> {
        match block {
            ContentBlock::ToolUse { id, name, input } => Some(Self {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            _ => None,
        }
    }
}

/// Run every call concurrently and wait for all of them.
///
/// Results come back in the order of `calls`, whatever order the tools
/// finished in.
pub async fn dispatch_batch(
    registry: &ToolRegistry,
    calls: &[ToolCall],
    timeout: Option<Duration>,
    events: Option<&UnboundedSender<AgentEvent>>,
) -> Vec<ToolResult> {
    debug!(count = calls.len(), "Dispatching tool batch");

    for call in calls {
        emit(
            events,
            AgentEvent::ToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            },
        );
    }

    join_all(calls.iter().map(|call| async move {
        let result = invoke(registry, call, timeout).await;
        emit(
            events,
            AgentEvent::ToolResult {
                id: call.id.clone(),
                name: call.name.clone(),
                result: result.clone(),
            },
        );
        result
    }))
    .await
}

async fn invoke(registry: &ToolRegistry, call: &ToolCall, timeout: Option<Duration>) -> ToolResult {
    let Some(tool) = registry.get(&call.name) else {
        warn!(tool = %call.name, id = %call.id, "Model requested an unknown tool");
        return ToolResult::err(UNKNOWN_TOOL);
    };

    match execute_guarded(tool, call, timeout).await {
        Ok(result) => {
            if !result.success {
                debug!(tool = %call.name, error = %result.content(), "Tool reported failure");
            }
            result
        }
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool execution failed");
            ToolResult::err(e.to_string())
        }
    }
}

/// Execute one tool, turning a panic or an expired deadline into a
/// `ToolError`.
async fn execute_guarded(
    tool: &dyn Tool,
    call: &ToolCall,
    timeout: Option<Duration>,
) -> Result<ToolResult, ToolError> {
    let execution = AssertUnwindSafe(tool.execute(call.input.clone())).catch_unwind();

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, execution)
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs: limit.as_secs_f64(),
            })?,
        None => execution.await,
    };

    outcome.unwrap_or_else(|payload| {
        Err(ToolError::Panicked {
            tool_name: call.name.clone(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn emit(events: Option<&UnboundedSender<AgentEvent>>, event: AgentEvent) {
    if let Some(sink) = events {
        // A closed receiver only stops observation.
        let _ = sink.send(event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
