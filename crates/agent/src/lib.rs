//! The agent orchestration loop, the heart of TinyAgent.
//!
//! The agent follows a **request → dispatch → observe** cycle:
//!
//! 1. **Receive** an instruction from the caller
//! 2. **Send** the transcript and tool schemas to the provider
//! 3. **If tool calls**: run them concurrently, append results, go to step 2
//! 4. **If text only**: return the text to the caller
//!
//! The loop continues until the provider answers with no tool calls, or an
//! explicitly configured turn limit is reached.

pub mod dispatch;
pub mod event;
pub mod loop_runner;

pub use dispatch::{ToolCall, UNKNOWN_TOOL, dispatch_batch};
pub use event::AgentEvent;
pub use loop_runner::AgentLoop;
