//! # TinyAgent Core
//!
//! Domain types, traits, and error definitions for the TinyAgent
//! orchestration loop. This crate has **no runtime or HTTP dependencies**. It
//! defines the model that the provider, tool, and agent crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! The two seams of the loop are traits defined here:
//! - [`Provider`]: send the conversation plus tool schemas, receive content blocks
//! - [`Tool`]: a named, schema-described capability with an async `execute`
//!
//! Implementations live in their respective crates, so the orchestrator can be
//! driven by scripted providers and stub tools in tests.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Content, ContentBlock, Message, Role, ToolInput};
pub use provider::{CompletionResponse, Provider, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry, ToolResult};
