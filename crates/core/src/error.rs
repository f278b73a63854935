//! Error types for the TinyAgent domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Only provider failures
//! (after retries are exhausted) and the optional turn limit ever escape a
//! run; tool failures are folded into the transcript instead.

use thiserror::Error;

/// The top-level error type for all TinyAgent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Orchestration guard ---
    #[error("Turn limit exceeded: no final answer after {max_turns} completions")]
    TurnLimitExceeded { max_turns: u32 },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Every attempt failed; wraps the error from the final attempt.
    #[error("Provider call failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// The error from the final attempt, looking through `RetriesExhausted`.
    pub fn last_error(&self) -> &ProviderError {
        match self {
            ProviderError::RetriesExhausted { source, .. } => source.last_error(),
            other => other,
        }
    }
}

/// Failures of a single tool invocation.
///
/// Tools only return `InvalidArguments`; dispatch raises the others. All of
/// them end up as the text of a failed `ToolResult`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool '{tool_name}' timed out after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: f64 },

    #[error("Tool '{tool_name}' panicked: {message}")]
    Panicked { tool_name: String, message: String },
}
