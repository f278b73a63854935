//! Argument extraction shared by the native tools.
//!
//! Missing or mistyped required arguments are `ToolError::InvalidArguments`;
//! optional arguments fall back to their default when absent or mistyped.

use std::time::Duration;
use tinyagent_core::error::ToolError;
use tinyagent_core::message::ToolInput;

pub(crate) fn required_str<'a>(input: &'a ToolInput, key: &str) -> Result<&'a str, ToolError> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

pub(crate) fn optional_bool(input: &ToolInput, key: &str) -> bool {
    input.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub(crate) fn optional_usize(input: &ToolInput, key: &str) -> Option<usize> {
    input.get(key).and_then(|v| v.as_u64()).map(|n| n as usize)
}

/// Positive number of seconds, integer or fractional. A number that is not
/// a usable duration is `InvalidArguments` rather than a silent default.
pub(crate) fn optional_duration(
    input: &ToolInput,
    key: &str,
) -> Result<Option<Duration>, ToolError> {
    let Some(secs) = input.get(key).and_then(|v| v.as_f64()) else {
        return Ok(None);
    };
    if secs <= 0.0 {
        return Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a positive number of seconds, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs).map(Some).map_err(|_| {
        ToolError::InvalidArguments(format!("'{key}' is out of range: {secs}"))
    })
}
