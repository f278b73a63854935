//! Shell tool: execute system commands.
//!
//! Runs the command through `sh -c` (`cmd /C` on Windows) with a timeout.
//! A command that outlives its timeout is killed.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tinyagent_core::error::ToolError;
use tinyagent_core::message::ToolInput;
use tinyagent_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::args::{optional_duration, required_str};

/// Execute shell commands.
pub struct ShellTool {
    /// Used when the model does not pass `timeout`.
    default_timeout_secs: u64,
}

impl ShellTool {
    pub fn new(default_timeout_secs: u64) -> Self {
        Self {
            default_timeout_secs,
        }
    }

    fn command(cmd: &str) -> Command {
        let mut command = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", cmd]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", cmd]);
            c
        };
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new(30)
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its combined stdout/stderr. Use this for running programs, inspecting the system, git operations, etc."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "cmd": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "timeout": {
                    "type": "number",
                    "description": "Timeout in seconds",
                    "default": self.default_timeout_secs
                }
            },
            "required": ["cmd"]
        })
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        let cmd = required_str(&input, "cmd")?;
        let timeout = optional_duration(&input, "timeout")?
            .unwrap_or(Duration::from_secs(self.default_timeout_secs));
        let timeout_secs = timeout.as_secs_f64();

        debug!(command = %cmd, timeout_secs, "Executing shell command");

        let child = match Self::command(cmd).spawn() {
            Ok(child) => child,
            Err(e) => return Ok(ToolResult::err(format!("Failed to start command: {e}"))),
        };

        // Dropping the timed-out future drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(ToolResult::err(format!("Command failed: {e}"))),
            Err(_) => {
                warn!(command = %cmd, timeout_secs, "Command timed out");
                return Ok(ToolResult::err(format!(
                    "Command timed out after {timeout_secs}s"
                )));
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        let text = text.trim();

        if output.status.success() {
            Ok(ToolResult::ok(text))
        } else {
            let code = output.status.code().unwrap_or(-1);
            warn!(command = %cmd, exit_code = code, "Command failed");
            Ok(ToolResult::err(
                format!("[exit code: {code}]\n{text}").trim_end().to_string(),
            ))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolInput {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn execute_echo() {
        let tool = ShellTool::default();
        let result = tool.execute(args(json!({"cmd": "echo hello"}))).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn stderr_is_captured() {
        let tool = ShellTool::default();
        let result = tool
            .execute(args(json!({"cmd": "echo out; echo err 1>&2"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.content(), "out\nerr");
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let tool = ShellTool::default();
        let result = tool
            .execute(args(json!({"cmd": "echo nope; exit 3"})))
            .await
            .unwrap();
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("[exit code: 3]"));
        assert!(error.contains("nope"));
    }

    #[tokio::test]
    async fn timeout_kills_command() {
        let tool = ShellTool::default();
        let started = std::time::Instant::now();
        let result = tool
            .execute(args(json!({"cmd": "sleep 5", "timeout": 0.2})))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Command timed out after 0.2s"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn oversized_timeout_is_rejected_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let tool = ShellTool::default();

        let result = tool
            .execute(args(json!({
                "cmd": format!("touch {}", marker.display()),
                "timeout": 1e20
            })))
            .await;

        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn missing_cmd_argument() {
        let tool = ShellTool::default();
        let result = tool.execute(ToolInput::new()).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn schema_advertises_default_timeout() {
        let schema = ShellTool::new(45).parameters_schema();
        assert_eq!(schema["properties"]["timeout"]["default"], 45);
        assert_eq!(schema["required"], json!(["cmd"]));
    }
}
