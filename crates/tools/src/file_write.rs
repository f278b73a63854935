//! File write tool: create, overwrite, or append to files.

use async_trait::async_trait;
use std::path::Path;
use tinyagent_core::error::ToolError;
use tinyagent_core::message::ToolInput;
use tinyagent_core::tool::{Tool, ToolResult};
use tokio::io::AsyncWriteExt;

use crate::args::{optional_bool, required_str};

#[derive(Default)]
pub struct WriteFileTool;

impl WriteFileTool {
    async fn write(path: &Path, content: &str, append: bool) -> std::io::Result<()> {
        if append {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await
        } else {
            tokio::fs::write(path, content).await
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file and parent directories if needed; overwrites unless append is set."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                },
                "append": {
                    "type": "boolean",
                    "description": "Append instead of overwriting",
                    "default": false
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        let path = required_str(&input, "path")?;
        let content = required_str(&input, "content")?;
        let append = optional_bool(&input, "append");

        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolResult::err(format!("Failed to create directory: {e}")));
        }

        match Self::write(Path::new(path), content, append).await {
            Ok(()) => {
                let verb = if append { "appended" } else { "wrote" };
                Ok(ToolResult::ok(format!(
                    "Successfully {verb} {} bytes to {path}",
                    content.len()
                )))
            }
            Err(e) => Ok(ToolResult::err(format!("Failed to write file: {e}"))),
        }
    }
}
