//! File edit tool: find and replace within a file.

use async_trait::async_trait;
use std::path::Path;
use tinyagent_core::error::ToolError;
use tinyagent_core::message::ToolInput;
use tinyagent_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::args::{optional_bool, required_str};

#[derive(Default)]
pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Replace every occurrence of `find` with `replace` in a file and return the new content. With dry_run, the file is left untouched."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "The file to edit" },
                "find": { "type": "string", "description": "Exact text to search for" },
                "replace": { "type": "string", "description": "Replacement text" },
                "dry_run": {
                    "type": "boolean",
                    "description": "Return the edited content without writing it",
                    "default": false
                }
            },
            "required": ["path", "find", "replace"]
        })
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        let path = required_str(&input, "path")?;
        let find = required_str(&input, "find")?;
        let replace = required_str(&input, "replace")?;
        let dry_run = optional_bool(&input, "dry_run");

        if find.is_empty() {
            return Err(ToolError::InvalidArguments("'find' must not be empty".into()));
        }

        if !Path::new(path).exists() {
            return Ok(ToolResult::err("File not found"));
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => return Ok(ToolResult::err(format!("Failed to read file: {e}"))),
        };

        let occurrences = content.matches(find).count();
        if occurrences == 0 {
            return Ok(ToolResult::err(format!("Text to replace not found in {path}")));
        }

        let new_content = content.replace(find, replace);
        debug!(path = %path, occurrences, dry_run, "Editing file");

        if !dry_run && let Err(e) = tokio::fs::write(path, &new_content).await {
            return Ok(ToolResult::err(format!("Failed to write file: {e}")));
        }

        Ok(ToolResult::ok(new_content))
    }
}
