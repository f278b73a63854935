//! File read tool: return the leading lines of a file.

use async_trait::async_trait;
use std::path::Path;
use tinyagent_core::error::ToolError;
use tinyagent_core::message::ToolInput;
use tinyagent_core::tool::{Tool, ToolResult};

use crate::args::{optional_usize, required_str};

pub struct ReadFileTool {
    default_line_limit: usize,
}

impl ReadFileTool {
    pub fn new(default_line_limit: usize) -> Self {
        Self { default_line_limit }
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// The first `limit` lines of `content`, line endings preserved.
fn leading_lines(content: &str, limit: usize) -> &str {
    if limit == 0 {
        return "";
    }
    match content.match_indices('\n').nth(limit - 1) {
        Some((idx, _)) => &content[..=idx],
        None => content,
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the given path, up to a line limit."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                },
                "line_limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to return",
                    "default": self.default_line_limit
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        let path = required_str(&input, "path")?;
        let line_limit = optional_usize(&input, "line_limit").unwrap_or(self.default_line_limit);

        if !Path::new(path).exists() {
            return Ok(ToolResult::err("File not found"));
        }

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(ToolResult::ok(leading_lines(&content, line_limit))),
            Err(e) => Ok(ToolResult::err(format!("Failed to read file: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn args(value: serde_json::Value) -> ToolInput {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn tool_definition() {
        let tool = ReadFileTool::default();
        assert_eq!(tool.name(), "read_file");
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], json!(["path"]));
        assert_eq!(schema["properties"]["line_limit"]["default"], 1000);
    }

    #[test]
    fn leading_lines_keeps_line_endings() {
        assert_eq!(leading_lines("a\nb\nc\n", 2), "a\nb\n");
        assert_eq!(leading_lines("a\nb", 5), "a\nb");
        assert_eq!(leading_lines("a\nb", 0), "");
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        let mut f = std::fs::File::create(&file_path).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let tool = ReadFileTool::default();
        let result = tool
            .execute(args(json!({"path": file_path.to_str().unwrap()})))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some("Hello, world!\n"));
    }

    #[tokio::test]
    async fn line_limit_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("lines.txt");
        std::fs::write(&file_path, "one\ntwo\nthree\nfour\n").unwrap();

        let tool = ReadFileTool::default();
        let result = tool
            .execute(args(json!({"path": file_path.to_str().unwrap(), "line_limit": 2})))
            .await
            .unwrap();
        assert_eq!(result.content(), "one\ntwo\n");
    }

    #[tokio::test]
    async fn read_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ReadFileTool::default();
        let result = tool
            .execute(args(json!({"path": dir.path().join("missing.txt").to_str().unwrap()})))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("File not found"));
    }

    #[tokio::test]
    async fn missing_path_argument() {
        let tool = ReadFileTool::default();
        let result = tool.execute(ToolInput::new()).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
