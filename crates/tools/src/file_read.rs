//! File read tool: numbered file contents with optional line window.

use async_trait::async_trait;
use termpilot_core::error::ToolError;
use termpilot_core::tool::{Tool, ToolArguments, ToolResult};

use crate::args::{optional_u64, required_str, resolve_path};

#[derive(Debug, Default)]
pub struct FileReadTool;

impl FileReadTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Returns the file text with line numbers. \
         Use this before editing a file to understand its contents."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the file to read."
                },
                "offset": {
                    "type": "integer",
                    "description": "Line number to start reading from (1-based). Optional."
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to read. Optional."
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: ToolArguments) -> Result<ToolResult, ToolError> {
        let path = resolve_path(required_str(&arguments, "path")?);
        let offset = optional_u64(&arguments, "offset").unwrap_or(1).max(1) as usize;
        let limit = optional_u64(&arguments, "limit").unwrap_or(0) as usize;

        if !path.exists() {
            return Ok(ToolResult::error(format!("Error: File not found: {}", path.display())));
        }
        if !path.is_file() {
            return Ok(ToolResult::error(format!("Error: Not a file: {}", path.display())));
        }

        let bytes = tokio::fs::read(&path).await?;
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text.lines().collect();

        let start = (offset - 1).min(lines.len());
        let end = if limit > 0 {
            start.saturating_add(limit).min(lines.len())
        } else {
            lines.len()
        };

        let mut output = format!("File: {} ({} lines total)", path.display(), lines.len());
        for (i, line) in lines[start..end].iter().enumerate() {
            output.push_str(&format!("\n{:>5}\t{line}", start + i + 1));
        }

        Ok(ToolResult::success(output))
    }
}
