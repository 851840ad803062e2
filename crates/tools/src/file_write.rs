//! File write tool: create or overwrite files.

use async_trait::async_trait;
use termpilot_core::error::ToolError;
use termpilot_core::tool::{Tool, ToolArguments, ToolResult};

use crate::args::{required_str, resolve_path};

#[derive(Debug, Default)]
pub struct FileWriteTool;

impl FileWriteTool {
    pub fn new() -> Self {
        Self
    }
}

/// Number of lines `content` occupies, counting an unterminated last line.
fn line_count(content: &str) -> usize {
    let newlines = content.matches('\n').count();
    if !content.is_empty() && !content.ends_with('\n') {
        newlines + 1
    } else {
        newlines
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file (and parent directories) if it \
         does not exist, or overwrites if it does. Use file_edit for surgical changes."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to write."
                },
                "content": {
                    "type": "string",
                    "description": "The full content to write to the file."
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: ToolArguments) -> Result<ToolResult, ToolError> {
        let path = resolve_path(required_str(&arguments, "path")?);
        let content = required_str(&arguments, "content")?;

        if let Some(parent) = path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolResult::error(format!("Error: Failed to create directory: {e}")));
        }

        match tokio::fs::write(&path, content).await {
            Ok(()) => Ok(ToolResult::success(format!(
                "Written {} lines to {}",
                line_count(content),
                path.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Ok(ToolResult::error(
                format!("Error: Permission denied: {}", path.display()),
            )),
            Err(e) => Ok(ToolResult::error(format!("Error writing file: {e}"))),
        }
    }
}
