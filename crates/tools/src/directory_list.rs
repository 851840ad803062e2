//! Directory listing tool: a sorted, optionally recursive view of a directory.

use std::path::Path;

use async_trait::async_trait;
use termpilot_core::error::ToolError;
use termpilot_core::tool::{Tool, ToolArguments, ToolResult};

use crate::args::{optional_bool, optional_str, resolve_path};

const MAX_DEPTH: usize = 3;

#[derive(Debug, Default)]
pub struct DirectoryListTool;

impl DirectoryListTool {
    pub fn new() -> Self {
        Self
    }
}

/// Render a byte count as `512B`, `1.2KB`, `3.4MB`, ...
pub(crate) fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut size = bytes as f64 / 1024.0;
    for unit in ["KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1}{unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1}TB")
}

/// Append the entries of `dir` to `out`, directories first, names compared case-insensitively.
fn walk(dir: &Path, depth: usize, recursive: bool, out: &mut Vec<String>) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| {
        let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
        (!is_dir, e.file_name().to_string_lossy().to_lowercase())
    });

    let indent = "  ".repeat(depth);
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if depth == 0 && name.starts_with('.') {
            continue;
        }

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            out.push(format!("{indent}{name}/"));
            if recursive && depth + 1 < MAX_DEPTH {
                // Unreadable subdirectories are listed but not descended into.
                let _ = walk(&entry.path(), depth + 1, recursive, out);
            }
        } else {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            out.push(format!("{indent}{name}  ({})", human_size(size)));
        }
    }
    Ok(())
}

#[async_trait]
impl Tool for DirectoryListTool {
    fn name(&self) -> &str {
        "directory_list"
    }

    fn description(&self) -> &str {
        "List files and directories at a given path. Shows file sizes and \
         directory structure. Use recursive=true to see nested contents."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path to list. Defaults to the current directory."
                },
                "recursive": {
                    "type": "boolean",
                    "description": "List nested directories too (up to 3 levels deep). Default false."
                }
            }
        })
    }

    async fn execute(&self, arguments: ToolArguments) -> Result<ToolResult, ToolError> {
        let path = resolve_path(optional_str(&arguments, "path").unwrap_or("."));
        let recursive = optional_bool(&arguments, "recursive");

        if !path.exists() {
            return Ok(ToolResult::error(format!(
                "Error: Directory not found: {}",
                path.display()
            )));
        }
        if !path.is_dir() {
            return Ok(ToolResult::error(format!("Error: Not a directory: {}", path.display())));
        }

        let root = path.clone();
        let listing = tokio::task::spawn_blocking(move || {
            let mut lines = Vec::new();
            walk(&root, 0, recursive, &mut lines).map(|()| lines)
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: "directory_list".into(),
            reason: e.to_string(),
        })?;

        match listing {
            Ok(lines) if lines.is_empty() => Ok(ToolResult::success(format!(
                "Directory: {}\n(empty directory)",
                path.display()
            ))),
            Ok(lines) => Ok(ToolResult::success(format!(
                "Directory: {}\n\n{}",
                path.display(),
                lines.join("\n")
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Ok(ToolResult::error(
                format!("Error: Permission denied: {}", path.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
