//! File edit tool: exact string replacement inside an existing file.

use async_trait::async_trait;
use termpilot_core::error::ToolError;
use termpilot_core::tool::{Tool, ToolArguments, ToolResult};

use crate::args::{optional_bool, required_str, resolve_path};

#[derive(Debug, Default)]
pub struct FileEditTool;

impl FileEditTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FileEditTool {
    fn name(&self) -> &str {
        "file_edit"
    }

    fn description(&self) -> &str {
        "Edit a file by replacing an exact string match with new content. \
         The old_string must match exactly (including whitespace and indentation). \
         Read the file first to get the exact text to replace."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to edit."
                },
                "old_string": {
                    "type": "string",
                    "description": "The exact text to find and replace."
                },
                "new_string": {
                    "type": "string",
                    "description": "The replacement text."
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace all occurrences instead of requiring a unique match. Default false."
                }
            },
            "required": ["path", "old_string", "new_string"]
        })
    }

    async fn execute(&self, arguments: ToolArguments) -> Result<ToolResult, ToolError> {
        let path = resolve_path(required_str(&arguments, "path")?);
        let old_string = required_str(&arguments, "old_string")?;
        let new_string = required_str(&arguments, "new_string")?;
        let replace_all = optional_bool(&arguments, "replace_all");

        if old_string.is_empty() {
            return Err(ToolError::InvalidArguments("'old_string' must not be empty".into()));
        }
        if !path.is_file() {
            return Ok(ToolResult::error(format!("Error: File not found: {}", path.display())));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let count = content.matches(old_string).count();

        if count == 0 {
            return Ok(ToolResult::error(
                "Error: old_string not found in file. Read the file first to get the exact text.",
            ));
        }
        if count > 1 && !replace_all {
            return Ok(ToolResult::error(format!(
                "Error: old_string found {count} times. Set replace_all=true or provide more \
                 context to make it unique."
            )));
        }

        let (updated, replaced) = if replace_all {
            (content.replace(old_string, new_string), count)
        } else {
            (content.replacen(old_string, new_string, 1), 1)
        };

        tokio::fs::write(&path, updated).await?;

        Ok(ToolResult::success(format!(
            "Replaced {replaced} occurrence(s) in {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::test_args;

    async fn edit(path: &std::path::Path, extra: serde_json::Value) -> ToolResult {
        let mut args = test_args(extra);
        args.insert("path".into(), path.to_str().unwrap().into());
        FileEditTool::new().execute(args).await.unwrap()
    }

    #[tokio::test]
    async fn unique_match_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.rs");
        std::fs::write(&file, "fn main() {\n    println!(\"hi\");\n}\n").unwrap();

        let result = edit(
            &file,
            serde_json::json!({"old_string": "\"hi\"", "new_string": "\"hello\""}),
        )
        .await;

        assert!(!result.is_error);
        assert!(result.content.starts_with("Replaced 1 occurrence(s) in "));
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "fn main() {\n    println!(\"hello\");\n}\n"
        );
    }

    #[tokio::test]
    async fn missing_match_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "alpha").unwrap();

        let result = edit(&file, serde_json::json!({"old_string": "beta", "new_string": "x"})).await;

        assert!(result.is_error);
        assert!(result.content.contains("old_string not found"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "alpha");
    }

    #[tokio::test]
    async fn ambiguous_match_requires_replace_all() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x = 1\nx = 1\n").unwrap();

        let result = edit(&file, serde_json::json!({"old_string": "x = 1", "new_string": "y"})).await;
        assert!(result.is_error);
        assert!(result.content.contains("found 2 times"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x = 1\nx = 1\n");

        let result = edit(
            &file,
            serde_json::json!({"old_string": "x = 1", "new_string": "y", "replace_all": true}),
        )
        .await;
        assert!(!result.is_error);
        assert!(result.content.starts_with("Replaced 2 occurrence(s)"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "y\ny\n");
    }

    #[tokio::test]
    async fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = edit(
            &dir.path().join("nope.txt"),
            serde_json::json!({"old_string": "a", "new_string": "b"}),
        )
        .await;
        assert!(result.is_error);
        assert!(result.content.starts_with("Error: File not found"));
    }

    #[tokio::test]
    async fn missing_new_string_argument() {
        let result = FileEditTool::new()
            .execute(test_args(serde_json::json!({"path": "a.txt", "old_string": "a"})))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
