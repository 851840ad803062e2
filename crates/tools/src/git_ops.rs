//! Git tool: a fixed set of git subcommands run without a shell.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use termpilot_core::error::ToolError;
use termpilot_core::tool::{Tool, ToolArguments, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::args::{optional_str, required_str, truncate_output};

pub const OPERATIONS: &[&str] = &[
    "status", "diff", "log", "add", "commit", "branch", "checkout", "stash", "show",
];
const MAX_OUTPUT_CHARS: usize = 15_000;

#[derive(Debug, Clone)]
pub struct GitOpsTool {
    timeout_secs: u64,
    working_dir: Option<PathBuf>,
}

impl GitOpsTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            working_dir: None,
        }
    }

    /// Run git in `dir` instead of the process working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl Default for GitOpsTool {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Split an argument string the way a POSIX shell would, without expanding anything.
pub(crate) fn split_args(input: &str) -> Result<Vec<String>, ToolError> {
    shell_words::split(input)
        .map_err(|e| ToolError::InvalidArguments(format!("Cannot parse 'args': {e}")))
}

fn is_force_push(args: &[String]) -> bool {
    args.iter().any(|a| a == "push")
        && args
            .iter()
            .any(|a| a == "-f" || a.starts_with("--force"))
}

#[async_trait]
impl Tool for GitOpsTool {
    fn name(&self) -> &str {
        "git_ops"
    }

    fn description(&self) -> &str {
        "Perform git operations: status, diff, log, add, commit, branch, checkout, \
         stash, show. Runs git in the current working directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": OPERATIONS,
                    "description": "The git operation to perform."
                },
                "args": {
                    "type": "string",
                    "description": "Additional arguments, e.g. '-m \"commit message\"' for commit, \
                                    file paths for add, branch name for checkout."
                }
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, arguments: ToolArguments) -> Result<ToolResult, ToolError> {
        let operation = required_str(&arguments, "operation")?;
        if !OPERATIONS.contains(&operation) {
            return Err(ToolError::InvalidArguments(format!(
                "Unsupported git operation '{operation}'. Expected one of: {}",
                OPERATIONS.join(", ")
            )));
        }

        let raw_args = optional_str(&arguments, "args").unwrap_or("");
        let extra = split_args(raw_args)?;
        if is_force_push(&extra) {
            warn!(args = raw_args, "Refusing force push");
            return Err(ToolError::PermissionDenied(
                "Force push is blocked. Use the terminal tool directly if you really need this."
                    .into(),
            ));
        }

        let shown = if raw_args.trim().is_empty() {
            format!("git {operation}")
        } else {
            format!("git {operation} {}", raw_args.trim())
        };
        debug!(command = %shown, "Running git");

        let mut command = Command::new("git");
        command.arg(operation).args(&extra).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            command.output(),
        )
        .await
        {
            Ok(result) => result.map_err(|e| ToolError::ExecutionFailed {
                tool_name: "git_ops".into(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                return Err(ToolError::Timeout {
                    tool_name: "git_ops".into(),
                    timeout_secs: self.timeout_secs,
                });
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let body = combined.trim();
        let body = if body.is_empty() { "(no output)" } else { body };
        let text = format!(
            "$ {shown}\n{}",
            truncate_output(body.to_string(), MAX_OUTPUT_CHARS)
        );

        if output.status.success() {
            Ok(ToolResult::success(text))
        } else {
            Ok(ToolResult::error(text))
        }
    }
}
