//! Terminal tool: run shell commands with a timeout.
//!
//! Commands run through `sh -c` (or `cmd /C` on Windows) in the current
//! working directory. A small set of destructive patterns is refused outright.

use std::time::Duration;

use async_trait::async_trait;
use termpilot_core::error::ToolError;
use termpilot_core::tool::{Tool, ToolArguments, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::args::{optional_u64, required_str, truncate_output};

const BLOCKED_PATTERNS: &[&str] = &["rm -rf /", "mkfs", "dd if=", ":(){:|:&};:"];
const MAX_OUTPUT_CHARS: usize = 20_000;

/// Execute shell commands with a capped timeout.
#[derive(Debug, Clone)]
pub struct TerminalTool {
    default_timeout_secs: u64,
    max_timeout_secs: u64,
}

impl TerminalTool {
    pub fn new(default_timeout_secs: u64, max_timeout_secs: u64) -> Self {
        Self {
            default_timeout_secs,
            max_timeout_secs,
        }
    }

    fn blocked_pattern(command: &str) -> Option<&'static str> {
        BLOCKED_PATTERNS.iter().copied().find(|p| command.contains(p))
    }

    fn effective_timeout(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_timeout_secs)
            .clamp(1, self.max_timeout_secs.max(1))
    }
}

impl Default for TerminalTool {
    fn default() -> Self {
        Self::new(60, 300)
    }
}

/// Assemble the tool output from a finished process.
fn format_output(exit_code: i32, stdout: &str, stderr: &str) -> String {
    let mut parts = Vec::new();
    if !stdout.is_empty() {
        parts.push(stdout.to_string());
    }
    if !stderr.is_empty() {
        parts.push(format!("[stderr]\n{stderr}"));
    }
    let body = parts.join("\n");
    let body = body.trim();
    let body = if body.is_empty() { "(no output)" } else { body };

    format!(
        "Exit code: {exit_code}\n{}",
        truncate_output(body.to_string(), MAX_OUTPUT_CHARS)
    )
}

#[async_trait]
impl Tool for TerminalTool {
    fn name(&self) -> &str {
        "terminal"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the terminal and return its output. \
         Use for running builds, tests, installing packages, etc. \
         Commands run in the current working directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute."
                },
                "timeout": {
                    "type": "integer",
                    "description": format!(
                        "Timeout in seconds. Default {}, at most {}.",
                        self.default_timeout_secs, self.max_timeout_secs
                    )
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: ToolArguments) -> Result<ToolResult, ToolError> {
        let command = required_str(&arguments, "command")?;

        if let Some(pattern) = Self::blocked_pattern(command) {
            warn!(command = %command, pattern, "Refusing blocked command");
            return Err(ToolError::PermissionDenied(format!(
                "Blocked dangerous command: {command}"
            )));
        }

        let timeout_secs = self.effective_timeout(optional_u64(&arguments, "timeout"));
        debug!(command = %command, timeout_secs, "Executing shell command");

        let mut process = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        process.kill_on_drop(true);

        let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), process.output())
            .await
        {
            Ok(result) => result.map_err(|e| ToolError::ExecutionFailed {
                tool_name: "terminal".into(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                warn!(command = %command, timeout_secs, "Command timed out");
                return Err(ToolError::Timeout {
                    tool_name: "terminal".into(),
                    timeout_secs,
                });
            }
        };

        let code = output.status.code().unwrap_or(-1);
        let text = format_output(
            code,
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        );

        if output.status.success() {
            Ok(ToolResult::success(text))
        } else {
            debug!(command = %command, exit_code = code, "Command exited with failure");
            Ok(ToolResult::error(text))
        }
    }
}
