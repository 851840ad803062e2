//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act on the workspace:
//! read and edit files, search code, run shell and git commands.
//!
//! The [`ToolRegistry`] is the failure boundary: whatever a tool does
//! (return an error, panic), the registry hands back a [`ToolResult`].

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::message::ToolCall;
use crate::provider::ToolDefinition;

/// Tool arguments: a JSON object keyed by parameter name.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for (empty until bound to a call)
    #[serde(default)]
    pub call_id: String,

    /// The output text, including error text on failure
    pub content: String,

    /// Whether the tool failed
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            content: content.into(),
            is_error: true,
        }
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = call_id.into();
        self
    }
}

/// The core Tool trait.
///
/// Each tool (file_read, terminal, git_ops, etc.) implements this trait.
/// Tools are registered in the ToolRegistry and made available to the
/// agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "terminal", "file_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: ToolArguments) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, in registration order.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Look up and execute tools when the LLM requests them
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => {
                tracing::debug!(tool = tool.name(), "Replacing registered tool");
                self.tools[index] = tool;
            }
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name. Never fails: every failure becomes an error result.
    pub async fn execute(&self, name: &str, arguments: ToolArguments) -> ToolResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return ToolResult::error(format!("Error: Unknown tool '{name}'"));
        };

        match AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await {
            Ok(Ok(result)) => {
                if result.is_error {
                    tracing::warn!(tool = name, "Tool reported an error");
                }
                result
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = name, error = %e, "Tool execution failed");
                ToolResult::error(format!("Error executing {name}: {e}"))
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::warn!(tool = name, panic = %reason, "Tool panicked");
                ToolResult::error(format!("Error executing {name}: {reason}"))
            }
        }
    }

    /// Execute a tool call and bind the result to its call id.
    pub async fn execute_call(&self, call: &ToolCall) -> ToolResult {
        self.execute(&call.name, call.arguments.clone())
            .await
            .with_call_id(call.id.clone())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
