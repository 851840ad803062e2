//! Offline demo provider.
//!
//! Maps keywords in the latest user message onto tool calls so the whole
//! agent pipeline can be exercised without network access or an API key.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use termpilot_core::error::ProviderError;
use termpilot_core::message::{Message, Role, ToolCall};
use termpilot_core::provider::*;
use tracing::debug;

const PREVIEW_LINES: usize = 15;

const HELP_TEXT: &str = "I'm running in offline demo mode, so I can only react to a few keywords. \
Try \"list files\", \"search for <pattern>\", \"read <path>\" or \"git status\".";

/// A deterministic provider that never touches the network.
#[derive(Debug, Default)]
pub struct DemoProvider {
    next_id: AtomicU64,
}

impl DemoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn call(&self, name: &str, arguments: serde_json::Value) -> ToolCall {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        ToolCall::new(format!("demo_{id}"), name, arguments)
    }

    /// Pick a tool call for `input`, or `None` when no keyword matches.
    fn plan(&self, input: &str) -> Option<ToolCall> {
        let words: Vec<String> = input
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | ',' | '?' | '!')).to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let position = |keys: &[&str]| lower.iter().position(|w| keys.contains(&w.as_str()));
        let looks_like_path = |w: &&String| w.contains('/') || w.contains('.');

        if let Some(i) = position(&["list", "ls"]) {
            let path = words[i + 1..]
                .iter()
                .find(looks_like_path)
                .map_or(".", |p| p.as_str());
            return Some(self.call("directory_list", serde_json::json!({ "path": path })));
        }

        if let Some(i) = position(&["search", "find", "grep"]) {
            let rest: Vec<&str> = words[i + 1..]
                .iter()
                .map(String::as_str)
                .filter(|w| !matches!(w.to_lowercase().as_str(), "for" | "the" | "in"))
                .collect();
            if let Some(pattern) = rest.first() {
                return Some(self.call("code_search", serde_json::json!({ "pattern": pattern })));
            }
        }

        let read_path = position(&["read", "show", "cat"])
            .and_then(|i| words[i + 1..].iter().find(looks_like_path));
        if let Some(path) = read_path {
            return Some(self.call("file_read", serde_json::json!({ "path": path })));
        }

        if let Some(i) = position(&["git", "status", "diff", "log"]) {
            let operation = lower[i..]
                .iter()
                .find(|w| matches!(w.as_str(), "status" | "diff" | "log"))
                .map_or("status", |w| w.as_str());
            return Some(self.call("git_ops", serde_json::json!({ "operation": operation })));
        }

        None
    }

    /// Summarize the tool results that follow the last assistant message.
    fn summarize(messages: &[Message]) -> String {
        let results: Vec<&Message> = messages
            .iter()
            .rev()
            .take_while(|m| m.role == Role::Tool)
            .collect();

        let mut summary = String::from("Here is what I found:");
        for msg in results.into_iter().rev() {
            let name = msg.tool_name.as_deref().unwrap_or("tool");
            let status = if msg.is_error { " (failed)" } else { "" };
            let total = msg.content.lines().count();
            summary.push_str(&format!("\n\n{name}{status}:\n"));
            for line in msg.content.lines().take(PREVIEW_LINES) {
                summary.push_str(line);
                summary.push('\n');
            }
            if total > PREVIEW_LINES {
                summary.push_str(&format!("... ({} more lines)\n", total - PREVIEW_LINES));
            }
        }
        summary.trim_end().to_string()
    }
}

#[async_trait]
impl termpilot_core::Provider for DemoProvider {
    fn name(&self) -> &str {
        "demo"
    }

    fn model_name(&self) -> &str {
        "offline demo"
    }

    async fn chat(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
        _system: &str,
    ) -> std::result::Result<LlmResponse, ProviderError> {
        let Some(last) = messages.last() else {
            return Ok(LlmResponse::text(HELP_TEXT));
        };

        let mut response = if last.role == Role::Tool {
            LlmResponse::text(Self::summarize(messages))
        } else {
            match self.plan(&last.content) {
                Some(call) => {
                    debug!(tool = %call.name, "Demo provider chose a tool");
                    LlmResponse::with_tool_calls("", vec![call])
                }
                None => LlmResponse::text(HELP_TEXT),
            }
        };
        response.model = "demo".into();
        Ok(response)
    }
}
