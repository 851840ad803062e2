//! Terminal rendering of agent events.

use std::io::Write;

use termpilot_agent::{AgentEvent, EventSink};
use termpilot_core::error::ProviderError;
use termpilot_core::tool::ToolArguments;

const MAX_ARG_CHARS: usize = 60;
const MAX_RESULT_CHARS: usize = 2000;

/// Cut `s` to `max` characters, ending in `...` when shortened.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// `Tool: name(k=v, ...)` with long values shortened.
pub fn format_tool_call(name: &str, arguments: &ToolArguments) -> String {
    let args = arguments
        .iter()
        .map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{k}={}", truncate(&value, MAX_ARG_CHARS))
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("  Tool: {name}({args})")
}

/// A tool result framed for display, cut at 2000 characters.
pub fn format_tool_result(name: &str, content: &str, is_error: bool) -> String {
    let body = match content.char_indices().nth(MAX_RESULT_CHARS) {
        Some((end, _)) => format!("{}\n... (truncated)", &content[..end]),
        None => content.to_string(),
    };
    let status = if is_error { " (error)" } else { "" };
    let indented: Vec<String> = body.lines().map(|l| format!("  │ {l}")).collect();
    format!("  ┌─ {name}{status}\n{}\n  └─", indented.join("\n"))
}

pub fn format_round_limit(rounds: u32) -> String {
    format!("Error: Reached maximum tool rounds ({rounds}). Stopping.")
}

/// Renders agent events to stdout and errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn info(&self, message: &str) {
        println!("{message}");
    }

    pub fn warning(&self, message: &str) {
        eprintln!("Warning: {message}");
    }

    pub fn error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    pub fn provider_error(&self, error: &ProviderError) {
        self.error(&error.to_string());
    }

    pub fn prompt(&self) {
        print!("\n> ");
        let _ = std::io::stdout().flush();
    }
}

impl EventSink for TerminalRenderer {
    fn emit(&self, event: AgentEvent) {
        match event {
            AgentEvent::Text { content } => {
                if !content.trim().is_empty() {
                    println!("\n{}\n", content.trim_end());
                }
            }
            AgentEvent::ToolCall {
                name, arguments, ..
            } => println!("{}", format_tool_call(&name, &arguments)),
            AgentEvent::ToolResult {
                name,
                content,
                is_error,
                ..
            } => println!("{}", format_tool_result(&name, &content, is_error)),
            AgentEvent::RoundLimitReached { rounds } => eprintln!("{}", format_round_limit(rounds)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: serde_json::Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn tool_call_line() {
        let line = format_tool_call(
            "code_search",
            &args(serde_json::json!({"pattern": "fn main", "case_insensitive": true})),
        );
        assert_eq!(line, "  Tool: code_search(case_insensitive=true, pattern=fn main)");
    }

    #[test]
    fn long_argument_values_are_shortened() {
        let long = "x".repeat(100);
        let line = format_tool_call("file_write", &args(serde_json::json!({"content": long})));
        let value = line
            .trim_start_matches("  Tool: file_write(content=")
            .trim_end_matches(')');
        assert_eq!(value.chars().count(), 60);
        assert!(value.ends_with("..."));
    }

    #[test]
    fn long_results_are_cut_for_display() {
        let content = "y".repeat(2500);
        let shown = format_tool_result("terminal", &content, false);
        assert!(shown.contains("... (truncated)"));
        assert!(!shown.contains(&"y".repeat(2001)));

        let shown = format_tool_result("terminal", "short", true);
        assert!(shown.starts_with("  ┌─ terminal (error)"));
        assert!(shown.contains("  │ short"));
    }

    #[test]
    fn round_limit_message() {
        assert_eq!(
            format_round_limit(25),
            "Error: Reached maximum tool rounds (25). Stopping."
        );
    }
}
