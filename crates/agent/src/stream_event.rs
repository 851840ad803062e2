//! Agent-level events.
//!
//! `AgentEvent` reports what happens inside a turn (text from the model,
//! tool invocations and their results, the round cap) to whatever is
//! rendering the session. Events are delivered through an [`EventSink`].

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use termpilot_core::tool::ToolArguments;

/// Events emitted by the agent while processing one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Non-empty text returned by the model in a round.
    Text { content: String },

    /// The agent is about to invoke a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: ToolArguments,
    },

    /// Tool execution completed, successfully or not.
    ToolResult {
        id: String,
        name: String,
        content: String,
        is_error: bool,
    },

    /// The turn stopped because every allowed round requested tools.
    RoundLimitReached { rounds: u32 },
}

impl AgentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::RoundLimitReached { .. } => "round_limit_reached",
        }
    }
}

/// Receives agent events as they happen.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AgentEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AgentEvent) {}
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<AgentEvent> {
    fn emit(&self, event: AgentEvent) {
        // A dropped receiver only means nobody is watching anymore.
        let _ = self.send(event);
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AgentEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Event type names, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(AgentEvent::event_type).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: AgentEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
