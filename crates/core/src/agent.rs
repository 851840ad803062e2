//! Agent loop settings.

use serde::{Deserialize, Serialize};

/// Default ceiling on provider calls per user turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 25;

/// Default bound on retained history messages.
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 100;

/// Configuration for the agent's behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum provider calls per turn (the only guard against runaway tool loops)
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Maximum number of messages kept in history
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,

    /// How history is cut when it grows past `max_history_messages`
    #[serde(default)]
    pub trim_policy: TrimPolicy,

    /// Replace the built-in system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_max_tool_rounds() -> u32 {
    DEFAULT_MAX_TOOL_ROUNDS
}
fn default_max_history_messages() -> usize {
    DEFAULT_MAX_HISTORY_MESSAGES
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            max_history_messages: default_max_history_messages(),
            trim_policy: TrimPolicy::default(),
            system_prompt_override: None,
        }
    }
}

/// Where history is allowed to be cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimPolicy {
    /// Cut only in front of a user message, so no round is ever split
    #[default]
    Turns,
    /// Keep exactly the most recent N messages, wherever that cuts
    Messages,
}
