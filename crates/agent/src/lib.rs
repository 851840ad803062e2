//! The agent loop: the heart of termpilot.
//!
//! For every user message the agent runs a bounded **Ask → Act → Observe** cycle:
//!
//! 1. **Append** the user message to the history and trim it
//! 2. **Send** the history, tool definitions and system prompt to the provider
//! 3. **If tool calls**: execute them in order, append the results, loop back to step 2
//! 4. **If text only**: record the answer and end the turn
//!
//! The loop also ends when `max_tool_rounds` provider calls have been made.
//! Progress is reported through an [`EventSink`].

pub mod loop_runner;
pub mod prompt;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, TurnOutcome};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use stream_event::{AgentEvent, EventSink, NullSink, RecordingSink};
