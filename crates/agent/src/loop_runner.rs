//! The agent reasoning loop implementation.

use std::sync::Arc;
use std::time::Instant;

use termpilot_core::error::ProviderError;
use termpilot_core::history::History;
use termpilot_core::message::Message;
use termpilot_core::provider::Provider;
use termpilot_core::tool::ToolRegistry;
use termpilot_core::{AgentConfig, TrimPolicy};
use tracing::{debug, info, warn};

use crate::prompt::{self, DEFAULT_SYSTEM_PROMPT};
use crate::stream_event::{AgentEvent, EventSink};

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without requesting tools.
    Completed { text: String, rounds: u32 },

    /// Every allowed round requested tools; the turn was cut off.
    RoundLimitReached { rounds: u32 },
}

impl TurnOutcome {
    pub fn rounds(&self) -> u32 {
        match self {
            Self::Completed { rounds, .. } | Self::RoundLimitReached { rounds } => *rounds,
        }
    }
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Sent out-of-band on every provider call
    system_prompt: String,

    /// Maximum provider calls per turn
    max_tool_rounds: u32,

    /// Conversation so far
    history: History,
}

impl AgentLoop {
    /// Create a new agent loop with default limits and the built-in prompt.
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_rounds: termpilot_core::agent::DEFAULT_MAX_TOOL_ROUNDS,
            history: History::default(),
        }
    }

    /// Create an agent loop with limits, trim policy and prompt taken from config.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &AgentConfig,
    ) -> Self {
        Self::new(provider, tools)
            .with_max_tool_rounds(config.max_tool_rounds)
            .with_history_limit(config.max_history_messages)
            .with_trim_policy(config.trim_policy)
            .with_system_prompt(prompt::system_prompt(config))
    }

    /// Set the maximum number of provider calls per turn.
    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max;
        self
    }

    /// Set the history bound. Existing messages are kept.
    pub fn with_history_limit(mut self, max_messages: usize) -> Self {
        let policy = self.history.policy();
        let mut history = History::new(max_messages).with_policy(policy);
        for message in self.history.messages() {
            history.push(message.clone());
        }
        self.history = history;
        self
    }

    pub fn with_trim_policy(mut self, policy: TrimPolicy) -> Self {
        self.history = std::mem::take(&mut self.history).with_policy(policy);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Run one user turn to completion.
    ///
    /// Each round sends the full history to the provider. Tool calls are
    /// executed sequentially in the order the provider returned them and
    /// their results are appended before the next round. A provider error
    /// ends the turn immediately; whatever history was appended is kept.
    pub async fn process_message(
        &mut self,
        input: &str,
        sink: &dyn EventSink,
    ) -> Result<TurnOutcome, ProviderError> {
        self.history.push(Message::user(input));
        self.history.trim();

        let definitions = self.tools.definitions();

        for round in 1..=self.max_tool_rounds {
            debug!(
                provider = self.provider.name(),
                model = self.provider.model_name(),
                messages = self.history.len(),
                tools = definitions.len(),
                round,
                "Calling provider"
            );

            let response = self
                .provider
                .chat(self.history.messages(), &definitions, &self.system_prompt)
                .await?;

            if !response.content.is_empty() {
                sink.emit(AgentEvent::Text {
                    content: response.content.clone(),
                });
            }

            if !response.has_tool_calls() {
                self.history.push(Message::assistant(response.content.clone()));
                info!(rounds = round, "Turn completed");
                return Ok(TurnOutcome::Completed {
                    text: response.content,
                    rounds: round,
                });
            }

            let calls = response.tool_calls;
            self.history
                .push(Message::assistant_with_tools(response.content, calls.clone()));

            for call in &calls {
                sink.emit(AgentEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });

                let started = Instant::now();
                let result = self.tools.execute_call(call).await;
                debug!(
                    tool = %call.name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    is_error = result.is_error,
                    "Tool executed"
                );

                sink.emit(AgentEvent::ToolResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    content: result.content.clone(),
                    is_error: result.is_error,
                });
                self.history
                    .push(Message::tool_result(call, result.content, result.is_error));
            }
        }

        warn!(
            rounds = self.max_tool_rounds,
            "Max tool rounds reached, stopping turn"
        );
        sink.emit(AgentEvent::RoundLimitReached {
            rounds: self.max_tool_rounds,
        });
        Ok(TurnOutcome::RoundLimitReached {
            rounds: self.max_tool_rounds,
        })
    }

    /// Forget the conversation. The provider and tools are unchanged.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Replace the provider; the history carries over to the new backend.
    pub fn switch_provider(&mut self, provider: Arc<dyn Provider>) {
        info!(
            from = self.provider.name(),
            to = provider.name(),
            "Switching provider"
        );
        self.provider = provider;
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn max_tool_rounds(&self) -> u32 {
        self.max_tool_rounds
    }
}
