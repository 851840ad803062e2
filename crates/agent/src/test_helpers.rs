//! Shared test helpers for agent loop tests.

use std::sync::Mutex;

use termpilot_core::error::ProviderError;
use termpilot_core::message::{Message, ToolCall};
use termpilot_core::provider::{LlmResponse, Provider, ToolDefinition};

/// What the provider was given on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
    pub system: String,
}

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `chat` returns the next response in the queue. Once the
/// script is exhausted the last response repeats.
pub struct SequentialMockProvider {
    responses: Vec<Result<LlmResponse, ProviderError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<LlmResponse, ProviderError>>) -> Self {
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always answers with plain text.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(LlmResponse::text(text))])
    }

    /// A provider that first returns tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<ToolCall>, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            Ok(LlmResponse::with_tool_calls(thought, tool_calls)),
            Ok(LlmResponse::text(answer)),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        system: &str,
    ) -> Result<LlmResponse, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedCall {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            system: system.to_string(),
        });

        let index = (calls.len() - 1).min(self.responses.len().saturating_sub(1));
        match self.responses.get(index) {
            Some(response) => response.clone(),
            None => Err(ProviderError::MalformedResponse("no scripted responses".into())),
        }
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, args.as_object().cloned().unwrap_or_default())
}
