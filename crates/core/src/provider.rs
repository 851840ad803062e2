//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to an LLM and get a response
//! back, either as a complete message or as a stream of text deltas.
//!
//! Implementations: Anthropic, OpenAI-compatible (OpenAI, Ollama), offline demo.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{Message, ToolCall};

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text; empty when the model only called tools
    #[serde(default)]
    pub content: String,

    /// Tool calls in the order the model emitted them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Why generation stopped, as reported by the backend. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model actually responded
    #[serde(default)]
    pub model: String,
}

impl LlmResponse {
    /// A plain text answer with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            stop_reason: Some("end_turn".into()),
            ..Default::default()
        }
    }

    /// A response that requests tool calls.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            stop_reason: Some("tool_use".into()),
            ..Default::default()
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Receiving half of a streaming response.
pub type ChunkReceiver = tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loop calls `chat()`
/// without knowing which provider is being used. History is passed without
/// a system message; `system` travels separately on every call.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Symbolic backend name (e.g., "claude", "openai").
    fn name(&self) -> &str;

    /// Display name of the model this provider talks to.
    fn model_name(&self) -> &str;

    /// Send the conversation and get a complete response.
    ///
    /// `tools` may be empty, in which case no tool schema is sent.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        system: &str,
    ) -> std::result::Result<LlmResponse, ProviderError>;

    /// Send the conversation and get a stream of text deltas.
    ///
    /// Default implementation calls `chat()` and wraps the result as a single chunk.
    async fn stream_chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        system: &str,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let response = self.chat(messages, tools, system).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: Some(response.content),
                done: true,
                usage: response.usage,
            }))
            .await;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }
        fn model_name(&self) -> &str {
            "fixed-1"
        }
        async fn chat(
            &self,
            messages: &[Message],
            _tools: &[ToolDefinition],
            _system: &str,
        ) -> std::result::Result<LlmResponse, ProviderError> {
            Ok(LlmResponse::text(format!("{} messages", messages.len())))
        }
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "terminal".into(),
            description: "Execute a shell command".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string", "description": "The command to run" }
                },
                "required": ["command"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("terminal"));
        assert!(json.contains("command"));
    }

    #[test]
    fn response_constructors() {
        let text = LlmResponse::text("hi");
        assert!(!text.has_tool_calls());
        assert_eq!(text.stop_reason.as_deref(), Some("end_turn"));

        let call = ToolCall::new("c1", "file_read", serde_json::Map::new());
        let tools = LlmResponse::with_tool_calls("", vec![call]);
        assert!(tools.has_tool_calls());
        assert!(tools.content.is_empty());
    }

    #[tokio::test]
    async fn default_stream_wraps_chat() {
        let provider = FixedProvider;
        let mut rx = provider
            .stream_chat(&[Message::user("a"), Message::user("b")], &[], "")
            .await
            .unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(chunk.content.as_deref(), Some("2 messages"));
        assert!(chunk.done);
        assert!(rx.recv().await.is_none());
    }
}
