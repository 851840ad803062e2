//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI itself and with Ollama's `/v1` endpoint, plus any other
//! server speaking the Chat Completions protocol.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - Tool use / function calling

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use termpilot_core::error::ProviderError;
use termpilot_core::message::{Message, Role, ToolCall};
use termpilot_core::provider::*;
use tracing::{debug, trace};

use crate::sse::SseBuffer;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const OLLAMA_DEFAULT_MODEL: &str = "qwen2.5:0.5b";

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: crate::http_client(120),
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", OPENAI_BASE_URL, api_key, OPENAI_DEFAULT_MODEL)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or(OLLAMA_BASE_URL),
            "ollama", // Ollama doesn't need a real key
            OLLAMA_DEFAULT_MODEL,
        )
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Convert our Message types to OpenAI API format, system prompt first.
    fn to_api_messages(messages: &[Message], system: &str) -> Vec<ApiMessage> {
        let system_message = (!system.is_empty()).then(|| ApiMessage {
            role: "system".into(),
            content: Some(system.to_string()),
            tool_calls: None,
            tool_call_id: None,
        });

        system_message
            .into_iter()
            .chain(messages.iter().map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::Tool => "tool".into(),
                },
                content: if m.role == Role::Assistant && m.has_tool_calls() && m.content.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                },
                tool_calls: m.has_tool_calls().then(|| {
                    m.tool_calls
                        .iter()
                        .map(|tc| ApiToolCall {
                            id: tc.id.clone(),
                            r#type: "function".into(),
                            function: ApiFunction {
                                name: tc.name.clone(),
                                arguments: serde_json::Value::Object(tc.arguments.clone()).to_string(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: m.tool_call_id.clone(),
            }))
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        system: &str,
        stream: bool,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(messages, system),
            "stream": stream,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        body
    }

    async fn send(&self, body: &serde_json::Value, stream: bool) -> std::result::Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        if stream {
            request = request.header("Accept", "text/event-stream");
        }

        let response = request.json(body).send().await.map_err(crate::transport_error)?;
        crate::check_status(response, &self.name).await
    }

    fn parse_response(api_response: ApiResponse) -> std::result::Result<LlmResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let id = if tc.id.is_empty() {
                    format!("call_{}", uuid::Uuid::new_v4().simple())
                } else {
                    tc.id
                };
                ToolCall::new(
                    id,
                    tc.function.name,
                    ToolCall::parse_arguments(&tc.function.arguments),
                )
            })
            .collect();

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            stop_reason: choice.finish_reason,
            usage,
            model: api_response.model,
        })
    }

    /// Translate one SSE payload into a stream chunk, if it carries one.
    fn parse_stream_data(data: &str, provider: &str) -> Option<StreamChunk> {
        if data == "[DONE]" {
            return Some(StreamChunk {
                done: true,
                ..Default::default()
            });
        }

        match serde_json::from_str::<StreamResponse>(data) {
            Ok(stream_resp) => {
                let content = stream_resp
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .filter(|c| !c.is_empty());
                let usage = stream_resp.usage.map(|u| Usage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                });
                (content.is_some() || usage.is_some()).then_some(StreamChunk {
                    content,
                    done: false,
                    usage,
                })
            }
            Err(e) => {
                trace!(provider, data = %data, error = %e, "Ignoring unparseable SSE chunk");
                None
            }
        }
    }
}

#[async_trait]
impl termpilot_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        system: &str,
    ) -> std::result::Result<LlmResponse, ProviderError> {
        let body = self.request_body(messages, tools, system, false);

        debug!(
            provider = %self.name,
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending completion request"
        );

        let response = self.send(&body, false).await?;
        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Self::parse_response(api_response)
    }

    async fn stream_chat(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
        system: &str,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        // Tools are left out of streaming requests; some compatible servers reject the pair.
        let body = self.request_body(messages, &[], system, true);

        debug!(provider = %self.name, model = %self.model, "Sending streaming request");

        let response = self.send(&body, true).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut sse = SseBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for data in sse.push(&bytes) {
                    let Some(chunk) = Self::parse_stream_data(&data, &provider_name) else {
                        continue;
                    };
                    let done = chunk.done;
                    if tx.send(Ok(chunk)).await.is_err() || done {
                        return;
                    }
                }
            }

            // Stream ended without [DONE]
            let _ = tx
                .send(Ok(StreamChunk {
                    done: true,
                    ..Default::default()
                }))
                .await;
        });

        Ok(rx)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    #[serde(default)]
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use termpilot_core::Provider;

    #[test]
    fn openai_constructor() {
        let provider = OpenAiCompatProvider::openai("sk-test");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model_name(), "gpt-4o");
        assert!(provider.base_url.contains("api.openai.com"));
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model_name(), "qwen2.5:0.5b");
        assert!(provider.base_url.contains("localhost:11434"));

        let remote = OpenAiCompatProvider::ollama(Some("http://gpu-box:11434/v1/"));
        assert_eq!(remote.base_url, "http://gpu-box:11434/v1");
    }

    #[test]
    fn system_prompt_leads_messages() {
        let messages = vec![Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages, "You are helpful");
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[0].content.as_deref(), Some("You are helpful"));
        assert_eq!(api_messages[1].role, "user");

        let bare = OpenAiCompatProvider::to_api_messages(&messages, "");
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn tool_definition_conversion() {
        let tools = vec![ToolDefinition {
            name: "terminal".into(),
            description: "Run a shell command".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiCompatProvider::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].function.name, "terminal");
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn body_omits_empty_tools() {
        let provider = OpenAiCompatProvider::openai("sk-test");
        let body = provider.request_body(&[Message::user("hi")], &[], "", false);
        assert!(body.get("tools").is_none());
        assert_eq!(body["stream"], false);
        assert_eq!(body["model"], "gpt-4o");
    }

    #[test]
    fn message_conversion_with_tool_calls() {
        let mut args = serde_json::Map::new();
        args.insert("command".into(), "ls".into());
        let msg = Message::assistant_with_tools("", vec![ToolCall::new("call_1", "terminal", args)]);
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg], "");
        assert_eq!(api_msgs.len(), 1);
        assert!(api_msgs[0].content.is_none());
        let tc = api_msgs[0].tool_calls.as_ref().unwrap();
        assert_eq!(tc.len(), 1);
        assert_eq!(tc[0].function.name, "terminal");
        let decoded: serde_json::Value = serde_json::from_str(&tc[0].function.arguments).unwrap();
        assert_eq!(decoded["command"], "ls");
    }

    #[test]
    fn message_conversion_tool_response() {
        let call = ToolCall::new("call_1", "terminal", serde_json::Map::new());
        let msg = Message::tool_result(&call, "result data", false);
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg], "");
        assert_eq!(api_msgs[0].role, "tool");
        assert_eq!(api_msgs[0].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(api_msgs[0].content.as_deref(), Some("result data"));
    }

    #[test]
    fn parse_tool_call_response() {
        let data = r#"{
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function", "function": {"name": "file_read", "arguments": "{\"path\": \"Cargo.toml\"}"}},
                        {"id": "call_b", "type": "function", "function": {"name": "code_search", "arguments": "{not json"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::parse_response(parsed).unwrap();

        assert!(response.content.is_empty());
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments["path"], "Cargo.toml");
        assert!(response.tool_calls[1].arguments.is_empty());
        assert_eq!(response.stop_reason.as_deref(), Some("tool_calls"));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
        assert_eq!(response.model, "gpt-4o-2024-08-06");
    }

    #[test]
    fn missing_tool_call_ids_are_generated() {
        let data = r#"{
            "model": "qwen2.5:0.5b",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [
                        {"function": {"name": "directory_list", "arguments": "{}"}},
                        {"function": {"name": "directory_list", "arguments": "{}"}}
                    ]
                }
            }]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::parse_response(parsed).unwrap();

        let ids: Vec<&str> = response.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.iter().all(|id| id.starts_with("call_") && id.len() > 5));
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn parse_empty_choices_is_malformed() {
        let parsed: ApiResponse = serde_json::from_str(r#"{"model": "x", "choices": []}"#).unwrap();
        assert!(matches!(
            OpenAiCompatProvider::parse_response(parsed),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    // --- SSE parsing tests ---

    #[test]
    fn parse_stream_content_delta() {
        let data = r#"{"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        let chunk = OpenAiCompatProvider::parse_stream_data(data, "openai").unwrap();
        assert_eq!(chunk.content.as_deref(), Some("Hello"));
        assert!(!chunk.done);
    }

    #[test]
    fn parse_stream_finish_chunk_is_skipped() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert!(OpenAiCompatProvider::parse_stream_data(data, "openai").is_none());
    }

    #[test]
    fn parse_stream_usage() {
        let data = r#"{"choices":[],"usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#;
        let chunk = OpenAiCompatProvider::parse_stream_data(data, "openai").unwrap();
        let usage = chunk.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn parse_stream_done_marker() {
        let chunk = OpenAiCompatProvider::parse_stream_data("[DONE]", "ollama").unwrap();
        assert!(chunk.done);
        assert!(chunk.content.is_none());
    }
}
