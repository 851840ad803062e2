//! # termpilot core
//!
//! Domain types, traits, and error definitions for the termpilot coding agent.
//! This crate has **no transport dependencies**: it defines the message model,
//! the bounded history, and the two seams (`Provider` and `Tool`) that the
//! other crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: role-tagged messages and tool calls
//! - [`history`]: the bounded conversation transcript and its trim policy
//! - [`tool`]: the `Tool` trait and the `ToolRegistry` dispatch table
//! - [`provider`]: the `Provider` trait over LLM backends
//! - [`agent`]: agent loop settings shared by config and the loop itself
//! - [`error`]: error taxonomy

pub mod agent;
pub mod error;
pub mod history;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentConfig, TrimPolicy};
pub use error::{ProviderError, ToolError};
pub use history::History;
pub use message::{Message, Role, ToolCall};
pub use provider::{ChunkReceiver, LlmResponse, Provider, StreamChunk, ToolDefinition, Usage};
pub use tool::{Tool, ToolArguments, ToolRegistry, ToolResult};
