//! Bounded conversation history.
//!
//! The history is the transcript sent to the provider on every call. It is
//! mutated only by appends, by [`History::clear`], and by the bulk
//! [`History::trim`] that the agent loop runs at each user-turn boundary.

use serde::Serialize;

use crate::agent::TrimPolicy;
use crate::message::{Message, Role};

/// An ordered, bounded sequence of messages owned by one agent loop.
#[derive(Debug, Clone, Serialize)]
pub struct History {
    messages: Vec<Message>,
    max_messages: usize,
    #[serde(skip)]
    policy: TrimPolicy,
}

impl History {
    /// Create an empty history bounded to `max_messages`.
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
            policy: TrimPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TrimPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn policy(&self) -> TrimPolicy {
        self.policy
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drop messages from the front until the bound holds.
    ///
    /// Returns the number of messages removed. A no-op when already within
    /// bounds. Under [`TrimPolicy::Turns`] the cut is moved forward to the next
    /// user message, so an assistant tool call is never separated from its
    /// results; if no user message remains in the window, everything is dropped.
    pub fn trim(&mut self) -> usize {
        let len = self.messages.len();
        if len <= self.max_messages {
            return 0;
        }

        let mut cut = len - self.max_messages;
        if self.policy == TrimPolicy::Turns {
            cut = self.messages[cut..]
                .iter()
                .position(|m| m.role == Role::User)
                .map_or(len, |offset| cut + offset);
        }

        self.messages.drain(..cut);
        tracing::debug!(
            removed = cut,
            kept = self.messages.len(),
            policy = ?self.policy,
            "Trimmed history"
        );
        cut
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::agent::DEFAULT_MAX_HISTORY_MESSAGES)
    }
}
