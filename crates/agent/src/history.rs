//! Bounded in-memory conversation history.
//!
//! History holds completed turns only: a user message followed by the
//! assistant's answer. It is trimmed FIFO to `max_pairs` pairs, and the
//! window sent to the model always starts on a user message.

use corretor_core::message::{Message, Role};

#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    max_pairs: usize,
}

impl ConversationHistory {
    pub fn new(max_pairs: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_pairs,
        }
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Drop the oldest messages until at most `max_pairs` pairs remain.
    pub fn trim(&mut self) {
        let limit = self.max_pairs * 2;
        if self.messages.len() > limit {
            let excess = self.messages.len() - limit;
            self.messages.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The full request for `new_query`: system prompt, recent history,
    /// then the query itself.
    pub fn build_messages(&self, system_prompt: &str, new_query: &str) -> Vec<Message> {
        build_messages(system_prompt, &self.messages, new_query, self.max_pairs)
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

    pub fn max_pairs(&self) -> usize {
        self.max_pairs
    }
}

/// The last `max_pairs` pairs of `history`, never starting mid-pair.
pub fn recent_window(history: &[Message], max_pairs: usize) -> &[Message] {
    let start = history.len().saturating_sub(max_pairs * 2);
    let window = &history[start..];
    let aligned = window
        .iter()
        .position(|m| m.role == Role::User)
        .unwrap_or(window.len());
    &window[aligned..]
}

pub fn build_messages(
    system_prompt: &str,
    history: &[Message],
    new_query: &str,
    max_pairs: usize,
) -> Vec<Message> {
    let window = recent_window(history, max_pairs);
    let mut messages = Vec::with_capacity(window.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend_from_slice(window);
    messages.push(Message::user(new_query));
    messages
}
