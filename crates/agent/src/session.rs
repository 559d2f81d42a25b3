//! An interactive conversation: an orchestrator plus bounded history.

use crate::history::ConversationHistory;
use crate::orchestrator::{TurnOrchestrator, TurnReport};
use crate::stream_event::TurnEvent;
use corretor_core::error::Result;
use corretor_core::message::Role;
use std::sync::Arc;
use tracing::debug;

pub struct ChatSession {
    orchestrator: Arc<TurnOrchestrator>,
    system_prompt: String,
    history: ConversationHistory,
}

impl ChatSession {
    pub fn new(
        orchestrator: Arc<TurnOrchestrator>,
        system_prompt: impl Into<String>,
        max_pairs: usize,
    ) -> Self {
        Self {
            orchestrator,
            system_prompt: system_prompt.into(),
            history: ConversationHistory::new(max_pairs),
        }
    }

    /// Answer `query` in the context of the conversation so far.
    ///
    /// The exchange is recorded only if the turn succeeds.
    pub async fn ask<F>(&mut self, query: &str, on_event: F) -> Result<TurnReport>
    where
        F: FnMut(TurnEvent) + Send,
    {
        let messages = self.history.build_messages(&self.system_prompt, query);
        let report = self.orchestrator.run_turn(messages, on_event).await?;

        self.history.append(Role::User, query);
        self.history.append(Role::Assistant, report.answer.clone());
        self.history.trim();
        debug!(history_len = self.history.len(), "Recorded turn");

        Ok(report)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}
