//! Per-turn conversation assembly
//!
//! A turn appends the guest's utterance to the history, sends the system
//! prompt plus the whole history to the completion service, filters the
//! reply and appends it. Remote failures become an `Error: ...` reply so a
//! turn always completes with exactly two new messages.

mod filter;

#[cfg(test)]
mod proptests;

pub use filter::filter_reply;
#[cfg(test)]
pub use filter::FALLBACK_REPLY;

use crate::llm::{LlmError, LlmRequest, LlmService, Message, MessageRole};
use crate::system_prompt;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Sampling temperature for every request
pub const TEMPERATURE: f32 = 0.7;

/// Reply length cap for every request
pub const MAX_TOKENS: u32 = 512;

/// Messages exchanged in one session, oldest first.
///
/// Only user and assistant messages can be appended and nothing can be
/// removed, so the system prompt never ends up in here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push_user(&mut self, content: &str) {
        self.messages.push(Message::user(content));
    }

    fn push_assistant(&mut self, content: String) {
        self.messages.push(Message::assistant(content));
    }
}

/// Failure of the remote call within a turn
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("{0}")]
    RemoteServiceFailure(#[from] LlmError),
}

impl TurnError {
    /// The assistant message shown in place of a reply
    pub fn into_reply(self) -> String {
        format!("Error: {self}")
    }
}

/// Runs conversation turns against a completion service
pub struct ConversationTurnProcessor {
    llm: Arc<dyn LlmService>,
    system_prompt: Message,
}

impl ConversationTurnProcessor {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self::with_system_prompt(llm, system_prompt::system_message())
    }

    pub fn with_system_prompt(llm: Arc<dyn LlmService>, system_prompt: Message) -> Self {
        debug_assert_eq!(system_prompt.role(), MessageRole::System);
        Self { llm, system_prompt }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// System prompt followed by the history, in order
    pub fn build_request(&self, history: &ConversationHistory) -> LlmRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(self.system_prompt.clone());
        messages.extend(history.messages().iter().cloned());

        LlmRequest {
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    async fn request_reply(&self, history: &ConversationHistory) -> Result<String, TurnError> {
        let request = self.build_request(history);
        tracing::debug!(messages = request.messages.len(), "Calling completion service");
        let response = self.llm.complete(&request).await?;
        Ok(response.text)
    }

    /// Run one turn, appending the user message and the assistant reply to
    /// `history`. Returns the reply as stored.
    pub async fn process_turn(&self, history: &mut ConversationHistory, utterance: &str) -> String {
        tracing::debug!(utterance = %utterance, "User input received");
        history.push_user(utterance);

        let reply = match self.request_reply(history).await {
            Ok(raw) => {
                tracing::debug!(reply = %raw, "Completion received");
                let filtered = filter_reply(utterance, &raw);
                if filtered != raw {
                    tracing::debug!("Response contained code; using fallback message");
                }
                filtered
            }
            Err(e) => {
                tracing::error!(error = %e, "Completion service error");
                e.into_reply()
            }
        };

        history.push_assistant(reply.clone());
        tracing::debug!(history_len = history.len(), "Conversation history updated");
        reply
    }
}
