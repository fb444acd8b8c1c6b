use serde::Serialize;

use super::{Message, Role};
use crate::domain::DomainError;

/// Greeting every fresh session starts with.
pub const DEFAULT_GREETING: &str = "Hi! I'm your medical assistant. How can I help you today?";

/// Ordered, append-only record of the conversation.
///
/// The transcript is never empty: it starts from a single assistant greeting
/// (the seed) and [`Transcript::clear`] returns it to exactly that state.
/// Messages are only ever appended; an assistant turn must follow a user turn.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
    #[serde(skip)]
    seed: Message,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}

impl Transcript {
    pub fn new(greeting: impl Into<String>) -> Self {
        let seed = Message::assistant(greeting);
        Self {
            messages: vec![seed.clone()],
            seed,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> &Message {
        // Seeded on construction and on clear, never popped.
        &self.messages[self.messages.len() - 1]
    }

    /// True when the newest turn is a user message still waiting for a reply.
    pub fn awaiting_reply(&self) -> bool {
        self.last().role() == Role::User
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), DomainError> {
        if !self.awaiting_reply() {
            return Err(DomainError::invalid_state(
                "assistant message requires a preceding user message",
            ));
        }
        self.messages.push(Message::assistant(content));
        Ok(())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.messages.push(self.seed.clone());
    }
}
