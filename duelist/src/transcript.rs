//! The conversation log, threaded explicitly through each chat turn.
//!
//! A turn handler receives the transcript, produces a response, and hands
//! back an extended copy; nothing mutates shared session state.

/// One utterance in the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: String,
    pub content: String,
}

impl Turn {
    pub const USER: &'static str = "user";
    pub const ASSISTANT: &'static str = "assistant";

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Self::USER.to_string(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Self::ASSISTANT.to_string(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

/// Immutable-per-turn conversation log.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript opened by an assistant greeting.
    #[must_use]
    pub fn seeded(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns a new transcript with one user/assistant exchange appended.
    #[must_use]
    pub fn with_exchange(&self, user: impl Into<String>, assistant: impl Into<String>) -> Self {
        let mut turns = self.turns.clone();
        turns.push(Turn::user(user));
        turns.push(Turn::assistant(assistant));
        Self { turns }
    }
}
