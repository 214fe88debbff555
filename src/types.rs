//! Common types used throughout the moderia bot.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
///
/// Maps to Gemini content roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Message from the human user
    User,
    /// Reply from the model
    Model,
}

/// A single text fragment of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One entry of a conversation history, shaped like Gemini's `Content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(TurnRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::text(TurnRole::Model, text)
    }

    fn text(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of every part.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.text.as_str())
            .collect()
    }
}

/// Ordered turns exchanged with the model for one user.
pub type ConversationHistory = Vec<Turn>;
