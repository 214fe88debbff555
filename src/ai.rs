//! Provider-agnostic seam for the generative model.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ConversationHistory;

/// Operations the bot needs from a text-generation backend.
///
/// Neither call retries; failures are returned to the caller as-is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends `text` after `history` and returns the reply together with the
    /// provider's canonical updated history (old turns, the new user turn and
    /// the model reply).
    async fn continue_conversation(
        &self,
        history: &ConversationHistory,
        text: &str,
    ) -> Result<(String, ConversationHistory)>;

    /// Single-shot request without history. The raw reply is returned
    /// unvalidated.
    async fn classify(&self, prompt: &str) -> Result<String>;
}
