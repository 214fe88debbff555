//! Conversation exchanges independent of the Discord transport.

use log::{debug, error, info};
use poise::serenity_prelude::UserId;

use crate::ai::AiProvider;
use crate::conversation::ConversationStore;

use super::response::format_answer;

/// Generic reply sent whenever an exchange fails.
pub const APOLOGY: &str = "Lo siento, ha ocurrido un error al procesar tu solicitud.";

/// Outcome of a history reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Cleared,
    NothingToClear,
}

impl ResetOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ResetOutcome::Cleared => "¡Tu historial de conversación ha sido borrado!",
            ResetOutcome::NothingToClear => {
                "No tienes ningún historial de conversación para borrar."
            }
        }
    }
}

/// Runs one exchange for `user_id` and returns the text to send back.
///
/// Never fails: provider errors are logged and turned into [`APOLOGY`]. The
/// stored history is only replaced when the provider answered.
pub async fn ask_ai(
    store: &ConversationStore,
    provider: &dyn AiProvider,
    user_id: UserId,
    question: &str,
) -> String {
    let slot = store.slot(user_id);
    let mut history = slot.lock().await;
    debug!(
        "User {user_id} has {} turns of history",
        history.len()
    );

    match provider.continue_conversation(&history, question).await {
        Ok((answer, updated)) => {
            *history = updated;
            info!("Answered user {user_id} ({} turns stored)", history.len());
            format_answer(question, &answer)
        }
        Err(e) => {
            error!("Error in /ia for user {user_id}: {e}");
            APOLOGY.to_string()
        }
    }
}

pub fn reset_history(store: &ConversationStore, user_id: UserId) -> ResetOutcome {
    if store.reset(user_id) {
        info!("Cleared conversation history for user {user_id}");
        ResetOutcome::Cleared
    } else {
        debug!("No conversation history to clear for user {user_id}");
        ResetOutcome::NothingToClear
    }
}
