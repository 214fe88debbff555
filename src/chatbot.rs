//! AI chatbot module - slash commands backed by per-user conversation memory.

mod commands;
mod response;
mod session;

pub use commands::chatbot_commands;
pub use response::{DISCORD_MESSAGE_LIMIT, format_answer, split_message};
pub use session::{APOLOGY, ResetOutcome, ask_ai, reset_history};
