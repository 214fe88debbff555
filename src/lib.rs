pub mod ai;
pub mod bot;
pub mod chatbot;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gemini;
pub mod liveness;
pub mod moderation;
pub mod types;

pub use bot::run;
