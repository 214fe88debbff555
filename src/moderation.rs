//! Passive moderation - classifies ordinary messages against the server rules
//! and alerts administrators about suspected violations.

mod alert;
mod handler;
mod prompt;
mod rules;
mod verdict;

pub use alert::{Alert, AlertSink, ChannelAlertSink};
pub use handler::{Moderator, ObservedMessage, ReviewOutcome};
pub use prompt::build_classification_prompt;
pub use rules::{RuleDocument, load_rules};
pub use verdict::{ModerationVerdict, Penalty, Violation, parse_verdict, strip_code_fences};
