//! Per-message moderation flow.

use log::{debug, info, warn};
use poise::serenity_prelude::{Message as SerenityMessage, UserId};

use crate::ai::AiProvider;
use crate::config::ModerationTarget;

use super::alert::{Alert, AlertSink};
use super::prompt::build_classification_prompt;
use super::rules::RuleDocument;
use super::verdict::{ModerationVerdict, parse_verdict};

/// The parts of a Discord message moderation looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMessage {
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub link: String,
}

impl From<&SerenityMessage> for ObservedMessage {
    fn from(message: &SerenityMessage) -> Self {
        let author = &message.author;
        let author_name = message
            .member
            .as_ref()
            .and_then(|member| member.nick.clone())
            .or_else(|| author.global_name.clone())
            .unwrap_or_else(|| author.name.clone());

        Self {
            author_id: author.id,
            author_name,
            content: message.content.clone(),
            link: message.link(),
        }
    }
}

/// What happened to a reviewed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Clear,
    Alerted,
    /// Provider, parse or delivery failure. The message is let through.
    Failed,
}

pub struct Moderator {
    rules: RuleDocument,
    target: ModerationTarget,
    command_names: Vec<String>,
}

impl Moderator {
    /// Returns `None`, and moderation stays off, unless both the rules and the
    /// alert target are available.
    pub fn new(
        rules: Option<RuleDocument>,
        target: Option<ModerationTarget>,
        command_names: Vec<String>,
    ) -> Option<Self> {
        match (rules, target) {
            (Some(rules), Some(target)) => {
                info!(
                    "Moderation enabled for guild {} (alerts to channel {})",
                    target.guild_id, target.admin_channel_id
                );
                Some(Self {
                    rules,
                    target,
                    command_names,
                })
            }
            (None, _) => {
                warn!("Moderation disabled: no rules configured");
                None
            }
            (_, None) => {
                warn!("Moderation disabled: no administrator channel configured");
                None
            }
        }
    }

    pub fn target(&self) -> ModerationTarget {
        self.target
    }

    /// Whether `content` is one of the bot's commands typed as text.
    pub fn is_command(&self, content: &str) -> bool {
        content
            .trim_start()
            .strip_prefix('/')
            .and_then(|rest| rest.split_whitespace().next())
            .is_some_and(|name| self.command_names.iter().any(|cmd| cmd == name))
    }

    /// Filters out the bot's own messages, other bots, commands, messages
    /// outside the moderated guild and messages without text.
    pub fn should_review(&self, message: &SerenityMessage, bot_user_id: UserId) -> bool {
        if message.author.id == bot_user_id || message.author.bot {
            return false;
        }
        if message.guild_id != Some(self.target.guild_id) {
            return false;
        }
        if message.content.trim().is_empty() {
            return false;
        }
        !self.is_command(&message.content)
    }

    /// Classifies one message and posts an alert when it is flagged.
    ///
    /// Never returns an error: every failure is logged and the message is
    /// treated as clean.
    pub async fn review(
        &self,
        provider: &dyn AiProvider,
        sink: &dyn AlertSink,
        message: &ObservedMessage,
    ) -> ReviewOutcome {
        let prompt = build_classification_prompt(&self.rules, &message.author_name, &message.content);

        let raw = match provider.classify(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Moderation classification failed for {}: {e}", message.link);
                return ReviewOutcome::Failed;
            }
        };

        let violation = match parse_verdict(&raw) {
            Ok(ModerationVerdict::Clear) => {
                debug!("Message {} is clear", message.link);
                return ReviewOutcome::Clear;
            }
            Ok(ModerationVerdict::Violation(violation)) => violation,
            Err(e) => {
                warn!("Ignoring unparseable verdict for {}: {e} (raw: {raw})", message.link);
                return ReviewOutcome::Failed;
            }
        };

        info!(
            "Message {} by {} flagged under '{}' ({})",
            message.link, message.author_name, violation.rule, violation.penalty
        );

        match sink.post(Alert::new(message, violation)).await {
            Ok(()) => ReviewOutcome::Alerted,
            Err(e) => {
                warn!("Failed to post moderation alert for {}: {e}", message.link);
                ReviewOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude::{ChannelId, GuildId, MessageId, PartialMember};

    use super::*;
    use crate::ai::MockAiProvider;
    use crate::error::BotError;
    use crate::moderation::alert::MockAlertSink;
    use crate::moderation::verdict::Penalty;

    const BOT_ID: u64 = 1;
    const GUILD_ID: u64 = 10;

    fn moderator() -> Moderator {
        Moderator::new(
            RuleDocument::new("Regla 1: No insultar."),
            Some(ModerationTarget {
                guild_id: GuildId::new(GUILD_ID),
                admin_channel_id: ChannelId::new(20),
            }),
            vec!["ia".to_string(), "reset_ia".to_string()],
        )
        .expect("moderation enabled")
    }

    fn observed(content: &str) -> ObservedMessage {
        ObservedMessage {
            author_id: UserId::new(99),
            author_name: "Pepe".to_string(),
            content: content.to_string(),
            link: "https://discord.com/channels/10/30/40".to_string(),
        }
    }

    fn discord_message(author_id: u64, content: &str) -> SerenityMessage {
        let mut msg = SerenityMessage::default();
        msg.author.id = UserId::new(author_id);
        msg.guild_id = Some(GuildId::new(GUILD_ID));
        msg.content = content.to_string();
        msg
    }

    fn provider_replying(reply: &'static str) -> MockAiProvider {
        let mut provider = MockAiProvider::new();
        provider
            .expect_classify()
            .times(1)
            .returning(move |_| Ok(reply.to_string()));
        provider
    }

    #[tokio::test]
    async fn flagged_message_posts_exactly_one_alert() {
        let mut provider = MockAiProvider::new();
        provider
            .expect_classify()
            .withf(|prompt| prompt.contains("Regla 1: No insultar.") && prompt.contains("Eres un idiota"))
            .times(1)
            .returning(|_| {
                Ok(r#"{"infraccion":"Sí","regla_infringida":"Regla 1","penalizacion_recomendada":"Warn","justificacion":"Insulto directo."}"#.to_string())
            });

        let mut sink = MockAlertSink::new();
        sink.expect_post()
            .withf(|alert| {
                alert.author_id == UserId::new(99)
                    && alert.rule == "Regla 1"
                    && alert.original == "Eres un idiota"
                    && alert.penalty == Penalty::Warn
                    && alert.justification == "Insulto directo."
                    && alert.link == "https://discord.com/channels/10/30/40"
            })
            .times(1)
            .returning(|_| Ok(()));

        let outcome = moderator()
            .review(&provider, &sink, &observed("Eres un idiota"))
            .await;
        assert_eq!(outcome, ReviewOutcome::Alerted);
    }

    #[tokio::test]
    async fn clear_verdict_posts_nothing() {
        let provider = provider_replying(r#"{"infraccion":"No"}"#);
        let mut sink = MockAlertSink::new();
        sink.expect_post().times(0);

        let outcome = moderator().review(&provider, &sink, &observed("Hola a todos")).await;
        assert_eq!(outcome, ReviewOutcome::Clear);
    }

    #[tokio::test]
    async fn malformed_reply_posts_nothing_and_keeps_going() {
        let provider = provider_replying("Lo siento, no puedo ayudar con eso.");
        let mut sink = MockAlertSink::new();
        sink.expect_post().times(0);
        let moderator = moderator();

        let outcome = moderator.review(&provider, &sink, &observed("mensaje")).await;
        assert_eq!(outcome, ReviewOutcome::Failed);

        let next = provider_replying(r#"{"infraccion":"No"}"#);
        let outcome = moderator.review(&next, &sink, &observed("otro mensaje")).await;
        assert_eq!(outcome, ReviewOutcome::Clear);
    }

    #[tokio::test]
    async fn provider_error_posts_nothing() {
        let mut provider = MockAiProvider::new();
        provider
            .expect_classify()
            .returning(|_| Err(BotError::GeminiResponse("quota".to_string())));
        let mut sink = MockAlertSink::new();
        sink.expect_post().times(0);

        let outcome = moderator().review(&provider, &sink, &observed("mensaje")).await;
        assert_eq!(outcome, ReviewOutcome::Failed);
    }

    #[test]
    fn disabled_without_rules_or_target() {
        assert!(Moderator::new(None, Some(moderator().target()), Vec::new()).is_none());
        assert!(Moderator::new(RuleDocument::new("Regla"), None, Vec::new()).is_none());
    }

    #[test]
    fn recognizes_typed_commands() {
        let moderator = moderator();
        assert!(moderator.is_command("/ia hola"));
        assert!(moderator.is_command("  /reset_ia"));
        assert!(!moderator.is_command("/iaa hola"));
        assert!(!moderator.is_command("ia hola"));
    }

    #[test]
    fn skips_bots_commands_and_other_guilds() {
        let moderator = moderator();
        let bot_id = UserId::new(BOT_ID);

        assert!(moderator.should_review(&discord_message(99, "hola"), bot_id));
        assert!(!moderator.should_review(&discord_message(BOT_ID, "hola"), bot_id));
        assert!(!moderator.should_review(&discord_message(99, "/ia hola"), bot_id));
        assert!(!moderator.should_review(&discord_message(99, "   "), bot_id));

        let mut other_bot = discord_message(50, "hola");
        other_bot.author.bot = true;
        assert!(!moderator.should_review(&other_bot, bot_id));

        let mut elsewhere = discord_message(99, "hola");
        elsewhere.guild_id = Some(GuildId::new(11));
        assert!(!moderator.should_review(&elsewhere, bot_id));
    }

    #[test]
    fn observed_message_prefers_nick_then_global_name() {
        let mut msg = discord_message(99, "hola a todos");
        msg.id = MessageId::new(40);
        msg.channel_id = ChannelId::new(30);
        msg.author.name = "pepe".to_string();

        let seen = ObservedMessage::from(&msg);
        assert_eq!(seen.author_name, "pepe");
        assert_eq!(seen.author_id, UserId::new(99));
        assert_eq!(seen.content, "hola a todos");
        assert_eq!(seen.link, "https://discord.com/channels/10/30/40");

        msg.author.global_name = Some("Pepe G".to_string());
        assert_eq!(ObservedMessage::from(&msg).author_name, "Pepe G");

        let member: PartialMember =
            serde_json::from_value(serde_json::json!({"nick": "Pepito", "roles": []}))
                .expect("valid member");
        msg.member = Some(Box::new(member));
        assert_eq!(ObservedMessage::from(&msg).author_name, "Pepito");
    }
}
