//! Administrator alerts for flagged messages.

use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use poise::serenity_prelude::{ChannelId, CreateEmbed, CreateMessage, Http, UserId};

use crate::error::Result;

use super::handler::ObservedMessage;
use super::verdict::{Penalty, Violation};

// Discord rejects embed field values above this length.
const EMBED_FIELD_LIMIT: usize = 1024;
const ALERT_COLOR: u32 = 0x00E6_7E22;

/// Everything an administrator needs to act on a flagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub author_id: UserId,
    pub rule: String,
    pub original: String,
    pub penalty: Penalty,
    pub justification: String,
    pub link: String,
}

impl Alert {
    pub fn new(message: &ObservedMessage, violation: Violation) -> Self {
        Self {
            author_id: message.author_id,
            rule: violation.rule,
            original: message.content.clone(),
            penalty: violation.penalty,
            justification: violation.justification,
            link: message.link.clone(),
        }
    }

    /// The six embed fields, in display order.
    pub fn fields(&self) -> [(&'static str, String); 6] {
        [
            ("Usuario", format!("<@{}>", self.author_id)),
            ("Regla infringida", self.rule.clone()),
            ("Mensaje original", self.original.clone()),
            ("Penalización recomendada", self.penalty.to_string()),
            ("Justificación", self.justification.clone()),
            ("Enlace al mensaje", self.link.clone()),
        ]
    }

    pub fn to_embed(&self) -> CreateEmbed {
        self.fields().into_iter().fold(
            CreateEmbed::new()
                .title("⚠️ Posible infracción detectada")
                .color(ALERT_COLOR),
            |embed, (name, value)| embed.field(name, fit_field(&value), false),
        )
    }
}

/// Clips a field value to the embed limit. Values that fit are kept verbatim.
fn fit_field(value: &str) -> String {
    if value.is_empty() {
        return "(vacío)".to_string();
    }
    if value.chars().count() <= EMBED_FIELD_LIMIT {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(EMBED_FIELD_LIMIT - 1).collect();
    clipped.push('…');
    clipped
}

/// Destination for moderation alerts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn post(&self, alert: Alert) -> Result<()>;
}

/// Posts alerts as embeds to the administrator channel.
pub struct ChannelAlertSink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelAlertSink {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl AlertSink for ChannelAlertSink {
    async fn post(&self, alert: Alert) -> Result<()> {
        let message = CreateMessage::new().embed(alert.to_embed());
        self.channel_id.send_message(&self.http, message).await?;
        info!(
            "Posted moderation alert for user {} to channel {}",
            alert.author_id, self.channel_id
        );
        Ok(())
    }
}
