use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::{debug, error, info};
use poise::serenity_prelude::{ChannelId, GuildId};

use crate::error::{BotError, Result};

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_RULES_PATH: &str = "reglas.txt";
const DEFAULT_LIVENESS_PORT: u16 = 8080;
const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Where moderation alerts go. Only present when both ids are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationTarget {
    pub guild_id: GuildId,
    pub admin_channel_id: ChannelId,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub google_api_key: String,
    pub gemini_model: String,
    /// Alternative API root, e.g. a regional endpoint or proxy.
    pub gemini_api_base: Option<String>,
    pub moderation: Option<ModerationTarget>,
    pub rules_path: PathBuf,
    pub liveness_port: u16,
    pub history_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Every missing required variable is collected before failing so the
    /// operator sees the full list at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let discord_token = read("DISCORD_TOKEN");
        let google_api_key = read("GOOGLE_API_KEY");
        let guild_id = read("GUILD_ID");
        let admin_channel_id = read("ADMIN_CHANNEL_ID");

        let mut missing = Vec::new();
        if discord_token.is_none() {
            missing.push("DISCORD_TOKEN");
        }
        if google_api_key.is_none() {
            missing.push("GOOGLE_API_KEY");
        }
        // Moderation needs both ids; one without the other is a misconfiguration.
        match (&guild_id, &admin_channel_id) {
            (Some(_), None) => missing.push("ADMIN_CHANNEL_ID"),
            (None, Some(_)) => missing.push("GUILD_ID"),
            _ => {}
        }

        let (Some(discord_token), Some(google_api_key)) = (discord_token, google_api_key) else {
            error!("Missing required environment variables: {}", missing.join(", "));
            return Err(BotError::MissingEnv(missing));
        };
        if !missing.is_empty() {
            error!("Missing required environment variables: {}", missing.join(", "));
            return Err(BotError::MissingEnv(missing));
        }

        let moderation = match (guild_id, admin_channel_id) {
            (Some(guild_id), Some(admin_channel_id)) => Some(ModerationTarget {
                guild_id: GuildId::new(parse_id("GUILD_ID", &guild_id)?),
                admin_channel_id: ChannelId::new(parse_id("ADMIN_CHANNEL_ID", &admin_channel_id)?),
            }),
            _ => None,
        };

        let gemini_model = read("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_api_base = read("GEMINI_API_BASE");
        let rules_path = read("RULES_PATH").map_or_else(|| PathBuf::from(DEFAULT_RULES_PATH), PathBuf::from);
        let liveness_port = read("LIVENESS_PORT")
            .map(|value| parse_value("LIVENESS_PORT", &value))
            .transpose()?
            .unwrap_or(DEFAULT_LIVENESS_PORT);
        let history_capacity = read("HISTORY_CAPACITY")
            .map(|value| parse_value("HISTORY_CAPACITY", &value))
            .transpose()?
            .unwrap_or(DEFAULT_HISTORY_CAPACITY);

        info!("Configuration loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!("Google API key length: {} characters", google_api_key.len());
        debug!("Gemini model: {gemini_model}");
        debug!("Moderation target: {moderation:?}");
        debug!("Rules path: {}", rules_path.display());

        Ok(Self {
            discord_token,
            google_api_key,
            gemini_model,
            gemini_api_base,
            moderation,
            rules_path,
            liveness_port,
            history_capacity,
        })
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BotError::Config(format!("{name} has an invalid value: {value}")))
}

fn parse_id(name: &str, value: &str) -> Result<u64> {
    match parse_value::<u64>(name, value)? {
        0 => Err(BotError::Config(format!("{name} must be a non-zero id"))),
        id => Ok(id),
    }
}
