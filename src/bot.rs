//! Discord bot wiring and event handling.

use std::sync::Arc;

use log::{debug, error, info, warn};
use poise::{
    Framework, FrameworkError, FrameworkOptions, builtins,
    serenity_prelude::{ClientBuilder, Context, FullEvent, GatewayIntents},
};

use crate::ai::AiProvider;
use crate::chatbot::chatbot_commands;
use crate::config::{Config, ModerationTarget};
use crate::conversation::ConversationStore;
use crate::error::{BotError, Result};
use crate::gemini::GeminiClient;
use crate::liveness;
use crate::moderation::{ChannelAlertSink, Moderator, ObservedMessage, load_rules};

pub struct Data {
    provider: Arc<dyn AiProvider>,
    conversations: ConversationStore,
    moderator: Option<Moderator>,
}

impl Data {
    pub fn provider(&self) -> &dyn AiProvider {
        self.provider.as_ref()
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn moderator(&self) -> Option<&Moderator> {
        self.moderator.as_ref()
    }
}

/// Run the Discord bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    liveness::spawn(config.liveness_port)?;

    debug!("Initializing Gemini client");
    let gemini = match &config.gemini_api_base {
        Some(base_url) => GeminiClient::with_base_url(
            config.google_api_key.clone(),
            &config.gemini_model,
            base_url,
        )?,
        None => GeminiClient::new(config.google_api_key.clone(), &config.gemini_model)?,
    };
    let provider: Arc<dyn AiProvider> = Arc::new(gemini);

    let rules = load_rules(&config.rules_path);
    let commands = chatbot_commands();
    let command_names: Vec<String> = commands.iter().map(|cmd| cmd.name.clone()).collect();
    let moderation_target = config.moderation;
    let history_capacity = config.history_capacity;

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands,
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("¡Bot conectado como {}!", ready.user.tag());

                let commands = &framework.options().commands;
                match moderation_target {
                    Some(target) => {
                        debug!("Registering commands in guild {}", target.guild_id);
                        builtins::register_in_guild(ctx, commands, target.guild_id).await?;
                    }
                    None => {
                        debug!("Registering commands globally");
                        builtins::register_globally(ctx, commands).await?;
                    }
                }
                info!("Comandos sincronizados.");

                let target = verify_admin_channel(ctx, moderation_target).await;
                Ok(Data {
                    provider,
                    conversations: ConversationStore::new(history_capacity),
                    moderator: Moderator::new(rules, target, command_names),
                })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
            shard_manager.shutdown_all().await;
        }
    }

    Ok(())
}

/// Drops the moderation target when the administrator channel cannot be resolved.
async fn verify_admin_channel(
    ctx: &Context,
    target: Option<ModerationTarget>,
) -> Option<ModerationTarget> {
    let target = target?;
    match target.admin_channel_id.to_channel(ctx).await {
        Ok(_) => Some(target),
        Err(e) => {
            warn!(
                "Administrator channel {} is not reachable: {e}",
                target.admin_channel_id
            );
            None
        }
    }
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> Result<()> {
    let FullEvent::Message { new_message } = event else {
        return Ok(());
    };
    let Some(moderator) = data.moderator() else {
        return Ok(());
    };

    let bot_user_id = ctx.cache.current_user().id;
    if !moderator.should_review(new_message, bot_user_id) {
        return Ok(());
    }

    debug!(
        "Reviewing message {} from {} in channel {}",
        new_message.id,
        new_message.author.tag(),
        new_message.channel_id
    );

    let sink = ChannelAlertSink::new(Arc::clone(&ctx.http), moderator.target().admin_channel_id);
    let outcome = moderator
        .review(data.provider(), &sink, &ObservedMessage::from(new_message))
        .await;
    debug!("Moderation outcome for {}: {outcome:?}", new_message.id);

    Ok(())
}

async fn on_error(error: FrameworkError<'_, Data, BotError>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command /{}: {error}", ctx.command().name);
        }
        FrameworkError::EventHandler { error, event, .. } => {
            error!("Error handling {} event: {error}", event.snake_case_name());
        }
        other => {
            if let Err(e) = builtins::on_error(other).await {
                error!("Error while handling framework error: {e}");
            }
        }
    }
}
