//! Poise slash commands for talking to the AI.

use log::info;
use poise::CreateReply;

use crate::bot::Data;
use crate::error::{BotError, Result};

use super::response::split_message;
use super::session::{ask_ai, reset_history};

/// Context type for chatbot commands.
type Context<'a> = poise::Context<'a, Data, BotError>;

/// Habla con la IA (con memoria)
#[poise::command(slash_command)]
pub async fn ia(
    ctx: Context<'_>,
    #[description = "Tu mensaje para la IA"] mensaje: String,
) -> Result<()> {
    ctx.defer().await?;

    let user_id = ctx.author().id;
    info!("/ia from {} ({user_id}): {mensaje}", ctx.author().tag());

    let reply = ask_ai(
        ctx.data().conversations(),
        ctx.data().provider(),
        user_id,
        &mensaje,
    )
    .await;

    for chunk in split_message(&reply) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Borra tu historial de conversación con la IA
#[poise::command(slash_command)]
pub async fn reset_ia(ctx: Context<'_>) -> Result<()> {
    let outcome = reset_history(ctx.data().conversations(), ctx.author().id);

    ctx.send(
        CreateReply::default()
            .content(outcome.message())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Get available chatbot commands.
#[must_use]
pub fn chatbot_commands() -> Vec<poise::Command<Data, BotError>> {
    vec![ia(), reset_ia()]
}
