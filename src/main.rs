#[tokio::main]
async fn main() -> moderia::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("moderia=info,serenity=warn"),
    )
    .init();
    log::info!("Starting moderia Discord bot");

    match moderia::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Error CRÍTICO al ejecutar el bot: {e}");
            Err(e)
        }
    }
}
