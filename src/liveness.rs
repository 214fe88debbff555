//! Keep-alive HTTP endpoint for external uptime monitors.

use std::net::{Ipv4Addr, SocketAddr};
use std::thread::{self, JoinHandle};

use axum::{Router, routing::get};
use log::{error, info};
use tokio::net::TcpListener;

use crate::error::{BotError, Result};

pub const LIVENESS_BODY: &str = "online";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { LIVENESS_BODY }))
}

pub async fn serve(port: u16) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| BotError::Liveness(format!("cannot bind {addr}: {e}")))?;

    info!("Liveness endpoint listening on {addr}");
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Runs the endpoint on its own OS thread with a private single-threaded
/// runtime, sharing nothing with the bot.
pub fn spawn(port: u16) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("liveness".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start liveness runtime: {e}");
                    return;
                }
            };

            if let Err(e) = runtime.block_on(serve(port)) {
                error!("Liveness endpoint stopped: {e}");
            }
        })?;
    Ok(handle)
}
