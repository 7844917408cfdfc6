use anyhow::{Context, Result};
use liveavatar_core::config::GatewayArgs;
use liveavatar_core::gateway::{router, TokenGateway};
use liveavatar_core::telemetry::init_tracing;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayArgs::parse_config()?;
    let _log_guard = init_tracing(config.log_dir.as_deref())?;

    let listen_addr = config.listen_addr;
    let gateway = TokenGateway::from_config(config);
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;

    info!(target: "token_gateway", %listen_addr, "token gateway listening");
    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("token gateway server failed")?;
    info!(target: "token_gateway", "token gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: "token_gateway", %err, "failed to listen for shutdown signal");
    }
}
