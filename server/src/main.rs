use anyhow::Context;
use clap::Parser;
use haggle_server::config::Config;
use haggle_server::{router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("haggle_server=info,tower_http=info")),
        )
        .init();

    let config = Config::parse();

    let state = AppState::open(&config).await.with_context(|| {
        format!(
            "Failed to prepare conversations dir {}",
            config.conversations_path().display()
        )
    })?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Marketplace listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .await
        .context("Server failed")?;
    Ok(())
}
