use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use twilikt_server::config::ServerConfig;
use twilikt_server::twitter::{HttpBackend, TwitterService};
use twilikt_server::web::app_state::AppState;
use twilikt_server::web::router::build_router;

#[derive(Debug, Parser)]
#[command(version, about = "Manage Twitter list memberships from a web dashboard")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "twilikt.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args.config)?;

    if !config.twitter.credentials.is_complete() {
        warn!("Twitter credentials are incomplete; every session will fail to load");
    }

    let backend = HttpBackend::new(&config.twitter).context("failed to build Twitter client")?;
    let twitter = Arc::new(TwitterService::new(
        Arc::new(backend),
        info_span!("twitter"),
    ));

    // Not fatal: sessions report the failure on their own.
    match twitter.current_user().await {
        Ok(user) => info!(user = %user.display_name(), "Twitter credentials verified"),
        Err(e) => warn!(error = %e, "could not verify Twitter credentials"),
    }

    let app_state = Arc::new(AppState::new(
        twitter,
        config.sync.clone(),
        config.server.assets_dir.clone(),
    ));
    let app = build_router(app_state);

    info!("Twilikt server starting on {}", config.server.web_address);

    let listener = tokio::net::TcpListener::bind(&config.server.web_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.web_address))?;

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
