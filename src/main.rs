use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use immo_chatbot::config::Config;
use immo_chatbot::routes;
use immo_chatbot::services::gateway::HttpGateway;
use immo_chatbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "immo_chatbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    if config.api_url.is_empty() {
        warn!("ESTIMATOR_API_URL is not set, backend calls use relative paths");
    }

    let gateway = Arc::new(HttpGateway::new(config.api_url.clone()));
    let state = Arc::new(AppState::new(config.clone(), gateway));

    let sessions = state.sessions.clone();
    let purge_interval = config.purge_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                info!(removed, "purged idle sessions");
            }
        }
    });

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, api = %config.api_url, "estimation chatbot listening");
    axum::serve(listener, app).await?;
    Ok(())
}
