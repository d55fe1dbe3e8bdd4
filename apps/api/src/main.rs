mod config;
mod db;
mod errors;
mod gateway;
mod guidance;
mod jobs;
mod models;
mod providers;
mod routes;
mod state;
mod trends;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::gateway::clock::{Clock, SystemClock};
use crate::gateway::provider::ProviderConfig;
use crate::gateway::transport::{HttpTransport, ReqwestTransport};
use crate::gateway::Gateway;
use crate::providers::chat::{self, ChatClient};
use crate::providers::market::{self, MarketClient};
use crate::providers::news::{self, NewsClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url)?;
    run_migrations(&db).await?;

    // One transport and clock shared by every provider gateway
    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestTransport::new().context("failed to build HTTP client")?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = |provider: ProviderConfig, key: &Option<String>| {
        let gateway = Gateway::new(
            provider,
            key.clone(),
            transport.clone(),
            clock.clone(),
            config.request_timeout,
        );
        if gateway.has_key() {
            info!("{} gateway ready", gateway.provider().name);
        } else {
            warn!(
                "{} is not set; {} endpoints will return a configuration error",
                provider.api_key_env_var, provider.name
            );
        }
        Arc::new(gateway)
    };

    let chat = ChatClient::new(gateway(chat::PROVIDER, &config.gemini_api_key));
    let news = NewsClient::new(gateway(news::PROVIDER, &config.news_api_key));
    let market = MarketClient::new(gateway(market::PROVIDER, &config.polygon_api_key));
    info!("Provider gateways initialized (chat model: {})", chat::MODEL);

    // Build app state
    let state = AppState {
        db,
        chat,
        news,
        market,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
