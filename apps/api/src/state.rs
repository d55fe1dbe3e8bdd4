use sqlx::PgPool;

use crate::config::Config;
use crate::providers::chat::ChatClient;
use crate::providers::market::MarketClient;
use crate::providers::news::NewsClient;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Each provider client wraps its own gateway, so caches are per provider and
/// shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub chat: ChatClient,
    pub news: NewsClient,
    pub market: MarketClient,
    pub config: Config,
}
