use std::time::Duration;

use anyhow::{Context, Result};

use crate::gateway::transport::DEFAULT_TIMEOUT;
use crate::providers::{chat, market, news};

/// Application configuration loaded from environment variables.
///
/// Provider keys are optional: a missing key disables that provider's
/// endpoints (they answer with a configuration error) instead of stopping
/// startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub polygon_api_key: Option<String>,
    pub request_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let request_timeout = match optional_env("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
                anyhow::ensure!(secs > 0, "REQUEST_TIMEOUT_SECS must be greater than zero");
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: optional_env(chat::PROVIDER.api_key_env_var),
            news_api_key: optional_env(news::PROVIDER.api_key_env_var),
            polygon_api_key: optional_env(market::PROVIDER.api_key_env_var),
            request_timeout,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
