//! NewsAPI adapter: technology and job-market headlines for the trends page.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::aggregate::{merge_sorted, settle};
use crate::gateway::error::{ClassifiedError, ErrorKind};
use crate::gateway::provider::{AuthStyle, ProviderConfig};
use crate::gateway::Gateway;

pub const PROVIDER: ProviderConfig = ProviderConfig {
    name: "newsapi",
    base_url: "https://newsapi.org/v2",
    api_key_env_var: "NEWS_API_KEY",
    auth_style: AuthStyle::HeaderCustomKey("X-Api-Key"),
    cache_window: Some(Duration::from_secs(30 * 60)),
    // 426: the key's plan does not allow this request.
    status_overrides: &[(426, ErrorKind::KeyInvalid)],
    embedded_error: detect_error,
};

pub const DEFAULT_MAX_ARTICLES: usize = 10;
pub const MAX_ARTICLES: usize = 50;

const TECH_QUERY: &str = "technology AND (software OR \"artificial intelligence\" OR startups)";
const JOB_MARKET_QUERY: &str = "jobs AND (hiring OR layoffs OR \"job market\" OR careers)";
const LOOKBACK_DAYS: i64 = 7;
const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    Technology,
    JobMarket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub category: NewsCategory,
}

#[derive(Debug, Clone)]
pub struct NewsQuery {
    pub query: String,
    pub language: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub page_size: u32,
}

impl NewsQuery {
    /// English articles matching `query` over the last week.
    pub fn recent(query: &str, today: NaiveDate) -> Self {
        Self {
            query: query.to_string(),
            language: "en".to_string(),
            from: today - chrono::Duration::days(LOOKBACK_DAYS),
            to: today,
            page_size: PAGE_SIZE,
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query.clone()),
            ("language", self.language.clone()),
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", self.page_size.to_string()),
        ]
    }
}

#[derive(Clone)]
pub struct NewsClient {
    gateway: Arc<Gateway>,
}

impl NewsClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn search(
        &self,
        query: &NewsQuery,
        category: NewsCategory,
    ) -> Result<Vec<Article>, ClassifiedError> {
        let payload = self
            .gateway
            .get("/everything", &query.params(), "everything")
            .await?;
        shape_articles(&payload, category)
    }

    pub async fn tech_news(&self) -> Result<Vec<Article>, ClassifiedError> {
        let query = NewsQuery::recent(TECH_QUERY, self.gateway.today());
        self.search(&query, NewsCategory::Technology).await
    }

    pub async fn job_market_news(&self) -> Result<Vec<Article>, ClassifiedError> {
        let query = NewsQuery::recent(JOB_MARKET_QUERY, self.gateway.today());
        self.search(&query, NewsCategory::JobMarket).await
    }

    /// Tech and job-market headlines combined, newest first, at most `max`.
    ///
    /// One failing feed does not blank the other. Errors only when both fail.
    pub async fn career_news(&self, max: usize) -> Result<Vec<Article>, ClassifiedError> {
        let (tech, jobs) = tokio::join!(self.tech_news(), self.job_market_news());
        let batches = settle(vec![("tech_news", tech), ("job_market_news", jobs)])?;
        Ok(combine_feeds(batches, max))
    }
}

/// Merges feeds newest-first, drops repeated URLs, keeps at most `max` (clamped).
pub fn combine_feeds(batches: Vec<Vec<Article>>, max: usize) -> Vec<Article> {
    let max = max.clamp(1, MAX_ARTICLES);
    let mut seen = HashSet::new();
    let mut merged = merge_sorted(
        batches,
        |a, b| b.published_at.cmp(&a.published_at),
        usize::MAX,
    );
    merged.retain(|article| seen.insert(article.url.clone()));
    merged.truncate(max);
    merged
}

#[derive(Debug, Deserialize)]
struct RawEverything {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: RawSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Projects an `/everything` payload into articles, in provider order.
///
/// Articles without a title, URL or parseable publish time are dropped, as are
/// the `[Removed]` placeholders NewsAPI substitutes for taken-down stories.
pub fn shape_articles(
    payload: &Value,
    category: NewsCategory,
) -> Result<Vec<Article>, ClassifiedError> {
    let raw = RawEverything::deserialize(payload)
        .map_err(|e| ClassifiedError::unknown(format!("unexpected newsapi payload: {e}")))?;

    let articles = raw
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
            let url = a.url.filter(|u| !u.is_empty())?;
            let published_at = DateTime::parse_from_rfc3339(a.published_at.as_deref()?)
                .ok()?
                .with_timezone(&Utc);
            Some(Article {
                title,
                description: a.description.filter(|d| !d.trim().is_empty()),
                source: a.source.name.unwrap_or_else(|| "Unknown".to_string()),
                url,
                published_at,
                image_url: a.url_to_image,
                category,
            })
        })
        .collect();

    Ok(articles)
}

/// NewsAPI reports some failures as `{"status":"error","code":...}` with HTTP 200.
fn detect_error(payload: &Value) -> Option<ClassifiedError> {
    if payload.get("status").and_then(Value::as_str) != Some("error") {
        return None;
    }

    let code = payload.get("code").and_then(Value::as_str).unwrap_or("");
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("newsapi reported an error");

    let kind = match code {
        "apiKeyMissing" => ErrorKind::KeyMissing,
        "apiKeyInvalid" | "apiKeyDisabled" => ErrorKind::KeyInvalid,
        "apiKeyExhausted" | "rateLimited" => ErrorKind::RateLimited,
        "parameterInvalid" | "parametersMissing" | "sourcesTooMany" | "sourceDoesNotExist" => {
            ErrorKind::BadParameters
        }
        "unexpectedError" => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Unknown,
    };
    Some(ClassifiedError::new(kind, format!("newsapi {code}: {message}")))
}
