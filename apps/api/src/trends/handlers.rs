//! Axum route handlers for the trends API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::providers::market::{
    normalize_ticker, StockOverview, StockQuote, DEFAULT_MOVERS, DEFAULT_SERIES_POINTS, WATCH_LIST,
};
use crate::providers::news::{Article, DEFAULT_MAX_ARTICLES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub max: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub days: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub articles: Vec<Article>,
}

#[derive(Debug, Serialize)]
pub struct MarketResponse {
    pub movers: Vec<StockQuote>,
}

/// GET /api/v1/trends/news
///
/// Tech and job-market headlines, newest first.
pub async fn handle_news(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<NewsResponse>, AppError> {
    let max = params.max.unwrap_or(DEFAULT_MAX_ARTICLES);
    let articles = state.news.career_news(max).await?;
    Ok(Json(NewsResponse { articles }))
}

/// GET /api/v1/trends/stocks/:ticker
///
/// Quote, daily series and company details for one ticker.
pub async fn handle_stock(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(params): Query<SeriesQuery>,
) -> Result<Json<StockOverview>, AppError> {
    let ticker =
        normalize_ticker(&ticker).map_err(|e| AppError::Validation(e.message().to_string()))?;
    let points = params.days.unwrap_or(DEFAULT_SERIES_POINTS);
    let overview = state.market.overview(&ticker, points).await?;
    Ok(Json(overview))
}

/// GET /api/v1/trends/market
///
/// Biggest percentage movers across the tech-employer watch list.
pub async fn handle_market(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<MarketResponse>, AppError> {
    let max = params.max.unwrap_or(DEFAULT_MOVERS).min(WATCH_LIST.len());
    let movers = state.market.top_movers(WATCH_LIST, max).await?;
    Ok(Json(MarketResponse { movers }))
}
