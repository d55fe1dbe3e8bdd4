//! Polygon adapter: quotes, daily bars and company reference data for the
//! market-trends dashboard.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::warn;

use crate::gateway::aggregate::degrade;
use crate::gateway::error::{ClassifiedError, ErrorKind};
use crate::gateway::provider::{AuthStyle, ProviderConfig};
use crate::gateway::Gateway;

pub const PROVIDER: ProviderConfig = ProviderConfig {
    name: "polygon",
    base_url: "https://api.polygon.io",
    api_key_env_var: "POLYGON_API_KEY",
    auth_style: AuthStyle::HeaderBearer,
    cache_window: Some(Duration::from_secs(15 * 60)),
    status_overrides: &[],
    embedded_error: detect_error,
};

/// Large tech employers tracked on the market-trends page.
pub const WATCH_LIST: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "CRM", "ORCL", "IBM", "ADBE",
];

pub const DEFAULT_SERIES_POINTS: usize = 30;
pub const MAX_SERIES_POINTS: usize = 365;
pub const DEFAULT_MOVERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockQuote {
    pub ticker: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetails {
    pub ticker: String,
    pub name: String,
    pub description: Option<String>,
    pub market_cap: Option<f64>,
    pub homepage_url: Option<String>,
    pub total_employees: Option<u64>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockOverview {
    pub ticker: String,
    pub quote: Option<StockQuote>,
    pub series: Vec<StockPoint>,
    pub details: Option<CompanyDetails>,
}

/// Upper-cases and checks a ticker symbol before it is put in a URL path.
pub fn normalize_ticker(raw: &str) -> Result<String, ClassifiedError> {
    let ticker = raw.trim().to_ascii_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= 10
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if valid {
        Ok(ticker)
    } else {
        Err(ClassifiedError::bad_parameters(format!("invalid ticker symbol '{raw}'")))
    }
}

/// `change = price - previous_close`, `change_percent = change / previous_close * 100`.
/// A zero previous close yields a zero percentage.
pub fn derive_change(price: f64, previous_close: f64) -> (f64, f64) {
    let change = price - previous_close;
    let change_percent = if previous_close == 0.0 {
        0.0
    } else {
        change / previous_close * 100.0
    };
    (change, change_percent)
}

#[derive(Clone)]
pub struct MarketClient {
    gateway: Arc<Gateway>,
}

impl MarketClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn quote(&self, ticker: &str) -> Result<StockQuote, ClassifiedError> {
        let ticker = normalize_ticker(ticker)?;
        let path = format!("/v2/snapshot/locale/us/markets/stocks/tickers/{ticker}");
        let payload = self.gateway.get(&path, &[], "snapshot").await?;
        shape_quote(&payload)
    }

    /// The most recent `points` daily bars, oldest first.
    pub async fn daily_series(
        &self,
        ticker: &str,
        points: usize,
    ) -> Result<Vec<StockPoint>, ClassifiedError> {
        let ticker = normalize_ticker(ticker)?;
        let points = points.clamp(1, MAX_SERIES_POINTS);

        // Calendar lookback wide enough to cover weekends and holidays.
        let to = self.gateway.today();
        let from = to - chrono::Duration::days((points * 7 / 5 + 10) as i64);
        let path = format!(
            "/v2/aggs/ticker/{ticker}/range/1/day/{}/{}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        let params = [
            ("adjusted", "true".to_string()),
            ("sort", "desc".to_string()),
            ("limit", points.to_string()),
        ];

        let payload = self.gateway.get(&path, &params, "daily_aggregates").await?;
        shape_series(&payload, points)
    }

    pub async fn company_details(&self, ticker: &str) -> Result<CompanyDetails, ClassifiedError> {
        let ticker = normalize_ticker(ticker)?;
        let path = format!("/v3/reference/tickers/{ticker}");
        let payload = self.gateway.get(&path, &[], "ticker_details").await?;
        shape_details(&payload)
    }

    /// Quote, series and company details fetched together.
    ///
    /// Each part degrades independently; fails only if the ticker is invalid
    /// or every part failed.
    pub async fn overview(
        &self,
        ticker: &str,
        points: usize,
    ) -> Result<StockOverview, ClassifiedError> {
        let ticker = normalize_ticker(ticker)?;
        let (quote, series, details) = tokio::join!(
            self.quote(&ticker),
            self.daily_series(&ticker, points),
            self.company_details(&ticker),
        );

        if let (Err(e), Err(_), Err(_)) = (&quote, &series, &details) {
            return Err(e.clone());
        }

        Ok(StockOverview {
            ticker,
            quote: degrade("quote", quote.map(Some)),
            series: degrade("daily_series", series),
            details: degrade("company_details", details.map(Some)),
        })
    }

    /// Quotes for `tickers`, largest percentage gain first, at most `max`.
    ///
    /// Tickers whose quote fails are skipped. Errors only when every quote failed.
    pub async fn top_movers(
        &self,
        tickers: &[&str],
        max: usize,
    ) -> Result<Vec<StockQuote>, ClassifiedError> {
        let mut set = JoinSet::new();
        for ticker in tickers {
            let client = self.clone();
            let ticker = ticker.to_string();
            set.spawn(async move { client.quote(&ticker).await });
        }

        let mut quotes = Vec::with_capacity(tickers.len());
        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(quote)) => quotes.push(quote),
                Ok(Err(e)) => {
                    warn!(kind = %e.kind(), "skipping ticker in top movers: {}", e.message());
                    first_error.get_or_insert(e);
                }
                Err(e) => warn!("quote task aborted: {e}"),
            }
        }

        if quotes.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Ok(rank_movers(quotes, max))
    }
}

/// Sorts by `change_percent` descending (ticker as tie-break) and truncates.
pub fn rank_movers(mut quotes: Vec<StockQuote>, max: usize) -> Vec<StockQuote> {
    quotes.sort_by(|a, b| {
        b.change_percent
            .total_cmp(&a.change_percent)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    quotes.truncate(max.max(1));
    quotes
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    ticker: Option<RawTickerSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTickerSnapshot {
    ticker: String,
    #[serde(default)]
    day: RawDay,
    #[serde(default)]
    prev_day: RawDay,
    last_trade: Option<RawTrade>,
    /// Nanoseconds since the epoch.
    updated: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDay {
    #[serde(default)]
    c: f64,
    #[serde(default)]
    v: f64,
}

#[derive(Debug, Deserialize)]
struct RawTrade {
    p: f64,
}

pub fn shape_quote(payload: &Value) -> Result<StockQuote, ClassifiedError> {
    let raw = RawSnapshot::deserialize(payload)
        .map_err(|e| ClassifiedError::unknown(format!("unexpected polygon snapshot: {e}")))?
        .ticker
        .ok_or_else(|| ClassifiedError::unknown("polygon snapshot has no ticker data"))?;

    // Before the open, today's bar is all zeros.
    let price = raw
        .last_trade
        .map(|t| t.p)
        .filter(|p| *p > 0.0)
        .or(Some(raw.day.c).filter(|c| *c > 0.0))
        .unwrap_or(raw.prev_day.c);
    let previous_close = raw.prev_day.c;
    let (change, change_percent) = derive_change(price, previous_close);
    let volume = if raw.day.v > 0.0 { raw.day.v } else { raw.prev_day.v };

    Ok(StockQuote {
        ticker: raw.ticker,
        price,
        previous_close,
        change,
        change_percent,
        volume: volume as u64,
        updated_at: raw.updated.and_then(|ns| {
            DateTime::from_timestamp(
                ns.div_euclid(1_000_000_000),
                ns.rem_euclid(1_000_000_000) as u32,
            )
        }),
    })
}

#[derive(Debug, Deserialize)]
struct RawAggregates {
    #[serde(default)]
    results: Vec<RawBar>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    /// Milliseconds since the epoch at the start of the bar.
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}

/// Daily bars in ascending date order, keeping the most recent `max`.
pub fn shape_series(payload: &Value, max: usize) -> Result<Vec<StockPoint>, ClassifiedError> {
    let raw = RawAggregates::deserialize(payload)
        .map_err(|e| ClassifiedError::unknown(format!("unexpected polygon aggregates: {e}")))?;

    let mut points: Vec<StockPoint> = raw
        .results
        .into_iter()
        .filter_map(|bar| {
            let date = DateTime::from_timestamp(bar.t.div_euclid(1000), 0)?.date_naive();
            Some(StockPoint {
                date,
                open: bar.o,
                high: bar.h,
                low: bar.l,
                close: bar.c,
                volume: bar.v as u64,
            })
        })
        .collect();

    points.sort_by(|a, b| a.date.cmp(&b.date));
    if points.len() > max {
        points.drain(..points.len() - max);
    }
    Ok(points)
}

#[derive(Debug, Deserialize)]
struct RawDetailsEnvelope {
    results: Option<RawDetails>,
}

#[derive(Debug, Deserialize)]
struct RawDetails {
    ticker: String,
    name: String,
    description: Option<String>,
    market_cap: Option<f64>,
    homepage_url: Option<String>,
    total_employees: Option<u64>,
    sic_description: Option<String>,
}

pub fn shape_details(payload: &Value) -> Result<CompanyDetails, ClassifiedError> {
    let raw = RawDetailsEnvelope::deserialize(payload)
        .map_err(|e| ClassifiedError::unknown(format!("unexpected polygon ticker details: {e}")))?
        .results
        .ok_or_else(|| ClassifiedError::unknown("polygon ticker details are empty"))?;

    Ok(CompanyDetails {
        ticker: raw.ticker,
        name: raw.name,
        description: raw.description,
        market_cap: raw.market_cap,
        homepage_url: raw.homepage_url,
        total_employees: raw.total_employees,
        industry: raw.sic_description,
    })
}

/// Polygon flags failures in the body with `status` `ERROR` or `NOT_AUTHORIZED`.
fn detect_error(payload: &Value) -> Option<ClassifiedError> {
    let status = payload.get("status").and_then(Value::as_str)?;
    let message = payload
        .get("error")
        .or_else(|| payload.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("polygon reported an error");

    let kind = match status {
        "NOT_AUTHORIZED" => ErrorKind::KeyInvalid,
        "ERROR" => ErrorKind::Unknown,
        _ => return None,
    };
    Some(ClassifiedError::new(kind, format!("polygon {status}: {message}")))
}
