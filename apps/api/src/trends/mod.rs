// Market-trends dashboard: career news and tech-employer stock data.
// Upstream calls go through providers::{news, market}, never reqwest directly.

pub mod handlers;
