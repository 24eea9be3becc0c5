// =============================================================================
// Yahoo Finance REST client — v8 chart API
// =============================================================================
//
// One endpoint serves both halves of a snapshot:
//
//   GET {base}/v8/finance/chart/{symbol}?range={history_range}&interval=1d
//       => `meta` carries regularMarketPrice / regularMarketVolume and
//          `indicators.quote[0].close` is the nullable daily close series;
//          a snapshot is built from this one response
//   GET {base}/v8/finance/chart/{symbol}?range=1d&interval=1d
//       => standalone quote (FX, ETF basket) with previousClose in `meta`
//
// Unknown symbols come back as HTTP 404 with a `chart.error` body whose code
// is "Not Found"; that is mapped to `ProviderError::SymbolNotFound`.
// =============================================================================

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::ProviderError;
use crate::market_data::{MarketDataProvider, Quote};
use crate::types::PriceSeries;

/// Range used for standalone quote lookups. Yahoo only reports
/// `meta.previousClose` (the prior session) for the one-day range.
const QUOTE_RANGE: &str = "1d";

/// Longest upstream error body carried into `ProviderError::UpstreamStatus`.
const MAX_ERROR_BODY: usize = 200;

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_volume: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// =============================================================================
// Client
// =============================================================================

/// Yahoo Finance chart-API client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: Url,
    history_range: String,
    client: reqwest::Client,
}

impl YahooClient {
    /// Build a client against `base_url` (e.g. `https://query2.finance.yahoo.com`).
    ///
    /// `timeout` bounds every individual HTTP request. `history_range` is the
    /// Yahoo range token used for the close series (e.g. `3mo`).
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        history_range: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid upstream base url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("upstream base url '{base_url}' cannot be a base");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self {
            base_url,
            history_range: history_range.into(),
            client,
        })
    }

    /// `{base}/v8/finance/chart/{symbol}` with the symbol percent-encoded.
    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Malformed("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    /// GET the chart endpoint and return the first result block.
    #[instrument(skip(self), name = "yahoo::chart")]
    async fn chart(&self, symbol: &str, range: &str) -> Result<ChartData, ProviderError> {
        let url = self.chart_url(symbol)?;

        let resp = self
            .client
            .get(url)
            .query(&[("range", range), ("interval", "1d")])
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        Self::classify(symbol, status, &text)
    }

    /// Turn an HTTP status and body into the first chart result.
    ///
    /// A body that parses as a chart envelope wins over the status code, so a
    /// 404 carrying `chart.error` still reads as `SymbolNotFound`.
    fn classify(
        symbol: &str,
        status: StatusCode,
        body: &str,
    ) -> Result<ChartData, ProviderError> {
        match serde_json::from_str::<ChartResponse>(body) {
            Ok(parsed) => Self::first_result(symbol, parsed),
            Err(_) if !status.is_success() => Err(ProviderError::UpstreamStatus {
                status: status.as_u16(),
                body: truncate(body, MAX_ERROR_BODY),
            }),
            Err(e) => Err(ProviderError::Malformed(e.to_string())),
        }
    }

    /// Unwrap the `chart.result[0]` / `chart.error` envelope.
    fn first_result(symbol: &str, resp: ChartResponse) -> Result<ChartData, ProviderError> {
        if let Some(err) = resp.chart.error {
            return Err(if err.code == "Not Found" {
                ProviderError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }
            } else {
                ProviderError::Malformed(format!("{}: {}", err.code, err.description))
            });
        }

        resp.chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn quote_from_meta(symbol: &str, meta: ChartMeta) -> Quote {
        if meta.regular_market_price.is_none() {
            warn!(symbol, "chart meta has no regularMarketPrice");
        }
        Quote {
            symbol: meta.symbol.unwrap_or_else(|| symbol.to_string()),
            price: meta.regular_market_price,
            volume: meta.regular_market_volume,
            previous_close: meta.previous_close.or(meta.chart_previous_close),
        }
    }

    fn closes_from_indicators(
        indicators: Option<Indicators>,
    ) -> Result<PriceSeries, ProviderError> {
        indicators
            .and_then(|i| i.quote.into_iter().next())
            .map(|q| q.close)
            .ok_or_else(|| ProviderError::Malformed("chart has no quote indicators".into()))
    }

    /// Quote fields and close series from one chart result.
    fn split_chart(
        symbol: &str,
        data: ChartData,
    ) -> Result<(Quote, PriceSeries), ProviderError> {
        let ChartData { meta, indicators } = data;
        let closes = Self::closes_from_indicators(indicators)?;
        Ok((Self::quote_from_meta(symbol, meta), closes))
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let data = self.chart(symbol, QUOTE_RANGE).await?;
        let quote = Self::quote_from_meta(symbol, data.meta);
        debug!(symbol, price = ?quote.price, "quote fetched");
        Ok(quote)
    }

    async fn daily_closes(&self, symbol: &str) -> Result<PriceSeries, ProviderError> {
        let data = self.chart(symbol, &self.history_range).await?;
        let closes = Self::closes_from_indicators(data.indicators)?;
        debug!(symbol, count = closes.len(), "daily closes fetched");
        Ok(closes)
    }

    /// The history chart's `meta` already carries price and volume, so a
    /// snapshot needs a single request.
    async fn quote_and_closes(
        &self,
        symbol: &str,
    ) -> Result<(Quote, PriceSeries), ProviderError> {
        let data = self.chart(symbol, &self.history_range).await?;
        let (quote, closes) = Self::split_chart(symbol, data)?;
        debug!(symbol, price = ?quote.price, count = closes.len(), "chart fetched");
        Ok((quote, closes))
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url.as_str())
            .field("history_range", &self.history_range)
            .finish()
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
