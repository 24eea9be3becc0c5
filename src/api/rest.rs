// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Read-only JSON endpoints over the market-data provider:
//
//   GET /health
//   GET /stock?symbol=S            GET /multi-stock?symbols=A,B
//   GET /score?symbol=S            GET /multi-score?symbols=A,B
//   GET /trend?symbols=A,B
//   GET /forex?symbol=EURUSD
//   GET /etf
//
// Missing parameters are 400, provider failures are 500. Batch endpoints
// always return one entry per requested symbol, in request order, with
// failures inlined as `{symbol, error}`.
//
// CORS is permissive; the service is meant to sit behind a dashboard.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::error::{ApiError, ProviderError};
use crate::fetch::{fetch_many, fetch_snapshot, quote_many, with_timeout};
use crate::market_data::Quote;
use crate::signals::{classify_trend, score_snapshot};
use crate::types::{
    BatchEntry, BatchResponse, EtfQuote, ForexQuote, ScoredSnapshot, Snapshot, SymbolError,
    TrendRow,
};

/// Yahoo-style suffix for spot FX pairs.
const FX_SUFFIX: &str = "=X";

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/stock", get(stock))
        .route("/multi-stock", get(multi_stock))
        .route("/score", get(score))
        .route("/multi-score", get(multi_score))
        .route("/trend", get(trend))
        .route("/forex", get(forex))
        .route("/etf", get(etf))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Query parameters
// =============================================================================

#[derive(Debug, Deserialize)]
struct SymbolQuery {
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SymbolsQuery {
    symbols: Option<String>,
}

/// Trim and uppercase a single `symbol` parameter.
fn parse_symbol(raw: Option<String>) -> Result<String, ApiError> {
    raw.map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingParameter("symbol"))
}

/// Split a comma-separated `symbols` parameter, preserving order.
fn parse_symbols(raw: Option<String>, max: usize) -> Result<Vec<String>, ApiError> {
    let symbols: Vec<String> = raw
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ApiError::MissingParameter("symbols"));
    }
    if symbols.len() > max {
        return Err(ApiError::InvalidParameter {
            name: "symbols",
            reason: format!("{} symbols requested, at most {max} allowed", symbols.len()),
        });
    }
    Ok(symbols)
}

/// Turn a per-symbol result into a batch slot.
fn entry<T, U>(
    symbol: String,
    result: Result<T, ProviderError>,
    map: impl FnOnce(T) -> U,
) -> BatchEntry<U> {
    match result {
        Ok(value) => BatchEntry::Ok(map(value)),
        Err(e) => BatchEntry::Err(SymbolError {
            symbol,
            error: e.to_string(),
        }),
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Snapshots
// =============================================================================

async fn stock(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> Result<Json<Snapshot>, ApiError> {
    let symbol = parse_symbol(q.symbol)?;
    let snapshot = fetch_snapshot(state.provider.as_ref(), &symbol, state.symbol_timeout())
        .await
        .map_err(|e| {
            warn!(symbol = %symbol, error = %e, "stock lookup failed");
            ApiError::provider(&symbol, e)
        })?;
    Ok(Json(snapshot))
}

async fn multi_stock(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolsQuery>,
) -> Result<Json<BatchResponse<BatchEntry<Snapshot>>>, ApiError> {
    let symbols = parse_symbols(q.symbols, state.config.max_batch_symbols)?;
    info!(count = symbols.len(), "multi-stock request");

    let results = fetch_many(state.provider.clone(), &symbols, state.symbol_timeout())
        .await
        .into_iter()
        .map(|(symbol, result)| entry(symbol, result, |s| s))
        .collect();

    Ok(Json(BatchResponse { results }))
}

// =============================================================================
// Scores
// =============================================================================

/// Body of a failed `/score` lookup; shaped like a score so clients can
/// render it without a separate error path.
#[derive(Serialize)]
struct FailedScore {
    symbol: String,
    score: u32,
    judgment: &'static str,
    comments: Vec<String>,
}

fn scored(snapshot: Snapshot) -> ScoredSnapshot {
    let result = score_snapshot(&snapshot);
    ScoredSnapshot::new(snapshot, result)
}

async fn score(State(state): State<Arc<AppState>>, Query(q): Query<SymbolQuery>) -> Response {
    let symbol = match parse_symbol(q.symbol) {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };

    match fetch_snapshot(state.provider.as_ref(), &symbol, state.symbol_timeout()).await {
        Ok(snapshot) => {
            let body = scored(snapshot);
            info!(symbol = %symbol, score = body.score, judgment = %body.judgment, "scored");
            Json(body).into_response()
        }
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "score lookup failed");
            let body = FailedScore {
                symbol,
                score: 0,
                judgment: "failed",
                comments: vec![e.to_string()],
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn multi_score(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolsQuery>,
) -> Result<Json<BatchResponse<BatchEntry<ScoredSnapshot>>>, ApiError> {
    let symbols = parse_symbols(q.symbols, state.config.max_batch_symbols)?;
    info!(count = symbols.len(), "multi-score request");

    let results = fetch_many(state.provider.clone(), &symbols, state.symbol_timeout())
        .await
        .into_iter()
        .map(|(symbol, result)| entry(symbol, result, scored))
        .collect();

    Ok(Json(BatchResponse { results }))
}

// =============================================================================
// Trend
// =============================================================================

async fn trend(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolsQuery>,
) -> Result<Json<BatchResponse<BatchEntry<TrendRow>>>, ApiError> {
    let symbols = parse_symbols(q.symbols, state.config.max_batch_symbols)?;

    let results = fetch_many(state.provider.clone(), &symbols, state.symbol_timeout())
        .await
        .into_iter()
        .map(|(symbol, result)| {
            entry(symbol, result, |s| TrendRow {
                trend: classify_trend(s.price, s.ma_5, s.ma_25),
                symbol: s.symbol,
                price: s.price,
                ma_5: s.ma_5,
                ma_25: s.ma_25,
            })
        })
        .collect();

    Ok(Json(BatchResponse { results }))
}

// =============================================================================
// Forex
// =============================================================================

/// `EURUSD` => `EURUSD=X`; already-suffixed pairs pass through.
fn fx_ticker(pair: &str) -> String {
    if pair.ends_with(FX_SUFFIX) {
        pair.to_string()
    } else {
        format!("{pair}{FX_SUFFIX}")
    }
}

async fn forex(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> Result<Json<ForexQuote>, ApiError> {
    let symbol = parse_symbol(q.symbol)?;
    let ticker = fx_ticker(&symbol);

    let quote = with_timeout(
        &ticker,
        state.symbol_timeout(),
        state.provider.quote(&ticker),
    )
    .await
    .map_err(|e| {
        warn!(symbol = %symbol, error = %e, "forex lookup failed");
        ApiError::provider(&symbol, e)
    })?;

    Ok(Json(ForexQuote {
        symbol,
        price: quote.price,
    }))
}

// =============================================================================
// ETF basket
// =============================================================================

fn etf_line(quote: Quote) -> EtfQuote {
    EtfQuote {
        price: quote.price,
        change: quote.change(),
        change_percent: quote.change_percent(),
        previous_close: quote.previous_close,
        symbol: quote.symbol,
    }
}

async fn etf(State(state): State<Arc<AppState>>) -> Json<BatchResponse<BatchEntry<EtfQuote>>> {
    let basket = &state.config.etf_basket;

    let results = quote_many(state.provider.clone(), basket, state.symbol_timeout())
        .await
        .into_iter()
        .map(|(symbol, result)| entry(symbol, result, etf_line))
        .collect();

    Json(BatchResponse { results })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::{rising, StubProvider};
    use crate::runtime_config::ServiceConfig;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn falling(start: f64, n: usize) -> Vec<Option<f64>> {
        (0..n).map(|i| Some(start - i as f64)).collect()
    }

    fn app() -> Router {
        let mut stub = StubProvider::default()
            // Price above a rising MA stack, but RSI pinned at 100 => 0+5+5.
            .with_symbol("AAPL", 200.0, 60_000_000.0, 195.0, rising(100.0, 40))
            // Falling closes => RSI 0, price below falling MAs => 5+0+3.
            .with_symbol("BEAR", 10.0, 500_000.0, 11.0, falling(100.0, 40))
            .with_symbol("EURUSD=X", 1.085, 0.0, 1.08, rising(1.0, 5))
            .with_symbol("SPY", 510.0, 1.0, 500.0, rising(1.0, 5))
            .with_symbol("QQQ", 440.0, 1.0, 0.0, rising(1.0, 5));
        stub.quotes.get_mut("EURUSD=X").unwrap().volume = None;

        let mut config = ServiceConfig::default();
        config.etf_basket = vec!["SPY".into(), "QQQ".into(), "GONE".into()];
        config.max_batch_symbols = 3;

        router(Arc::new(AppState::new(config, Arc::new(stub))))
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let resp = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn symbol_params_are_normalised() {
        assert_eq!(parse_symbol(Some(" aapl ".into())).unwrap(), "AAPL");
        assert!(parse_symbol(Some("   ".into())).is_err());
        assert!(parse_symbol(None).is_err());

        let syms = parse_symbols(Some("msft, ,aapl,msft".into()), 10).unwrap();
        assert_eq!(syms, vec!["MSFT", "AAPL", "MSFT"]);
        assert!(matches!(
            parse_symbols(Some(",,".into()), 10),
            Err(ApiError::MissingParameter("symbols"))
        ));
        assert!(matches!(
            parse_symbols(Some("A,B,C".into()), 2),
            Err(ApiError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn fx_ticker_adds_suffix_once() {
        assert_eq!(fx_ticker("EURUSD"), "EURUSD=X");
        assert_eq!(fx_ticker("EURUSD=X"), "EURUSD=X");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn stock_returns_snapshot() {
        let (status, body) = get("/stock?symbol=aapl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["price"], 200.0);
        assert_eq!(body["rsi"], 100.0);
        // Last 5 of 100..=139 => 135..=139
        assert_eq!(body["ma_5"], 137.0);
    }

    #[tokio::test]
    async fn stock_missing_symbol_is_400() {
        let (status, body) = get("/stock").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("symbol"));
    }

    #[tokio::test]
    async fn stock_provider_failure_is_500() {
        let (status, body) = get("/stock?symbol=NOPE").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["symbol"], "NOPE");
        assert_eq!(body["error"], "symbol not found: NOPE");
    }

    #[tokio::test]
    async fn multi_stock_inlines_errors_in_order() {
        let (status, body) = get("/multi-stock?symbols=BEAR,NOPE,AAPL").await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["symbol"], "BEAR");
        assert_eq!(results[1]["symbol"], "NOPE");
        assert_eq!(results[1].as_object().unwrap().len(), 2);
        assert!(results[1]["error"].is_string());
        assert_eq!(results[2]["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn multi_stock_requires_symbols() {
        let (status, _) = get("/multi-stock").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multi_stock_rejects_oversized_batches() {
        let (status, body) = get("/multi-stock?symbols=A,B,C,D").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("at most 3"));
    }

    #[tokio::test]
    async fn score_merges_snapshot_and_score() {
        let (status, body) = get("/score?symbol=AAPL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 200.0);
        assert_eq!(body["score"], 10);
        assert_eq!(body["judgment"], "neutral-to-buy");
        assert_eq!(
            body["comments"],
            serde_json::json!(["overheated", "uptrend", "notable volume"])
        );
    }

    #[tokio::test]
    async fn score_failure_is_shaped_like_a_score() {
        let (status, body) = get("/score?symbol=NOPE").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["symbol"], "NOPE");
        assert_eq!(body["score"], 0);
        assert_eq!(body["judgment"], "failed");
        assert_eq!(body["comments"], serde_json::json!(["symbol not found: NOPE"]));
    }

    #[tokio::test]
    async fn score_missing_symbol_is_400() {
        let (status, _) = get("/score?symbol=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multi_score_scores_each_symbol() {
        let (status, body) = get("/multi-score?symbols=AAPL,BEAR,NOPE").await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["score"], 10);
        assert_eq!(results[1]["score"], 8);
        assert_eq!(results[1]["judgment"], "neutral-to-buy");
        assert_eq!(
            results[1]["comments"],
            serde_json::json!(["good buy zone", "downtrend", "average volume"])
        );
        assert!(results[2].get("score").is_none());
        assert!(results[2]["error"].is_string());
    }

    #[tokio::test]
    async fn trend_classifies_each_symbol() {
        let (status, body) = get("/trend?symbols=AAPL,BEAR").await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["trend"], "uptrend");
        assert_eq!(results[1]["trend"], "downtrend");
        assert!(results[0].get("rsi").is_none());
    }

    #[tokio::test]
    async fn forex_quotes_pair() {
        let (status, body) = get("/forex?symbol=eurusd").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "EURUSD");
        assert_eq!(body["price"], 1.085);
    }

    #[tokio::test]
    async fn forex_unknown_pair_is_500() {
        let (status, body) = get("/forex?symbol=XXXYYY").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["symbol"], "XXXYYY");
    }

    #[tokio::test]
    async fn etf_basket_lines() {
        let (status, body) = get("/etf").await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);

        assert_eq!(results[0]["symbol"], "SPY");
        assert_eq!(results[0]["change"], 10.0);
        assert_eq!(results[0]["change_percent"], 2.0);
        assert_eq!(results[0]["previous_close"], 500.0);

        // Zero previous close => no percent.
        assert!(results[1]["change_percent"].is_null());

        assert_eq!(results[2]["symbol"], "GONE");
        assert!(results[2]["error"].is_string());
    }
}
