// =============================================================================
// Fetch Orchestrator — quote + history => Snapshot
// =============================================================================
//
// Resolving a symbol means one `quote_and_closes` call on the provider, then
// the indicator pass over the closes. The whole resolution is bounded by the
// configured per-symbol timeout.
//
// Batch requests fan out one spawned task per symbol and join them back in
// input order. A failing, slow or panicking symbol only affects its own slot.
// =============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::indicators::{average, calc_rsi, MA_LONG, MA_SHORT};
use crate::market_data::{MarketDataProvider, Quote};
use crate::types::Snapshot;

/// Combine a quote and a close series into a snapshot.
pub fn build_snapshot(symbol: &str, quote: &Quote, closes: &[Option<f64>]) -> Snapshot {
    Snapshot {
        symbol: symbol.to_string(),
        price: quote.price,
        volume: quote.volume,
        rsi: calc_rsi(closes),
        ma_5: average(closes, MA_SHORT),
        ma_25: average(closes, MA_LONG),
    }
}

/// Fetch quote and history for `symbol` and compute its indicators.
pub async fn fetch_stock_data(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> Result<Snapshot, ProviderError> {
    let (quote, closes) = provider.quote_and_closes(symbol).await?;

    let snapshot = build_snapshot(symbol, &quote, &closes);
    debug!(
        symbol,
        price = ?snapshot.price,
        rsi = ?snapshot.rsi,
        closes = closes.len(),
        "snapshot built"
    );
    Ok(snapshot)
}

/// Run `fut` for `symbol`, failing with `ProviderError::Timeout` after `limit`.
pub async fn with_timeout<T>(
    symbol: &str,
    limit: Duration,
    fut: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            symbol: symbol.to_string(),
            secs: limit.as_secs(),
        }),
    }
}

/// `fetch_stock_data` bounded by `limit`.
pub async fn fetch_snapshot(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    limit: Duration,
) -> Result<Snapshot, ProviderError> {
    with_timeout(symbol, limit, fetch_stock_data(provider, symbol)).await
}

/// Spawn `task(symbol)` for every symbol and collect results in input order.
///
/// A task that panics or is cancelled yields `ProviderError::TaskFailed` for
/// its own slot.
pub async fn fan_out<T, F, Fut>(
    symbols: &[String],
    task: F,
) -> Vec<(String, Result<T, ProviderError>)>
where
    T: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
{
    let handles: Vec<_> = symbols
        .iter()
        .map(|symbol| tokio::spawn(task(symbol.clone())))
        .collect();

    let joined = join_all(handles).await;

    symbols
        .iter()
        .cloned()
        .zip(joined)
        .map(|(symbol, outcome)| {
            let result = outcome.unwrap_or_else(|e| Err(ProviderError::TaskFailed(e.to_string())));
            if let Err(e) = &result {
                warn!(symbol = %symbol, error = %e, "symbol fetch failed");
            }
            (symbol, result)
        })
        .collect()
}

/// Fetch snapshots for many symbols concurrently.
pub async fn fetch_many(
    provider: Arc<dyn MarketDataProvider>,
    symbols: &[String],
    limit: Duration,
) -> Vec<(String, Result<Snapshot, ProviderError>)> {
    fan_out(symbols, |symbol| {
        let provider = provider.clone();
        async move { fetch_snapshot(provider.as_ref(), &symbol, limit).await }
    })
    .await
}

/// Fetch quotes for many symbols concurrently.
pub async fn quote_many(
    provider: Arc<dyn MarketDataProvider>,
    symbols: &[String],
    limit: Duration,
) -> Vec<(String, Result<Quote, ProviderError>)> {
    fan_out(symbols, |symbol| {
        let provider = provider.clone();
        async move { with_timeout(&symbol, limit, provider.quote(&symbol)).await }
    })
    .await
}

// =============================================================================
// Test support
// =============================================================================


// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::stub::{rising, StubProvider};
    use super::*;
    use crate::types::PriceSeries;

    fn provider() -> Arc<dyn MarketDataProvider> {
        Arc::new(
            StubProvider::default()
                .with_symbol("AAA", 130.0, 20_000_000.0, 128.0, rising(100.0, 30))
                .with_symbol("BBB", 50.0, 1_000.0, 51.0, rising(10.0, 3)),
        )
    }

    #[test]
    fn snapshot_indicators_from_closes() {
        let quote = Quote {
            symbol: "AAA".into(),
            price: Some(130.0),
            volume: Some(1.0),
            previous_close: None,
        };
        let closes = rising(100.0, 30);
        let snap = build_snapshot("AAA", &quote, &closes);
        assert_eq!(snap.rsi, Some(100.0));
        // Last 5 of 100..=129 => 125..=129
        assert_eq!(snap.ma_5, Some(127.0));
        // Last 25 => 105..=129
        assert_eq!(snap.ma_25, Some(117.0));
        assert_eq!(snap.price, Some(130.0));
    }

    #[tokio::test]
    async fn short_history_yields_null_rsi() {
        let p = provider();
        let snap = fetch_stock_data(p.as_ref(), "BBB").await.unwrap();
        assert_eq!(snap.rsi, None);
        assert_eq!(snap.ma_5, Some(11.0));
        assert_eq!(snap.volume, Some(1_000.0));
    }

    /// Serves snapshots only through the combined call.
    struct CombinedOnly;

    #[async_trait::async_trait]
    impl MarketDataProvider for CombinedOnly {
        async fn quote(&self, _symbol: &str) -> Result<Quote, ProviderError> {
            Err(ProviderError::Network("separate quote call".into()))
        }

        async fn daily_closes(&self, _symbol: &str) -> Result<PriceSeries, ProviderError> {
            Err(ProviderError::Network("separate history call".into()))
        }

        async fn quote_and_closes(
            &self,
            symbol: &str,
        ) -> Result<(Quote, PriceSeries), ProviderError> {
            let quote = Quote {
                symbol: symbol.to_string(),
                price: Some(42.0),
                volume: Some(7.0),
                previous_close: None,
            };
            Ok((quote, rising(1.0, 20)))
        }
    }

    #[tokio::test]
    async fn snapshot_uses_single_combined_call() {
        let snap = fetch_stock_data(&CombinedOnly, "ONE").await.unwrap();
        assert_eq!(snap.price, Some(42.0));
        assert_eq!(snap.ma_5, Some(18.0));
        assert_eq!(snap.rsi, Some(100.0));
    }

    #[tokio::test]
    async fn unknown_symbol_is_provider_error() {
        let p = provider();
        let err = fetch_stock_data(p.as_ref(), "NOPE").await.unwrap_err();
        assert!(matches!(err, ProviderError::SymbolNotFound { .. }));
    }

    #[tokio::test]
    async fn batch_preserves_order_and_isolates_failures() {
        let symbols: Vec<String> = ["BBB", "NOPE", "AAA"].iter().map(|s| s.to_string()).collect();
        let results = fetch_many(provider(), &symbols, Duration::from_secs(5)).await;

        assert_eq!(results.len(), 3);
        let order: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["BBB", "NOPE", "AAA"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_symbol_times_out_without_blocking_others() {
        let mut stub = StubProvider::default().with_symbol("AAA", 1.0, 1.0, 1.0, rising(1.0, 20));
        stub.closes.insert("SLOW".into(), rising(1.0, 20));
        stub.hang.push("SLOW".into());
        let p: Arc<dyn MarketDataProvider> = Arc::new(stub);

        let symbols = vec!["SLOW".to_string(), "AAA".to_string()];
        let results = fetch_many(p, &symbols, Duration::from_secs(2)).await;

        assert_eq!(
            results[0].1,
            Err(ProviderError::Timeout {
                symbol: "SLOW".into(),
                secs: 2
            })
        );
        assert!(results[1].1.is_ok());
    }

    #[tokio::test]
    async fn panicking_task_becomes_task_failed() {
        let mut stub = StubProvider::default().with_symbol("AAA", 1.0, 1.0, 1.0, rising(1.0, 20));
        stub.closes.insert("BOOM".into(), rising(1.0, 20));
        stub.panic.push("BOOM".into());
        let p: Arc<dyn MarketDataProvider> = Arc::new(stub);

        let symbols = vec!["BOOM".to_string(), "AAA".to_string()];
        let results = fetch_many(p, &symbols, Duration::from_secs(5)).await;

        assert!(matches!(results[0].1, Err(ProviderError::TaskFailed(_))));
        assert!(results[1].1.is_ok());
    }

    #[tokio::test]
    async fn quote_many_returns_quotes_in_order() {
        let symbols = vec!["AAA".to_string(), "ZZZ".to_string()];
        let results = quote_many(provider(), &symbols, Duration::from_secs(5)).await;
        assert_eq!(results[0].1.as_ref().unwrap().price, Some(130.0));
        assert!(results[1].1.is_err());
    }
}
