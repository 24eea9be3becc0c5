// =============================================================================
// Market Data — provider seam
// =============================================================================
//
// The service never talks to an upstream directly; it goes through
// `MarketDataProvider`, so the concrete client (Yahoo Finance) can be swapped
// or stubbed in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::PriceSeries;

/// Latest quote fields for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub previous_close: Option<f64>,
}

impl Quote {
    /// Absolute change against the previous close.
    pub fn change(&self) -> Option<f64> {
        Some(self.price? - self.previous_close?)
    }

    /// Percentage change against the previous close.
    pub fn change_percent(&self) -> Option<f64> {
        let prev = self.previous_close?;
        if prev == 0.0 {
            return None;
        }
        Some(self.change()? / prev * 100.0)
    }
}

/// Source of quotes and daily close history.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest quote for `symbol`.
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError>;

    /// Chronological daily closes for `symbol`, oldest first.
    async fn daily_closes(&self, symbol: &str) -> Result<PriceSeries, ProviderError>;

    /// Quote and closes together. Providers that get both from one upstream
    /// response should override this; the default issues both calls
    /// concurrently.
    async fn quote_and_closes(
        &self,
        symbol: &str,
    ) -> Result<(Quote, PriceSeries), ProviderError> {
        tokio::try_join!(self.quote(symbol), self.daily_closes(symbol))
    }
}
