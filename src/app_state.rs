// =============================================================================
// Application State — shared, read-only across requests
// =============================================================================
//
// Built once at startup from a validated `ServiceConfig` and the upstream
// provider, then shared with every handler through `Arc<AppState>`. Requests
// never mutate it, so no locks are needed.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::market_data::MarketDataProvider;
use crate::runtime_config::ServiceConfig;

/// State handed to the router.
pub struct AppState {
    pub config: ServiceConfig,
    pub provider: Arc<dyn MarketDataProvider>,
}

impl AppState {
    pub fn new(config: ServiceConfig, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { config, provider }
    }

    /// Upper bound on resolving a single symbol.
    pub fn symbol_timeout(&self) -> Duration {
        self.config.symbol_timeout()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
