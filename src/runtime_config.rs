// =============================================================================
// Service Configuration — JSON file + environment overrides
// =============================================================================
//
// Everything the service needs at startup lives in `ServiceConfig`; it is
// built once in `main`, validated, and handed to `AppState::new`. Nothing
// reads the process environment after that.
//
// Precedence (lowest to highest):
//   1. Built-in defaults (every field has a serde default)
//   2. JSON file (`STOCK_SCORER_CONFIG`, default `service_config.json`)
//   3. `STOCK_SCORER_*` environment variables (and legacy `PORT`)
// =============================================================================

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "STOCK_SCORER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "service_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_base_url() -> String {
    "https://query2.finance.yahoo.com".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_symbol_timeout_secs() -> u64 {
    15
}

fn default_history_range() -> String {
    "3mo".to_string()
}

fn default_etf_basket() -> Vec<String> {
    vec![
        "SPY".to_string(),
        "QQQ".to_string(),
        "XLK".to_string(),
        "ARKK".to_string(),
    ]
}

fn default_max_batch_symbols() -> usize {
    50
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)".to_string()
}

// =============================================================================
// ServiceConfig
// =============================================================================

/// Startup configuration for the HTTP service and its upstream client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    // --- Listener -------------------------------------------------------------

    /// Interface to bind. Required to parse as an IP address.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind. Must be non-zero.
    #[serde(default = "default_port")]
    pub port: u16,

    // --- Upstream -------------------------------------------------------------

    /// Base URL of the market-data provider.
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,

    /// Per-HTTP-request timeout against the provider.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Upper bound on resolving one symbol (quote + history together).
    #[serde(default = "default_symbol_timeout_secs")]
    pub symbol_timeout_secs: u64,

    /// Provider range token for the daily close history. Must cover at least
    /// 25 sessions for the long moving average.
    #[serde(default = "default_history_range")]
    pub history_range: String,

    /// User-Agent sent upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // --- Endpoints ------------------------------------------------------------

    /// Symbols served by `/etf`.
    #[serde(default = "default_etf_basket")]
    pub etf_basket: Vec<String>,

    /// Largest symbol list accepted by the batch endpoints.
    #[serde(default = "default_max_batch_symbols")]
    pub max_batch_symbols: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upstream_base_url: default_upstream_base_url(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            symbol_timeout_secs: default_symbol_timeout_secs(),
            history_range: default_history_range(),
            user_agent: default_user_agent(),
            etf_basket: default_etf_basket(),
            max_batch_symbols: default_max_batch_symbols(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// Any failure, including a missing file, is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse service config from {}", path.display()))?;

        info!(path = %path.display(), port = config.port, "service config loaded");
        Ok(config)
    }

    /// Like [`ServiceConfig::load`], but a missing file yields the defaults
    /// with a warning. Unreadable or malformed files are still errors.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::metadata(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "service config not found, using defaults");
                Ok(Self::default())
            }
            _ => Self::load(path),
        }
    }

    /// Apply `STOCK_SCORER_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("STOCK_SCORER_HOST") {
            self.host = v.trim().to_string();
        }
        if let Some(v) = get("STOCK_SCORER_PORT").or_else(|| get("PORT")) {
            self.port = v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid port '{v}'"))?;
        }
        if let Some(v) = get("STOCK_SCORER_UPSTREAM_URL") {
            self.upstream_base_url = v.trim().to_string();
        }
        if let Some(v) = get("STOCK_SCORER_UPSTREAM_TIMEOUT_SECS") {
            self.upstream_timeout_secs = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid upstream timeout '{v}'"))?;
        }
        if let Some(v) = get("STOCK_SCORER_SYMBOL_TIMEOUT_SECS") {
            self.symbol_timeout_secs = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid symbol timeout '{v}'"))?;
        }
        if let Some(v) = get("STOCK_SCORER_HISTORY_RANGE") {
            self.history_range = v.trim().to_string();
        }
        if let Some(v) = get("STOCK_SCORER_ETF_BASKET") {
            self.etf_basket = v
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Ok(())
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.port == 0 {
            anyhow::bail!("port must be non-zero");
        }
        if self.upstream_base_url.trim().is_empty() {
            anyhow::bail!("upstream_base_url is required");
        }
        if self.upstream_timeout_secs == 0 || self.symbol_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least one second");
        }
        if self.history_range.trim().is_empty() {
            anyhow::bail!("history_range is required");
        }
        if self.etf_basket.is_empty() {
            anyhow::bail!("etf_basket must name at least one symbol");
        }
        if self.max_batch_symbols == 0 {
            anyhow::bail!("max_batch_symbols must be at least 1");
        }
        Ok(())
    }

    /// Socket address the listener binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("invalid host '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn symbol_timeout(&self) -> Duration {
        Duration::from_secs(self.symbol_timeout_secs)
    }
}
