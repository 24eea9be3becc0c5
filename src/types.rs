// =============================================================================
// Shared types used across the stock scoring service
// =============================================================================

use serde::{Deserialize, Serialize};

/// Chronological daily closes. Missing sessions are `None`.
pub type PriceSeries = Vec<Option<f64>>;

/// Point-in-time record for one symbol: raw quote fields plus indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub rsi: Option<f64>,
    pub ma_5: Option<f64>,
    pub ma_25: Option<f64>,
}

/// Four-level ordinal classification of an additive score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Judgment {
    #[serde(rename = "bearish/caution")]
    BearishCaution,
    #[serde(rename = "wait-and-see")]
    WaitAndSee,
    #[serde(rename = "neutral-to-buy")]
    NeutralToBuy,
    #[serde(rename = "bullish")]
    Bullish,
}

impl Judgment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BearishCaution => "bearish/caution",
            Self::WaitAndSee => "wait-and-see",
            Self::NeutralToBuy => "neutral-to-buy",
            Self::Bullish => "bullish",
        }
    }
}

impl std::fmt::Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the threshold scorer for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub symbol: String,
    pub score: u32,
    pub judgment: Judgment,
    /// One rationale per rule, in rule order: RSI, moving averages, volume.
    pub comments: Vec<String>,
}

/// Snapshot and score flattened into a single JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSnapshot {
    pub symbol: String,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub rsi: Option<f64>,
    pub ma_5: Option<f64>,
    pub ma_25: Option<f64>,
    pub score: u32,
    pub judgment: Judgment,
    pub comments: Vec<String>,
}

impl ScoredSnapshot {
    pub fn new(snapshot: Snapshot, score: ScoreResult) -> Self {
        Self {
            symbol: score.symbol,
            price: snapshot.price,
            volume: snapshot.volume,
            rsi: snapshot.rsi,
            ma_5: snapshot.ma_5,
            ma_25: snapshot.ma_25,
            score: score.score,
            judgment: score.judgment,
            comments: score.comments,
        }
    }
}

/// Direction of price relative to its short and long moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Flat,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uptrend => write!(f, "uptrend"),
            Self::Downtrend => write!(f, "downtrend"),
            Self::Flat => write!(f, "flat"),
        }
    }
}

/// Row of the `/trend` response.
#[derive(Debug, Clone, Serialize)]
pub struct TrendRow {
    pub symbol: String,
    pub price: Option<f64>,
    pub ma_5: Option<f64>,
    pub ma_25: Option<f64>,
    pub trend: Trend,
}

/// Per-symbol failure inside a batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolError {
    pub symbol: String,
    pub error: String,
}

/// One slot of a batch response: either the computed record or an error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchEntry<T> {
    Ok(T),
    Err(SymbolError),
}

/// `{ "results": [...] }` envelope used by every batch endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse<T> {
    pub results: Vec<T>,
}

/// Spot FX quote.
#[derive(Debug, Clone, Serialize)]
pub struct ForexQuote {
    pub symbol: String,
    pub price: Option<f64>,
}

/// ETF line of the `/etf` basket.
#[derive(Debug, Clone, Serialize)]
pub struct EtfQuote {
    pub symbol: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub previous_close: Option<f64>,
}
