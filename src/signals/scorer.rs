// =============================================================================
// Threshold Scorer — additive score from RSI, MA trend and volume
// =============================================================================
//
// Three independent rules each add points and exactly one rationale line,
// always in the order RSI -> moving averages -> volume:
//
//   RSI      < 40 => +5 | > 70 => +0 | otherwise => +3 | missing => +0
//   MA trend up   => +5 | down   => +0 | otherwise => +2
//   Volume   > 10M => +5 | present => +3 | missing => +0
//
// The total (0..=15) maps to a judgment, highest threshold first:
//   >= 12 bullish, >= 8 neutral-to-buy, >= 5 wait-and-see, else bearish/caution.
// =============================================================================

use crate::signals::trend::classify_trend;
use crate::types::{Judgment, ScoreResult, Snapshot, Trend};

pub const RSI_BUY_BELOW: f64 = 40.0;
pub const RSI_OVERHEATED_ABOVE: f64 = 70.0;
pub const NOTABLE_VOLUME: f64 = 10_000_000.0;

/// A single rule's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RuleOutcome {
    points: u32,
    comment: &'static str,
}

impl RuleOutcome {
    const fn new(points: u32, comment: &'static str) -> Self {
        Self { points, comment }
    }
}

fn rsi_rule(rsi: Option<f64>) -> RuleOutcome {
    match rsi {
        None => RuleOutcome::new(0, "RSI unavailable"),
        Some(v) if v < RSI_BUY_BELOW => RuleOutcome::new(5, "good buy zone"),
        Some(v) if v > RSI_OVERHEATED_ABOVE => RuleOutcome::new(0, "overheated"),
        Some(_) => RuleOutcome::new(3, "neutral-to-buy"),
    }
}

fn trend_rule(snapshot: &Snapshot) -> RuleOutcome {
    match classify_trend(snapshot.price, snapshot.ma_5, snapshot.ma_25) {
        Trend::Uptrend => RuleOutcome::new(5, "uptrend"),
        Trend::Downtrend => RuleOutcome::new(0, "downtrend"),
        Trend::Flat => RuleOutcome::new(2, "flat/mixed"),
    }
}

fn volume_rule(volume: Option<f64>) -> RuleOutcome {
    match volume {
        None => RuleOutcome::new(0, "volume unavailable"),
        Some(v) if v > NOTABLE_VOLUME => RuleOutcome::new(5, "notable volume"),
        Some(_) => RuleOutcome::new(3, "average volume"),
    }
}

/// Map an additive score onto the four judgment levels.
pub fn judge(score: u32) -> Judgment {
    if score >= 12 {
        Judgment::Bullish
    } else if score >= 8 {
        Judgment::NeutralToBuy
    } else if score >= 5 {
        Judgment::WaitAndSee
    } else {
        Judgment::BearishCaution
    }
}

/// Score a snapshot. Pure; never fails.
pub fn score_snapshot(snapshot: &Snapshot) -> ScoreResult {
    let outcomes = [
        rsi_rule(snapshot.rsi),
        trend_rule(snapshot),
        volume_rule(snapshot.volume),
    ];

    let score = outcomes.iter().map(|o| o.points).sum();

    ScoreResult {
        symbol: snapshot.symbol.clone(),
        score,
        judgment: judge(score),
        comments: outcomes.iter().map(|o| o.comment.to_string()).collect(),
    }
}
