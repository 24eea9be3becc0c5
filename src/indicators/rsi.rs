// =============================================================================
// Relative Strength Index (RSI) — simple 14-period average
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Only the trailing window is examined (no Wilder smoothing):
//
// Step 1 — Take the last `RSI_PERIOD` day-over-day deltas, i.e. the last
//          `RSI_PERIOD + 1` closes.
// Step 2 — gains  = sum of positive deltas
//          losses = sum of |negative deltas|
// Step 3 — avg_gain = gains / period,  avg_loss = losses / period
// Step 4 — avg_loss == 0 => 100,  avg_gain == 0 => 0,
//          otherwise RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//          rounded to one decimal place.
// =============================================================================

/// Look-back period in deltas.
pub const RSI_PERIOD: usize = 14;

/// Minimum number of closes required to produce a value.
pub const RSI_MIN_CLOSES: usize = RSI_PERIOD + 1;

/// Compute the RSI of the trailing window of `closes`.
///
/// Returns `None` when fewer than [`RSI_MIN_CLOSES`] closes are supplied or
/// the result is non-finite. A delta whose start or end close is missing
/// contributes neither a gain nor a loss; the divisor stays at
/// [`RSI_PERIOD`].
pub fn calc_rsi(closes: &[Option<f64>]) -> Option<f64> {
    if closes.len() < RSI_MIN_CLOSES {
        return None;
    }

    let window = &closes[closes.len() - RSI_MIN_CLOSES..];
    let (gains, losses) = window
        .windows(2)
        .filter_map(|w| match (w[0], w[1]) {
            (Some(prev), Some(next)) => Some(next - prev),
            _ => None,
        })
        .fold((0.0_f64, 0.0_f64), |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let period_f = RSI_PERIOD as f64;
    rsi_from_averages(gains / period_f, losses / period_f)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Zero loss is checked first, so a perfectly flat window reads 100.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        let rs = avg_gain / avg_loss;
        round_one_decimal(100.0 - 100.0 / (1.0 + rs))
    };

    rsi.is_finite().then_some(rsi)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
