// =============================================================================
// Moving-average trend classification
// =============================================================================
//
//   price > MA5 > MA25  =>  uptrend
//   price < MA5 < MA25  =>  downtrend
//   anything else       =>  flat  (including any missing input)

use crate::types::Trend;

/// Classify the stacking of price against its 5- and 25-session averages.
pub fn classify_trend(price: Option<f64>, ma_5: Option<f64>, ma_25: Option<f64>) -> Trend {
    match (price, ma_5, ma_25) {
        (Some(p), Some(short), Some(long)) if p > short && short > long => Trend::Uptrend,
        (Some(p), Some(short), Some(long)) if p < short && short < long => Trend::Downtrend,
        _ => Trend::Flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacked_up() {
        assert_eq!(classify_trend(Some(110.0), Some(105.0), Some(100.0)), Trend::Uptrend);
    }

    #[test]
    fn stacked_down() {
        assert_eq!(classify_trend(Some(90.0), Some(95.0), Some(100.0)), Trend::Downtrend);
    }

    #[test]
    fn mixed_ordering_is_flat() {
        assert_eq!(classify_trend(Some(110.0), Some(95.0), Some(100.0)), Trend::Flat);
        // Ties are not strict.
        assert_eq!(classify_trend(Some(100.0), Some(100.0), Some(90.0)), Trend::Flat);
    }

    #[test]
    fn missing_input_is_flat() {
        assert_eq!(classify_trend(None, Some(105.0), Some(100.0)), Trend::Flat);
        assert_eq!(classify_trend(Some(110.0), Some(105.0), None), Trend::Flat);
    }
}
