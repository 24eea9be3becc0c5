// =============================================================================
// Simple Moving Average (SMA) over a nullable close series
// =============================================================================
//
// Takes the trailing `window` samples, discards missing closes, and averages
// what remains. A window that contains no usable samples yields `None`
// instead of dividing by zero.
// =============================================================================

/// Arithmetic mean of the last `window` closes, skipping missing values.
///
/// # Edge cases
/// - `window == 0` => `None`
/// - Series shorter than `window` => averages whatever is available
/// - Every sample in the window is `None` => `None`
pub fn average(series: &[Option<f64>], window: usize) -> Option<f64> {
    if window == 0 {
        return None;
    }

    let start = series.len().saturating_sub(window);
    let (sum, count) = series[start..]
        .iter()
        .flatten()
        .fold((0.0_f64, 0_usize), |(s, n), &v| (s + v, n + 1));

    if count == 0 {
        return None;
    }

    let mean = sum / count as f64;
    mean.is_finite().then_some(mean)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn empty_series_is_none() {
        assert_eq!(average(&[], 5), None);
    }

    #[test]
    fn all_missing_is_none() {
        assert_eq!(average(&[None, None], 5), None);
    }

    #[test]
    fn zero_window_is_none() {
        assert_eq!(average(&some(&[1.0, 2.0]), 0), None);
    }

    #[test]
    fn full_window_mean() {
        assert_eq!(average(&some(&[1.0, 2.0, 3.0, 4.0, 5.0]), 5), Some(3.0));
    }

    #[test]
    fn only_trailing_window_counts() {
        // Last 2 of [10, 20, 30, 40] => (30 + 40) / 2
        assert_eq!(average(&some(&[10.0, 20.0, 30.0, 40.0]), 2), Some(35.0));
    }

    #[test]
    fn short_series_uses_available_samples() {
        assert_eq!(average(&some(&[2.0, 4.0]), 25), Some(3.0));
    }

    #[test]
    fn missing_samples_are_skipped_not_zeroed() {
        let series = vec![Some(100.0), None, Some(2.0), None, Some(4.0)];
        // Window of 4 covers [None, 2, None, 4] => 3.0
        assert_eq!(average(&series, 4), Some(3.0));
    }
}
