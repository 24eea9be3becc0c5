// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator functions over chronologically ordered
// close series. Closes are nullable (`Option<f64>`) because the upstream
// provider leaves holes for sessions without a print, and every function
// returns `Option<f64>` so callers handle insufficient data explicitly.

pub mod rsi;
pub mod sma;

pub use rsi::calc_rsi;
pub use sma::average;

/// Short moving-average window (sessions).
pub const MA_SHORT: usize = 5;

/// Long moving-average window (sessions).
pub const MA_LONG: usize = 25;
