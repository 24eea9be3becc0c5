// =============================================================================
// Signals Module
// =============================================================================
//
// Rule-based interpretation of a computed snapshot:
// - Moving-average trend classification (shared with the `/trend` endpoint)
// - Additive threshold scorer with a four-level judgment

pub mod scorer;
pub mod trend;

pub use scorer::score_snapshot;
pub use trend::classify_trend;
