// Scoring — deterministic heuristics over candidate tweets.
//
// `style` produces the 0–100 virality metrics and categorical tags the
// pipeline uses to decide whether a tweet needs enhancement. `metrics`
// measures surface properties (length, emoji, hashtags). Neither does
// any I/O.

pub mod metrics;
pub mod style;
