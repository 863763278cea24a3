//! Query tuning shared by the resolver, summarizer and router.

use crate::foreground::DEFAULT_FOREGROUND_LOOKBACK_MS;
use crate::summary::DEFAULT_SUMMARY_LOOKBACK_MS;

/// Window lengths used when a caller does not give one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How far back the foreground scan looks.
    /// Default: 300000 (5 minutes).
    pub foreground_lookback_ms: i64,

    /// Length of the default summary window.
    /// Default: 86400000 (24 hours).
    pub summary_lookback_ms: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            foreground_lookback_ms: DEFAULT_FOREGROUND_LOOKBACK_MS,
            summary_lookback_ms: DEFAULT_SUMMARY_LOOKBACK_MS,
        }
    }
}
