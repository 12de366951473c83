//! Wire and cache types for the aggregates API

use serde::{Deserialize, Serialize};

/// A single aggregate bar as returned by the provider
///
/// Field names match the wire format (`t` = UTC epoch milliseconds,
/// `c` = close) so the same struct round-trips through cache files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub t: i64,
    pub c: f64,
}

/// Response envelope for `/v2/aggs/...`
///
/// `results` is absent entirely when the range contains no bars.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggsResponse {
    #[serde(default)]
    pub results: Vec<Bar>,
}

/// Outcome of a cache lookup + refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// No entry on disk (or entry was corrupt); full window fetched
    Miss,
    /// Entry covers through today; no network call made
    Hit,
    /// Entry behind today; tail fetch pending
    Stale,
    /// Tail (or full) fetch merged and persisted
    Updated,
    /// Fetch succeeded but returned nothing new; cache unchanged
    NoNew,
    /// Fetch failed; stale cache served instead
    StaleFallback,
    /// Fetch failed and no cache exists; symbol has no data
    Fail,
}

impl CacheStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CacheStatus::Miss => "MISS",
            CacheStatus::Hit => "HIT",
            CacheStatus::Stale => "STALE",
            CacheStatus::Updated => "UPDATED",
            CacheStatus::NoNew => "NO_NEW",
            CacheStatus::StaleFallback => "STALE(FALLBACK)",
            CacheStatus::Fail => "FAIL",
        }
    }
}
