//! Persistent per-symbol price cache
//!
//! One JSON file per `(symbol, start, end)` key, named
//! `{SYMBOL}_{start}_{end}.json` with body `{"results": [{"t", "c"}]}`.
//! `end` is the ET calendar date of the newest bar in the file. A stale
//! entry is never mutated in place: the refreshed entry is written under
//! its new key first, then superseded keys for that `(symbol, start)`
//! are deleted, so at most one live entry exists per key pair.
//!
//! Single-writer assumption: one producer process per cache directory.
//! Concurrent writers to the same key are unsupported.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;

use super::provider::PriceProvider;
use super::types::{AggsResponse, Bar, CacheStatus};
use crate::clock::{et_date_of_ms, Clock};
use crate::errors::FolioError;

pub struct PriceCache {
    dir: PathBuf,
}

impl PriceCache {
    /// Open a cache rooted at an explicit directory
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Load a symbol's bars, refreshing from the provider only as needed
    ///
    /// A day range already covered by the cache is never re-fetched: a
    /// fresh entry costs zero network calls, and a stale one costs one
    /// tail fetch starting the day after the newest cached bar.
    pub async fn load_or_refresh(
        &self,
        provider: &dyn PriceProvider,
        symbol: &str,
        start: NaiveDate,
        clock: &dyn Clock,
    ) -> (Vec<Bar>, CacheStatus) {
        let today = clock.today_et();
        let latest_entry = self.find_latest_entry(symbol, start);
        let mut bars = latest_entry
            .as_deref()
            .and_then(|p| self.load_entry(p))
            .unwrap_or_default();

        let last_cached_day = bars.iter().map(|b| b.t).max().and_then(et_date_of_ms);

        let (fetch_start, mut status) = match last_cached_day {
            None => (Some(start), CacheStatus::Miss),
            Some(last) if last >= today => (None, CacheStatus::Hit),
            Some(last) => (last.succ_opt(), CacheStatus::Stale),
        };

        if let Some(fetch_start) = fetch_start {
            tracing::info!("Fetching {} {} → {}", symbol, fetch_start, today);
            match provider.daily_range(symbol, fetch_start, today).await {
                Ok(new_bars) if !new_bars.is_empty() => {
                    bars = merge_bars(&bars, &new_bars);
                    if let Some(end) = bars.iter().map(|b| b.t).max().and_then(et_date_of_ms) {
                        self.save_entry(symbol, start, end, &bars);
                        self.remove_superseded(symbol, start, end);
                    }
                    status = CacheStatus::Updated;
                }
                Ok(_) => {
                    // Weekend or holiday gap: nothing new, cache untouched
                    status = CacheStatus::NoNew;
                }
                Err(e) if !bars.is_empty() => {
                    tracing::warn!("{}; serving stale cache for {}", e, symbol);
                    status = CacheStatus::StaleFallback;
                }
                Err(e) => {
                    tracing::warn!("{}; {} has no cached data to fall back on", e, symbol);
                    bars = Vec::new();
                    status = CacheStatus::Fail;
                }
            }
        }

        (bars, status)
    }

    /// List entries currently on disk
    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let mut entries: Vec<CacheEntryInfo> = self
            .entry_files()
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_string();
                let (symbol, start, end) = parse_entry_name(&name)?;
                let bars = self.load_entry(&path).map(|b| b.len()).unwrap_or(0);
                Some(CacheEntryInfo {
                    symbol,
                    start,
                    end,
                    bars,
                })
            })
            .collect();
        entries.sort_by(|a, b| (&a.symbol, a.start).cmp(&(&b.symbol, b.start)));
        entries
    }

    /// Delete every entry; returns how many files were removed
    pub fn clear(&self) -> Result<usize> {
        let files = self.entry_files();
        let mut removed = 0;
        for path in files {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }

    fn entry_path(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}_{}_{}.json", symbol, start, end))
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(read_dir) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect()
    }

    /// Most recent entry for `(symbol, start)`; ISO end dates make the
    /// lexicographically greatest file name the newest
    fn find_latest_entry(&self, symbol: &str, start: NaiveDate) -> Option<PathBuf> {
        let prefix = format!("{}_{}_", symbol, start);
        self.entry_files()
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix))
                    .unwrap_or(false)
            })
            .max()
    }

    /// Read an entry's bars; a corrupt file behaves exactly like a miss
    fn load_entry(&self, path: &Path) -> Option<Vec<Bar>> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<AggsResponse>(&contents) {
            Ok(body) => Some(body.results),
            Err(e) => {
                let err = FolioError::CacheCorruption {
                    path: path.display().to_string(),
                    message: e.to_string(),
                };
                tracing::warn!("{}; treating as cache miss", err);
                None
            }
        }
    }

    fn save_entry(&self, symbol: &str, start: NaiveDate, end: NaiveDate, bars: &[Bar]) {
        let path = self.entry_path(symbol, start, end);
        let body = AggsResponse {
            results: bars.to_vec(),
        };
        match serde_json::to_string(&body) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!("Failed to write cache entry {}: {}", path.display(), e);
                }
            }
            Err(e) => tracing::warn!("Failed to encode cache entry for {}: {}", symbol, e),
        }
    }

    fn remove_superseded(&self, symbol: &str, start: NaiveDate, keep_end: NaiveDate) {
        let keep = self.entry_path(symbol, start, keep_end);
        let prefix = format!("{}_{}_", symbol, start);
        for path in self.entry_files() {
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix))
                .unwrap_or(false);
            if matches && path != keep {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!("Failed to remove stale entry {}: {}", path.display(), e);
                }
            }
        }
    }
}

/// Parsed entry metadata for display
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bars: usize,
}

fn parse_entry_name(name: &str) -> Option<(String, NaiveDate, NaiveDate)> {
    let stem = name.strip_suffix(".json")?;
    let mut parts = stem.rsplitn(3, '_');
    let end = parts.next()?.parse().ok()?;
    let start = parts.next()?.parse().ok()?;
    let symbol = parts.next()?.to_string();
    Some((symbol, start, end))
}

/// Union of cached and freshly fetched bars, keyed by timestamp
///
/// The fetched value wins on conflict; output is ascending and unique
/// regardless of input order.
fn merge_bars(cached: &[Bar], fetched: &[Bar]) -> Vec<Bar> {
    let mut by_ts: BTreeMap<i64, f64> = cached.iter().map(|b| (b.t, b.c)).collect();
    for bar in fetched {
        by_ts.insert(bar.t, bar.c);
    }
    by_ts.into_iter().map(|(t, c)| Bar { t, c }).collect()
}
