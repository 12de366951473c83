//! Price caching, fetching, and series assembly
//!
//! The pipeline entry point is `load_price_table`: refresh each symbol's
//! cache, overlay the live session quote, and combine everything into
//! one forward-filled price table.

pub mod cache;
pub mod provider;
pub mod series;
pub mod summary;
pub mod types;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::errors::FolioError;
use crate::timeseries::DailyFrame;

use cache::PriceCache;
use provider::PriceProvider;
use summary::SymbolSummary;
use types::CacheStatus;

/// A combined price table plus per-symbol load diagnostics
pub struct PriceLoad {
    pub table: DailyFrame,
    pub summary: Vec<SymbolSummary>,
}

/// Load every symbol through the cache and combine into one table
///
/// A symbol that yields no data is dropped from the table (and reported
/// in the summary); it never fails the other symbols.
pub async fn load_price_table(
    provider: &dyn PriceProvider,
    cache: &PriceCache,
    clock: &dyn Clock,
    symbols: &[String],
    start: NaiveDate,
) -> PriceLoad {
    let mut by_symbol = BTreeMap::new();
    let mut rows = Vec::new();

    for symbol in symbols {
        if by_symbol.contains_key(symbol) {
            continue;
        }

        let (bars, status) = cache.load_or_refresh(provider, symbol, start, clock).await;
        if status == CacheStatus::Fail {
            rows.push(SymbolSummary::empty(symbol, status));
            continue;
        }

        let built = series::build(provider, clock, symbol, &bars).await;
        if built.series.is_empty() {
            tracing::warn!(
                "{}; excluding from price table",
                FolioError::MissingPriceData {
                    symbol: symbol.clone(),
                }
            );
            rows.push(SymbolSummary::empty(symbol, status));
            continue;
        }

        rows.push(SymbolSummary {
            symbol: symbol.clone(),
            status,
            first: built.series.keys().next().copied(),
            last: built.series.keys().next_back().copied(),
            rows: built.series.len(),
            live: built.live,
        });
        by_symbol.insert(symbol.clone(), built.series);
    }

    PriceLoad {
        table: series::combine(&by_symbol),
        summary: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ms_at_et_midnight, FixedClock};
    use crate::errors::FolioError;
    use crate::prices::types::Bar;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct PartialProvider;

    #[async_trait]
    impl PriceProvider for PartialProvider {
        fn name(&self) -> &str {
            "partial"
        }

        async fn daily_range(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<Bar>, FolioError> {
            // Only AAPL has data; everything else errors like a bad ticker
            if symbol == "AAPL" {
                Ok(vec![Bar {
                    t: ms_at_et_midnight(NaiveDate::from_ymd_opt(2025, 10, 13).unwrap()),
                    c: 100.0,
                }])
            } else {
                Err(FolioError::NetworkFailure {
                    symbol: symbol.to_string(),
                    message: "HTTP 404".to_string(),
                })
            }
        }

        async fn latest_minute(
            &self,
            _symbol: &str,
            _date: NaiveDate,
        ) -> Result<Vec<Bar>, FolioError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_symbol_excluded_without_failing_others() {
        let tmp = TempDir::new().unwrap();
        let cache = PriceCache::new(tmp.path()).unwrap();
        let clock = FixedClock::at_et("2025-10-13 18:00:00");
        let symbols = vec!["AAPL".to_string(), "BOGUS".to_string()];

        let load = load_price_table(
            &PartialProvider,
            &cache,
            &clock,
            &symbols,
            NaiveDate::from_ymd_opt(2025, 10, 13).unwrap(),
        )
        .await;

        assert!(load.table.has_symbol("AAPL"));
        assert!(!load.table.has_symbol("BOGUS"));
        assert_eq!(load.summary.len(), 2);
        assert_eq!(load.summary[1].status, CacheStatus::Fail);
        assert_eq!(load.summary[1].rows, 0);
    }
}
