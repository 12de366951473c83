//! Per-symbol close series with live session overlay
//!
//! Historical bars become an ET-date-indexed close series; "today" gets
//! at most one in-memory overlay row from the latest intraday quote.
//! The overlay is never written back to the cache; it is recomputed on
//! every call, so a pre-market placeholder is replaced the moment a real
//! quote prints.

use std::collections::BTreeMap;

use crate::clock::{et_date_of_ms, session_at, Clock, Session};
use crate::timeseries::{DailyFrame, DailySeries};

use super::provider::PriceProvider;
use super::types::Bar;

/// The most recent intraday print applied to today's row
#[derive(Debug, Clone, Copy)]
pub struct LiveQuote {
    pub session: Session,
    pub price: f64,
}

/// A symbol's date→close series plus the overlay that produced it
#[derive(Debug, Clone)]
pub struct BuiltSeries {
    pub series: DailySeries,
    pub live: Option<LiveQuote>,
}

/// Build one symbol's close series from cached bars and a live quote
pub async fn build(
    provider: &dyn PriceProvider,
    clock: &dyn Clock,
    symbol: &str,
    bars: &[Bar],
) -> BuiltSeries {
    let mut series = history_series(bars);

    let now_et = clock.now_et();
    let today = now_et.date_naive();
    let now_ms = clock.now_utc().timestamp_millis();

    let quote = match provider.latest_minute(symbol, today).await {
        Ok(minutes) => minutes
            .into_iter()
            .filter(|b| b.t <= now_ms)
            .max_by_key(|b| b.t),
        Err(e) => {
            tracing::debug!("No intraday quote for {}: {}", symbol, e);
            None
        }
    };

    let live = match quote {
        Some(q) => {
            // Overlay replaces any historical row for today
            series.insert(today, q.c);
            Some(LiveQuote {
                session: session_at(&now_et),
                price: q.c,
            })
        }
        None => {
            // No print yet (e.g. early pre-market): seed today with the
            // prior close as a placeholder
            if !series.contains_key(&today) {
                if let Some((_, prev_close)) = series.range(..today).next_back() {
                    let prev_close = *prev_close;
                    series.insert(today, prev_close);
                }
            }
            None
        }
    };

    BuiltSeries { series, live }
}

/// Collapse UTC-millisecond bars onto ET calendar dates
///
/// When several bars land on the same ET date, the later one in fetch
/// order wins.
pub fn history_series(bars: &[Bar]) -> DailySeries {
    let mut series = BTreeMap::new();
    for bar in bars {
        if let Some(date) = et_date_of_ms(bar.t) {
            series.insert(date, bar.c);
        }
    }
    series
}

/// Outer-join per-symbol series into one forward-filled price table
///
/// A symbol's last known close repeats for every later date in the union
/// index; dates before its first observation stay absent, keeping the
/// symbol out of position and weight math until it is priced.
pub fn combine(series_by_symbol: &BTreeMap<String, DailySeries>) -> DailyFrame {
    let mut frame = DailyFrame::from_series(series_by_symbol);
    frame.forward_fill();
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ms_at_et_midnight, FixedClock};
    use crate::errors::FolioError;
    use crate::prices::cache::PriceCache;
    use crate::prices::types::CacheStatus;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct ScriptedProvider {
        daily: Vec<Bar>,
        minute: Vec<Bar>,
    }

    #[async_trait]
    impl PriceProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn daily_range(
            &self,
            _symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<Bar>, FolioError> {
            Ok(self
                .daily
                .iter()
                .copied()
                .filter(|b| {
                    et_date_of_ms(b.t)
                        .map(|d| d >= start && d <= end)
                        .unwrap_or(false)
                })
                .collect())
        }

        async fn latest_minute(
            &self,
            _symbol: &str,
            _date: NaiveDate,
        ) -> Result<Vec<Bar>, FolioError> {
            Ok(self.minute.clone())
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn daily_bar(day: u32, close: f64) -> Bar {
        Bar {
            t: ms_at_et_midnight(d(day)),
            c: close,
        }
    }

    fn minute_bar(day: u32, hour: u32, min: u32, close: f64) -> Bar {
        Bar {
            t: ms_at_et_midnight(d(day)) + i64::from(hour * 3600 + min * 60) * 1000,
            c: close,
        }
    }

    fn closes(series: &DailySeries) -> Vec<f64> {
        series.values().copied().collect()
    }

    #[test]
    fn test_history_collapses_to_et_dates_later_wins() {
        // Two prints on the same ET day: the later one in fetch order wins
        let bars = vec![
            daily_bar(13, 100.0),
            minute_bar(13, 10, 0, 101.0),
            daily_bar(14, 103.0),
        ];
        let series = history_series(&bars);
        assert_eq!(closes(&series), vec![101.0, 103.0]);
    }

    #[tokio::test]
    async fn test_overlay_replaces_todays_row() {
        let provider = ScriptedProvider {
            daily: vec![],
            minute: vec![minute_bar(14, 10, 0, 105.0)],
        };
        let clock = FixedClock::at_et("2025-10-14 10:05:00");
        let bars = vec![daily_bar(13, 100.0), daily_bar(14, 103.0)];

        let built = build(&provider, &clock, "AAPL", &bars).await;

        assert_eq!(closes(&built.series), vec![100.0, 105.0]);
        let live = built.live.unwrap();
        assert_eq!(live.session, Session::Regular);
        assert!((live.price - 105.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_future_quote_is_ignored() {
        // A print stamped after "now" must not leak into the series
        let provider = ScriptedProvider {
            daily: vec![],
            minute: vec![minute_bar(14, 15, 59, 999.0)],
        };
        let clock = FixedClock::at_et("2025-10-14 09:35:00");
        let bars = vec![daily_bar(13, 100.0)];

        let built = build(&provider, &clock, "AAPL", &bars).await;

        // No usable quote: today falls back to the prior close
        assert_eq!(closes(&built.series), vec![100.0, 100.0]);
        assert!(built.live.is_none());
    }

    #[tokio::test]
    async fn test_placeholder_carries_prior_close() {
        let provider = ScriptedProvider {
            daily: vec![],
            minute: vec![],
        };
        let clock = FixedClock::at_et("2025-10-15 08:00:00");
        let bars = vec![daily_bar(13, 100.0), daily_bar(14, 103.0)];

        let built = build(&provider, &clock, "AAPL", &bars).await;

        assert_eq!(closes(&built.series), vec![100.0, 103.0, 103.0]);
        assert!(built.live.is_none());
    }

    #[tokio::test]
    async fn test_placeholder_does_not_mask_existing_today_row() {
        // A partial daily bar for today already cached stays visible
        let provider = ScriptedProvider {
            daily: vec![],
            minute: vec![],
        };
        let clock = FixedClock::at_et("2025-10-14 08:00:00");
        let bars = vec![daily_bar(13, 100.0), daily_bar(14, 102.5)];

        let built = build(&provider, &clock, "AAPL", &bars).await;

        assert_eq!(closes(&built.series), vec![100.0, 102.5]);
    }

    #[tokio::test]
    async fn test_empty_history_without_quote_stays_empty() {
        let provider = ScriptedProvider {
            daily: vec![],
            minute: vec![],
        };
        let clock = FixedClock::at_et("2025-10-14 10:00:00");

        let built = build(&provider, &clock, "AAPL", &[]).await;
        assert!(built.series.is_empty());
    }

    #[test]
    fn test_combine_forward_fills_after_first_observation() {
        let mut by_symbol = BTreeMap::new();
        by_symbol.insert(
            "AAPL".to_string(),
            BTreeMap::from([(d(13), 100.0), (d(15), 105.0)]),
        );
        by_symbol.insert(
            "MSFT".to_string(),
            BTreeMap::from([(d(14), 200.0), (d(15), 201.0)]),
        );

        let table = combine(&by_symbol);

        assert_eq!(table.index(), &[d(13), d(14), d(15)]);
        // AAPL's gap on the 14th repeats the 13th's close
        assert_eq!(table.get(d(14), "AAPL"), Some(100.0));
        // MSFT stays absent before its first observation
        assert_eq!(table.get(d(13), "MSFT"), None);
        assert_eq!(table.get(d(14), "MSFT"), Some(200.0));
    }

    /// The full session progression: seed the cache with one close, then
    /// walk through regular hours, after hours, the next pre-market, and
    /// the next open, asserting the exact series at each step.
    #[tokio::test]
    async fn test_session_overlay_progression() {
        let tmp = TempDir::new().unwrap();
        let cache = PriceCache::new(tmp.path()).unwrap();
        std::fs::write(
            tmp.path().join("AAPL_2025-10-13_2025-10-13.json"),
            serde_json::to_string(&crate::prices::types::AggsResponse {
                results: vec![daily_bar(13, 100.0)],
            })
            .unwrap(),
        )
        .unwrap();

        let all_daily = vec![daily_bar(13, 100.0), daily_bar(14, 103.0)];

        let step = |minute: Vec<Bar>| ScriptedProvider {
            daily: all_daily.clone(),
            minute,
        };

        // 10-14 09:45 regular hours, live print 105
        let provider = step(vec![minute_bar(14, 9, 45, 105.0)]);
        let clock = FixedClock::at_et("2025-10-14 09:45:00");
        let (bars, status) = cache
            .load_or_refresh(&provider, "AAPL", d(13), &clock)
            .await;
        assert_eq!(status, CacheStatus::Updated);
        let built = build(&provider, &clock, "AAPL", &bars).await;
        assert_eq!(closes(&built.series), vec![100.0, 105.0]);
        assert_eq!(built.live.unwrap().session, Session::Regular);

        // 10-14 18:00 after hours, print 110 replaces the overlay
        let provider = step(vec![minute_bar(14, 18, 0, 110.0)]);
        let clock = FixedClock::at_et("2025-10-14 18:00:00");
        let (bars, status) = cache
            .load_or_refresh(&provider, "AAPL", d(13), &clock)
            .await;
        assert_eq!(status, CacheStatus::Hit);
        let built = build(&provider, &clock, "AAPL", &bars).await;
        assert_eq!(closes(&built.series), vec![100.0, 110.0]);
        assert_eq!(built.live.unwrap().session, Session::After);

        // 10-15 08:00 pre-market: yesterday's close (103) is now cached
        // history, last overnight print 110 overlays today
        let provider = step(vec![minute_bar(15, 8, 0, 110.0)]);
        let clock = FixedClock::at_et("2025-10-15 08:00:00");
        let (bars, status) = cache
            .load_or_refresh(&provider, "AAPL", d(13), &clock)
            .await;
        assert_eq!(status, CacheStatus::NoNew);
        let built = build(&provider, &clock, "AAPL", &bars).await;
        assert_eq!(closes(&built.series), vec![100.0, 103.0, 110.0]);
        assert_eq!(built.live.unwrap().session, Session::Pre);

        // 10-15 10:00 regular hours, print 115
        let provider = step(vec![minute_bar(15, 10, 0, 115.0)]);
        let clock = FixedClock::at_et("2025-10-15 10:00:00");
        let (bars, _) = cache
            .load_or_refresh(&provider, "AAPL", d(13), &clock)
            .await;
        let built = build(&provider, &clock, "AAPL", &bars).await;
        assert_eq!(closes(&built.series), vec![100.0, 103.0, 115.0]);
    }
}
