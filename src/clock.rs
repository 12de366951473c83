//! Pluggable time source and Eastern-time calendar helpers
//!
//! Every price-series decision (staleness, session, "today") is made in
//! America/New_York. The `Clock` trait keeps "now" injectable so the
//! cache and series builder are deterministic under test; the system
//! clock also honors `FOLIO_MOCK_NOW` for reproducible CLI runs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

use crate::config::MOCK_NOW_ENV;

/// Trading session within an ET calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// Before 09:30 ET
    Pre,
    /// 09:30–16:00 ET
    Regular,
    /// After 16:00 ET
    After,
}

impl Session {
    pub fn label(&self) -> &'static str {
        match self {
            Session::Pre => "PRE",
            Session::Regular => "REG",
            Session::After => "AFTER",
        }
    }
}

/// Injectable time source
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current instant in Eastern time
    fn now_et(&self) -> DateTime<Tz> {
        self.now_utc().with_timezone(&New_York)
    }

    /// Current ET calendar date
    fn today_et(&self) -> NaiveDate {
        self.now_et().date_naive()
    }
}

/// Real clock; `FOLIO_MOCK_NOW` (an ET-naive timestamp) overrides it
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        if let Ok(mock) = std::env::var(MOCK_NOW_ENV) {
            if let Some(dt) = parse_et_timestamp(&mock) {
                return dt;
            }
            tracing::warn!("Ignoring unparseable {}={}", MOCK_NOW_ENV, mock);
        }
        Utc::now()
    }
}

/// Fixed clock for tests
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin the clock to an ET wall-clock instant
    pub fn at_et(timestamp: &str) -> Self {
        let dt = parse_et_timestamp(timestamp)
            .unwrap_or_else(|| panic!("bad ET timestamp: {timestamp}"));
        Self(dt)
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS` (or `T`-separated) as an ET wall-clock time
fn parse_et_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    let local = New_York.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// Convert a provider UTC millisecond timestamp to its ET calendar date
pub fn et_date_of_ms(ts_ms: i64) -> Option<NaiveDate> {
    let utc = DateTime::<Utc>::from_timestamp_millis(ts_ms)?;
    Some(utc.with_timezone(&New_York).date_naive())
}

/// Session for an ET instant
pub fn session_at(now_et: &DateTime<Tz>) -> Session {
    let open = NaiveTime::from_hms_opt(9, 30, 0).expect("valid time");
    let close = NaiveTime::from_hms_opt(16, 0, 0).expect("valid time");
    let t = now_et.time();
    if t < open {
        Session::Pre
    } else if t > close {
        Session::After
    } else {
        Session::Regular
    }
}

/// UTC millisecond timestamp for midnight ET on the given date
///
/// Inverse of `et_date_of_ms`; tests use it to fabricate bars that land
/// on a known ET calendar day.
pub fn ms_at_et_midnight(date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    New_York
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
        .unwrap_or_default()
}
