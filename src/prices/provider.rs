//! Price provider boundary
//!
//! The trait keeps the cache and series builder testable against an
//! in-process mock; `PolygonProvider` is the real aggregates client.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::types::{AggsResponse, Bar};
use crate::config::Settings;
use crate::errors::FolioError;

/// Trait for daily/intraday price providers
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Get the name of the provider
    fn name(&self) -> &str;

    /// Fetch daily close bars for an inclusive date range, ascending
    async fn daily_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, FolioError>;

    /// Fetch the most recent minute bars for a single day, newest first
    async fn latest_minute(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Vec<Bar>, FolioError>;
}

/// Polygon aggregates API client
pub struct PolygonProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PolygonProvider {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
        }
    }

    async fn get_aggs(&self, symbol: &str, url: String) -> Result<Vec<Bar>, FolioError> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FolioError::NetworkFailure {
                symbol: symbol.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FolioError::NetworkFailure {
                symbol: symbol.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let body: AggsResponse =
            response
                .json()
                .await
                .map_err(|e| FolioError::NetworkFailure {
                    symbol: symbol.to_string(),
                    message: format!("bad response body: {}", e),
                })?;

        Ok(body.results)
    }
}

#[async_trait]
impl PriceProvider for PolygonProvider {
    fn name(&self) -> &str {
        "Polygon"
    }

    async fn daily_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, FolioError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}?adjusted=true&sort=asc&limit=50000&apiKey={}",
            self.base_url, symbol, start, end, self.api_key
        );
        self.get_aggs(symbol, url).await
    }

    async fn latest_minute(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Vec<Bar>, FolioError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/minute/{}/{}?adjusted=true&sort=desc&limit=2000&apiKey={}",
            self.base_url, symbol, date, date, self.api_key
        );
        self.get_aggs(symbol, url).await
    }
}
