//! Environment-based configuration for the price provider

use anyhow::Result;

use crate::errors::FolioError;

/// Environment variable holding the Polygon API key
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";

/// Environment variable pinning "now" to a fixed ET timestamp
/// (e.g. `2025-10-14 10:00:00`) for deterministic runs
pub const MOCK_NOW_ENV: &str = "FOLIO_MOCK_NOW";

/// Runtime settings resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
}

impl Settings {
    /// Resolve settings from the environment
    ///
    /// A missing API key is fatal: nothing downstream can run without it.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                FolioError::Configuration(format!("Missing {} in environment or .env", API_KEY_ENV))
            })?;

        Ok(Self {
            api_key,
            base_url: "https://api.polygon.io".to_string(),
        })
    }

    /// Point the provider at a different host (tests use a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
