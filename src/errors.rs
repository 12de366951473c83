//! Error taxonomy for the reconstruction pipeline
//!
//! Most conditions here are non-fatal: the pipeline logs them and keeps
//! going with whatever data it has. Only `Configuration` (and a report
//! run where no symbol produced any data) terminates processing, and
//! only for the affected account.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FolioError {
    /// Non-2xx response or transport failure from the price provider
    #[error("network failure for {symbol}: {message}")]
    NetworkFailure { symbol: String, message: String },

    /// Cache file exists but cannot be read or parsed; treated as a miss
    #[error("corrupt cache entry {path}: {message}")]
    CacheCorruption { path: String, message: String },

    /// A trade that would drive a position below zero
    #[error("invalid trade: {side} {quantity} {symbol} on {date} leaves {shortfall}")]
    InvalidTrade {
        symbol: String,
        side: String,
        quantity: f64,
        date: NaiveDate,
        shortfall: f64,
    },

    /// A requested symbol never returned any bars
    #[error("no price data for {symbol}")]
    MissingPriceData { symbol: String },

    /// Missing required credential or registry; fatal at startup
    #[error("configuration error: {0}")]
    Configuration(String),
}
