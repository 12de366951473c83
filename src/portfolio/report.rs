//! Report data products
//!
//! The pipeline's only outputs: a daily returns CSV, a current-weights
//! CSV, and an accepted-trades CSV with per-trade sizing. An external
//! renderer turns these into the human-facing report.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ledger::Trade;
use crate::timeseries::DailySeries;

/// Write a date→return series as `Date,Return`
pub fn write_returns_csv(path: &Path, returns: &DailySeries) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["Date", "Return"])?;
    for (date, value) in returns {
        writer.write_record([date.to_string(), format!("{value}")])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the current-weights snapshot as `Ticker,Portfolio Weight (%)`
pub fn write_weights_csv(path: &Path, weights: &[(String, f64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["Ticker", "Portfolio Weight (%)"])?;
    for (symbol, weight) in weights {
        writer.write_record([symbol.clone(), format!("{:.2}%", weight * 100.0)])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write accepted trades with their percent-of-account sizing
pub fn write_trades_csv(path: &Path, trades: &[Trade], percentages: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record([
        "Date",
        "Ticker",
        "Action",
        "Trade Price ($)",
        "Trade Size (% of Account)",
    ])?;
    for (trade, pct) in trades.iter().zip(percentages) {
        writer.write_record([
            trade.date.to_string(),
            trade.symbol.clone(),
            trade.side.label().to_string(),
            format!("{:.2}", trade.price),
            format!("{:.2}%", pct),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TradeSide;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    #[test]
    fn test_returns_csv_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("returns_0.csv");
        let returns = BTreeMap::from([(d(13), 0.0), (d(14), 0.0625)]);

        write_returns_csv(&path, &returns).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Date,Return\n"));
        assert!(contents.contains("2025-10-13,0\n"));
        assert!(contents.contains("2025-10-14,0.0625\n"));
    }

    #[test]
    fn test_weights_csv_formats_percentages() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("weights_0.csv");
        let weights = vec![("MSFT".to_string(), 0.75), ("AAPL".to_string(), 0.25)];

        write_weights_csv(&path, &weights).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Ticker,Portfolio Weight (%)");
        assert_eq!(lines[1], "MSFT,75.00%");
        assert_eq!(lines[2], "AAPL,25.00%");
    }

    #[test]
    fn test_trades_csv_includes_sizing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("trades_0.csv");
        let trades = vec![Trade {
            date: d(14),
            symbol: "AAPL".to_string(),
            side: TradeSide::Buy,
            quantity: 1.0,
            price: 110.0,
            amount: -110.0,
        }];

        write_trades_csv(&path, &trades, &[25.88]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("2025-10-14,AAPL,BUY,110.00,25.88%"));
    }
}
