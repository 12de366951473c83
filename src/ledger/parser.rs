//! Merged-ledger CSV parsing
//!
//! The input is the brokerage activity export after an upstream merge
//! step: one row per event with `Run Date`, `Action`, `Symbol`,
//! `Quantity`, `Price`, `Amount`, `Type` columns. Only rows with a
//! share effect become trades; anything with an unparseable date is
//! dropped before it can reach the reconstruction engine.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use super::types::{Trade, TradeSide};

#[derive(Debug, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Run Date", default)]
    run_date: String,
    #[serde(rename = "Action", default)]
    action: String,
    #[serde(rename = "Symbol", default)]
    symbol: String,
    #[serde(rename = "Quantity", default)]
    quantity: String,
    #[serde(rename = "Price", default)]
    price: String,
    #[serde(rename = "Amount", default)]
    amount: String,
    #[serde(rename = "Type", default)]
    row_type: String,
}

/// Parse an account's merged ledger file
pub fn parse_ledger_file(path: &Path) -> Result<Vec<Trade>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open ledger {}", path.display()))?;
    parse_ledger(file)
}

/// Parse ledger rows into date-ordered trades
///
/// Ties on the same date keep their original ledger order.
pub fn parse_ledger<R: Read>(reader: R) -> Result<Vec<Trade>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut trades = Vec::new();
    for row in csv_reader.deserialize::<LedgerRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::debug!("Skipping malformed ledger row: {}", e);
                continue;
            }
        };

        let Some(date) = parse_run_date(&row.run_date) else {
            continue;
        };

        let action = row.action.to_uppercase();
        let symbol = row.symbol.trim().to_string();

        if let Some(side) = trade_side(&action) {
            trades.push(Trade {
                date,
                symbol,
                side,
                quantity: parse_number(&row.quantity),
                price: parse_number(&row.price),
                amount: parse_number(&row.amount),
            });
        } else if is_distribution(&action, &row.row_type) {
            // Reinvested shares enter as a zero-price buy
            trades.push(Trade {
                date,
                symbol,
                side: TradeSide::Buy,
                quantity: parse_number(&row.quantity),
                price: 0.0,
                amount: 0.0,
            });
        }
    }

    // Stable: same-day trades keep ledger order
    trades.sort_by_key(|t| t.date);
    Ok(trades)
}

fn trade_side(action: &str) -> Option<TradeSide> {
    if action.contains("YOU BOUGHT") {
        Some(TradeSide::Buy)
    } else if action.contains("YOU SOLD") {
        Some(TradeSide::Sell)
    } else {
        None
    }
}

fn is_distribution(action: &str, row_type: &str) -> bool {
    let keyword = ["DIVIDEND", "INTEREST", "DISTRIBUTION", "REINVEST"]
        .iter()
        .any(|k| action.contains(k));
    keyword && row_type.to_uppercase().contains("SHARES")
}

fn parse_run_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn parse_number(raw: &str) -> f64 {
    raw.trim()
        .replace(['$', ','], "")
        .parse()
        .unwrap_or(0.0)
}
