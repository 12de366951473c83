//! Trade replay into a position table
//!
//! Each trade takes effect on the first priced date at or after its
//! ledger date and carries forward from there. A sell that would push a
//! position below zero is rejected and excluded from everything
//! downstream; the rest of the ledger still applies.

use std::collections::BTreeSet;

use crate::errors::FolioError;
use crate::ledger::Trade;
use crate::timeseries::DailyFrame;

use super::EPSILON;

/// Replay trades against the price table
///
/// Returns the date×symbol quantity table (no cell below zero) and the
/// list of trades that were actually applied. Rejected and unpriceable
/// trades never reach downstream valuation or trade statistics.
pub fn reconstruct(trades: &[Trade], prices: &DailyFrame) -> (DailyFrame, Vec<Trade>) {
    let symbols: Vec<String> = trades
        .iter()
        .filter(|t| prices.has_symbol(&t.symbol))
        .map(|t| t.symbol.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut positions = DailyFrame::zeroed(prices.index().to_vec(), &symbols);
    let mut accepted = Vec::new();

    for trade in trades {
        if !positions.has_symbol(&trade.symbol) {
            tracing::debug!(
                "Dropping trade in {} on {}: symbol absent from price table",
                trade.symbol,
                trade.date
            );
            continue;
        }
        // Trades settle on the next available priced date, never before
        let Some(row) = positions.first_row_at_or_after(trade.date) else {
            tracing::debug!(
                "Dropping trade in {} on {}: no priced date at or after it",
                trade.symbol,
                trade.date
            );
            continue;
        };
        let Some(column) = positions.column_mut(&trade.symbol) else {
            continue;
        };

        let delta = trade.signed_quantity();
        let pre_trade_quantity = column[row];
        let shortfall = pre_trade_quantity + delta;
        if shortfall < -EPSILON {
            let rejection = FolioError::InvalidTrade {
                symbol: trade.symbol.clone(),
                side: trade.side.label().to_string(),
                quantity: trade.quantity,
                date: trade.date,
                shortfall,
            };
            tracing::warn!("Ignoring {}", rejection);
            continue;
        }

        // Clamp at zero to absorb residual floating error
        for value in &mut column[row..] {
            *value = (*value + delta).max(0.0);
        }
        accepted.push(trade.clone());
    }

    (positions, accepted)
}
