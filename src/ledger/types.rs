//! Parsed trade ledger types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a trade's share effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn label(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// One ledger event with a share effect
///
/// Immutable once parsed. `quantity` is always non-negative; the signed
/// effect on the position comes from `side`. A distribution or dividend
/// reinvestment arrives as a `Buy` with `price` and `amount` of zero:
/// shares appear without a cost basis tracked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
}

impl Trade {
    /// Signed share delta this trade applies to its position
    pub fn signed_quantity(&self) -> f64 {
        match self.side {
            TradeSide::Buy => self.quantity,
            TradeSide::Sell => -self.quantity,
        }
    }
}
