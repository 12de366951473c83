//! Trade ledger ingest

pub mod parser;
pub mod types;

pub use parser::{parse_ledger, parse_ledger_file};
pub use types::{Trade, TradeSide};
