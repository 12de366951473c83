//! Per-symbol fetch summary table

use chrono::NaiveDate;
use comfy_table::{presets::ASCII_MARKDOWN, Table};

use super::series::LiveQuote;
use super::types::CacheStatus;

/// One row of the post-load summary
#[derive(Debug, Clone)]
pub struct SymbolSummary {
    pub symbol: String,
    pub status: CacheStatus,
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
    pub rows: usize,
    pub live: Option<LiveQuote>,
}

impl SymbolSummary {
    /// Row for a symbol that produced no usable data
    pub fn empty(symbol: &str, status: CacheStatus) -> Self {
        Self {
            symbol: symbol.to_string(),
            status,
            first: None,
            last: None,
            rows: 0,
            live: None,
        }
    }
}

/// Render the summary rows as a table
pub fn render(rows: &[SymbolSummary]) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_header(vec![
        "Symbol",
        "Cache",
        "Start",
        "End",
        "Rows",
        "Live",
        "Live Price",
    ]);

    for row in rows {
        let fmt_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let (live, live_price) = match row.live {
            Some(quote) => (quote.session.label().to_string(), format!("{:.2}", quote.price)),
            None => ("NO".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            row.symbol.clone(),
            row.status.label().to_string(),
            fmt_date(row.first),
            fmt_date(row.last),
            row.rows.to_string(),
            live,
            live_price,
        ]);
    }

    table.to_string()
}
