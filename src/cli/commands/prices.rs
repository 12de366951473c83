//! Refresh cached prices for explicit symbols

use anyhow::Result;
use chrono::{Days, NaiveDate};
use clap::Args;
use owo_colors::OwoColorize;

use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::prices::cache::PriceCache;
use crate::prices::provider::PolygonProvider;
use crate::prices::{load_price_table, summary};

#[derive(Args, Clone)]
pub struct PricesArgs {
    /// Symbols to load
    #[arg(required = true)]
    pub symbols: Vec<String>,

    /// Start of the history window (default: one year back)
    #[arg(long)]
    pub start: Option<NaiveDate>,
}

pub struct PricesCommand {
    args: PricesArgs,
}

impl PricesCommand {
    pub fn new(args: PricesArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let settings = Settings::from_env()?;
        let provider = PolygonProvider::new(&settings);
        let clock = SystemClock;
        let cache = PriceCache::new(data_paths.price_cache())?;

        let today = clock.today_et();
        let start = self
            .args
            .start
            .unwrap_or_else(|| today.checked_sub_days(Days::new(365)).unwrap_or(today));

        let load = load_price_table(&provider, &cache, &clock, &self.args.symbols, start).await;
        println!("{}", summary::render(&load.summary));

        if let Some(latest) = load.table.latest_date() {
            println!("{}", format!("Latest closes ({latest})").bright_blue());
            for symbol in self.args.symbols.iter() {
                match load.table.get(latest, symbol) {
                    Some(close) => println!("  {symbol}: {close:.2}"),
                    None => println!("  {symbol}: {}", "no data".yellow()),
                }
            }
        } else {
            println!("{}", "No price data for any requested symbol".yellow());
        }

        Ok(())
    }
}
