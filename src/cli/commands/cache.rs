//! Inspect or clear the price cache

use anyhow::Result;
use clap::Args;
use comfy_table::{presets::ASCII_MARKDOWN, Table};
use owo_colors::OwoColorize;

use crate::data_paths::DataPaths;
use crate::prices::cache::PriceCache;

#[derive(Args, Clone)]
pub struct CacheArgs {
    /// Remove every cached entry
    #[arg(long)]
    pub clear: bool,
}

pub struct CacheCommand {
    args: CacheArgs,
}

impl CacheCommand {
    pub fn new(args: CacheArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let cache = PriceCache::new(data_paths.price_cache())?;

        if self.args.clear {
            let removed = cache.clear()?;
            println!("{}", format!("Removed {removed} cache entries").bright_green());
            return Ok(());
        }

        let entries = cache.entries();
        if entries.is_empty() {
            println!("{}", "Price cache is empty".yellow());
            return Ok(());
        }

        let mut table = Table::new();
        table.load_preset(ASCII_MARKDOWN);
        table.set_header(vec!["Symbol", "Start", "End", "Bars"]);
        for entry in &entries {
            table.add_row(vec![
                entry.symbol.clone(),
                entry.start.to_string(),
                entry.end.to_string(),
                entry.bars.to_string(),
            ]);
        }
        println!("{table}");

        Ok(())
    }
}
