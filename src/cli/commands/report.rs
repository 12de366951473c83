//! Full per-account reconstruction pipeline

use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::accounts::{load_accounts, update_report_index, Account, ReportEntry};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::ledger::parse_ledger_file;
use crate::portfolio::{positions, report, returns};
use crate::prices::cache::PriceCache;
use crate::prices::provider::{PolygonProvider, PriceProvider};
use crate::prices::{load_price_table, summary};

#[derive(Args, Clone)]
pub struct ReportArgs {
    /// Account ids to process (default: every registered account)
    pub account_ids: Vec<String>,

    /// Benchmark symbol fetched alongside each account
    #[arg(long, default_value = "SPY")]
    pub benchmark: String,
}

pub struct ReportCommand {
    args: ReportArgs,
}

impl ReportCommand {
    pub fn new(args: ReportArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let settings = Settings::from_env()?;
        let provider = PolygonProvider::new(&settings);
        let clock = SystemClock;
        let cache = PriceCache::new(data_paths.price_cache())?;

        let mut accounts = load_accounts(&data_paths.accounts_file())?;
        if !self.args.account_ids.is_empty() {
            accounts.retain(|a| self.args.account_ids.contains(&a.id));
        }
        if accounts.is_empty() {
            println!("{}", "No matching accounts to process".yellow());
            return Ok(());
        }

        for (i, account) in accounts.iter().enumerate() {
            if let Err(e) = self
                .run_account(i, account, &provider, &cache, &clock, &data_paths)
                .await
            {
                // One bad account never takes down the rest of the run
                tracing::error!("Account {} failed: {}", account.id, e);
            }
        }

        Ok(())
    }

    async fn run_account(
        &self,
        index: usize,
        account: &Account,
        provider: &dyn PriceProvider,
        cache: &PriceCache,
        clock: &dyn Clock,
        data_paths: &DataPaths,
    ) -> Result<()> {
        let ledger_path = data_paths.ledger_file(&account.id);
        if !ledger_path.exists() {
            tracing::warn!("Skipping {} (no merged ledger found)", account.id);
            return Ok(());
        }

        println!(
            "{}",
            format!("Processing {} → {}", account.id, account.name).bright_blue()
        );

        let trades = parse_ledger_file(&ledger_path)?;
        if trades.is_empty() {
            tracing::warn!("Skipping {} (ledger has no trades)", account.id);
            return Ok(());
        }

        let start = trades[0].date;
        let symbols: Vec<String> = trades
            .iter()
            .map(|t| t.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        tracing::info!("Detected symbols: {:?}", symbols);

        let load = load_price_table(provider, cache, clock, &symbols, start).await;
        println!("{}", summary::render(&load.summary));

        if load.table.is_empty() {
            tracing::warn!("No pricing data for {}, skipping", account.id);
            return Ok(());
        }

        let (position_table, accepted) = positions::reconstruct(&trades, &load.table);
        let valuation = returns::compute(&position_table, &load.table);

        let out_dir = data_paths.out();
        report::write_returns_csv(
            &out_dir.join(format!("returns_{index}.csv")),
            &valuation.portfolio_returns,
        )?;

        // The benchmark shares the cache, so covered ranges stay free
        let bench_load = load_price_table(
            provider,
            cache,
            clock,
            std::slice::from_ref(&self.args.benchmark),
            start,
        )
        .await;
        if bench_load.table.has_symbol(&self.args.benchmark) {
            let bench_returns =
                returns::pct_change_series(&bench_load.table, &self.args.benchmark);
            report::write_returns_csv(
                &out_dir.join(format!("benchmark_{index}.csv")),
                &bench_returns,
            )?;
        } else {
            tracing::warn!("No benchmark data for {}", self.args.benchmark);
        }

        let current = returns::current_weights(&valuation.weights);
        report::write_weights_csv(&out_dir.join(format!("weights_{index}.csv")), &current)?;

        let percentages = returns::trade_percentages(&accepted, &valuation.value);
        report::write_trades_csv(
            &out_dir.join(format!("trades_{index}.csv")),
            &accepted,
            &percentages,
        )?;

        update_report_index(
            &out_dir.join("accounts.json"),
            ReportEntry {
                id: account.id.clone(),
                name: account.name.clone(),
                report: format!("/reports/report_{index}.html"),
                weights: format!("/data/weights_{index}.csv"),
                trades: format!("/data/trades_{index}.csv"),
            },
        )?;

        println!(
            "{}",
            format!(
                "Products written for {} ({} accepted trades, {} holdings)",
                account.id,
                accepted.len(),
                current.len()
            )
            .bright_green()
        );

        Ok(())
    }
}
