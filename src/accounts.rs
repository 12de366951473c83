//! Account registry and report index
//!
//! `data/accounts.json` lists the accounts to process; `out/accounts.json`
//! is the index the report frontend reads, merged entry-by-id so a
//! partial rerun never clobbers other accounts' products.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// One entry of the accounts registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
}

/// One entry of the generated report index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: String,
    pub name: String,
    pub report: String,
    pub weights: String,
    pub trades: String,
}

/// Load the accounts registry; a missing registry is fatal
pub fn load_accounts(path: &Path) -> Result<Vec<Account>> {
    if !path.exists() {
        return Err(anyhow!("Accounts registry {} not found", path.display()));
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let accounts: Vec<Account> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(accounts)
}

/// Merge an entry into the report index, replacing any entry with the same id
pub fn update_report_index(path: &Path, entry: ReportEntry) -> Result<()> {
    let mut entries: Vec<ReportEntry> = if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).unwrap_or_default()
    } else {
        Vec::new()
    };

    entries.retain(|e| e.id != entry.id);
    entries.push(entry);

    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(path, json)?;
    Ok(())
}
