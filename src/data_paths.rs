use std::path::{Path, PathBuf};

/// Default data directory (relative to current working directory)
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Subdirectory paths relative to the data directory
pub const CACHE_DIR: &str = ".cache/polygon";
pub const OUT_DIR: &str = "out";
pub const LOGS_DIR: &str = "logs";

/// Helper struct to manage data paths
///
/// The cache location is always derived from an explicit root so tests
/// and multi-account runs can point at isolated directories.
#[derive(Clone, Debug)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths instance with the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root data directory
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Get the price cache directory
    pub fn price_cache(&self) -> PathBuf {
        self.root.join(CACHE_DIR)
    }

    /// Get the report output directory
    pub fn out(&self) -> PathBuf {
        self.root.join(OUT_DIR)
    }

    /// Get the logs directory
    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Get the accounts registry file
    pub fn accounts_file(&self) -> PathBuf {
        self.root.join("accounts.json")
    }

    /// Get an account's merged ledger CSV
    pub fn ledger_file(&self, account_id: &str) -> PathBuf {
        self.root.join(account_id).join("combined.csv")
    }

    /// Ensure all directories exist
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.price_cache())?;
        std::fs::create_dir_all(self.out())?;
        std::fs::create_dir_all(self.logs())?;
        Ok(())
    }
}
