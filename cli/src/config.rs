//! Configuration and on-disk locations for the popwallet CLI

use std::path::{Path, PathBuf};
use std::fs;
use std::time::Duration;
use anyhow::{Result, Context};

/// Default directory for wallet data
const DATA_DIR: &str = ".popwallet";
/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "POPWALLET_DIR";

pub const KEYS_FILE: &str = "keys.enc";
pub const WALLET_FILE: &str = "wallet.json";

/// Default HTTP timeout for proof submission
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved CLI configuration
#[derive(Debug, Clone)]
pub struct PopConfig {
    pub data_dir: PathBuf,
    pub timeout: Duration,
}

impl PopConfig {
    /// `--data-dir` wins over `POPWALLET_DIR`, which wins over `~/.popwallet`
    pub fn resolve(data_dir: Option<PathBuf>, timeout_secs: u64) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => match std::env::var_os(DATA_DIR_ENV) {
                Some(dir) => PathBuf::from(dir),
                None => dirs::home_dir()
                    .context("Could not find home directory")?
                    .join(DATA_DIR),
            },
        };

        Ok(Self {
            data_dir,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn keys_file(&self) -> PathBuf {
        self.data_dir.join(KEYS_FILE)
    }

    pub fn wallet_file(&self) -> PathBuf {
        self.data_dir.join(WALLET_FILE)
    }
}

/// Write a file readable only by its owner
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, contents)?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents)?;
    }

    Ok(())
}
