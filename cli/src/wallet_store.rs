//! JSON-backed wallet transaction history

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use popwallet_core::{Transaction, TransactionHistory};

use crate::config::write_private;

#[derive(Serialize, Deserialize, Default)]
pub struct WalletFile {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl WalletFile {
    /// Load the history, or an empty one if the file does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).context("Failed to read wallet file")?;
        serde_json::from_str(&json).context("Failed to parse wallet file")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_private(path, &json)
    }

    /// Record a transaction; ids must be unique
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        if self.transactions.iter().any(|t| t.id == tx.id) {
            bail!("Transaction {} is already recorded", tx.id);
        }
        self.transactions.push(tx);
        Ok(())
    }
}

impl TransactionHistory for WalletFile {
    fn transactions_by_time(&self) -> Vec<Transaction> {
        self.transactions.transactions_by_time()
    }
}

/// Wallet file location plus its loaded contents
pub struct WalletStore {
    path: PathBuf,
    pub wallet: WalletFile,
}

impl WalletStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let wallet = WalletFile::load(&path)?;
        Ok(Self { path, wallet })
    }

    pub fn save(&self) -> Result<()> {
        self.wallet.save(&self.path)
    }
}
