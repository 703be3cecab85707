//! Record a transaction in the local wallet history

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use colored::Colorize;

use popwallet_core::Transaction;

use crate::config::PopConfig;
use crate::wallet_store::WalletStore;

pub fn run(
    config: &PopConfig,
    txid: &str,
    value: i64,
    memo: Option<&str>,
    timestamp: Option<i64>,
) -> Result<()> {
    let txid = txid.trim();
    if txid.len() != 64 || !txid.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Transaction id must be 64 hex characters");
    }

    let timestamp = match timestamp {
        Some(secs) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .context("Timestamp out of range")?,
        None => Utc::now(),
    };

    let mut store = WalletStore::open(config.wallet_file())?;
    store.wallet.add(Transaction::new(txid, value, memo, timestamp))?;
    store.save()?;

    println!(
        "{} {} ({})",
        "Recorded".green(),
        txid.to_ascii_lowercase(),
        value
    );

    Ok(())
}
