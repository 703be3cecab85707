//! List the wallet history

use anyhow::Result;
use colored::Colorize;

use popwallet_core::TransactionHistory;

use crate::config::PopConfig;
use crate::wallet_store::WalletStore;

pub fn run(config: &PopConfig) -> Result<()> {
    let store = WalletStore::open(config.wallet_file())?;
    let transactions = store.wallet.transactions_by_time();

    if transactions.is_empty() {
        println!("{}", "No transactions recorded.".yellow());
        println!("  Run 'popwallet add-tx' to record one");
        return Ok(());
    }

    println!();
    println!("{}", format!("{} transaction(s)", transactions.len()).cyan().bold());
    println!();

    for tx in &transactions {
        let value = if tx.value < 0 {
            tx.value.to_string().red()
        } else {
            tx.value.to_string().green()
        };
        println!(
            "  {}  {}  {:>12}  {}",
            tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
            tx.id,
            value,
            tx.memo.as_deref().unwrap_or("").dimmed()
        );
    }
    println!();

    Ok(())
}
