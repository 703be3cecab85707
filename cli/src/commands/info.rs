//! Show configuration and key info

use anyhow::Result;
use colored::Colorize;

use crate::config::PopConfig;
use crate::secure_storage::SecureKeyStorage;
use crate::wallet_store::WalletStore;

pub fn run(config: &PopConfig) -> Result<()> {
    println!();
    println!("{}", "popwallet Configuration".yellow().bold());
    println!();

    println!("{}:", "Data Directory".cyan());
    println!("  {}", config.data_dir.display());
    println!();

    let storage = SecureKeyStorage::new(config.keys_file());
    match storage.load() {
        Ok(file) => {
            println!("{}", "Signing Key: CONFIGURED".green());
            println!("  Created: {}", file.created_at);
            println!("  Public key: {}", file.public_key);
            if file.encrypted {
                println!("  Encryption: {}", "passphrase".green());
            } else {
                println!("  Encryption: {}", "none".yellow());
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "no usable key file");
            println!("{}", "Signing Key: NOT CONFIGURED".red());
            println!("  Run 'popwallet keygen' to generate a key");
        }
    }
    println!();

    println!("{}:", "Wallet".cyan());
    let store = WalletStore::open(config.wallet_file())?;
    println!("  Transactions: {}", store.wallet.transactions.len());
    println!();

    println!("{}:", "Delivery Timeout".cyan());
    println!("  {}s", config.timeout.as_secs());
    println!();

    Ok(())
}
