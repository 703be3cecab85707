//! popwallet CLI - Proof-of-Payment submission from a local wallet

#![allow(dead_code)] // Verification helpers are only exercised by tests

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod crypto;
mod http_sender;
mod secure_storage;
mod wallet_store;




use commands::*;
use config::{PopConfig, DEFAULT_TIMEOUT_SECS};

#[derive(Parser)]
#[command(name = "popwallet")]
#[command(version)]
#[command(about = "Prove payment of a wallet transaction to the party that requested it")]
#[command(long_about = r#"
popwallet answers Proof-of-Payment requests. A merchant hands you a
btcpop: URI naming a transaction; popwallet finds it in your history,
signs a proof with your wallet key and sends it to the merchant.

Quick Start:
  1. popwallet keygen                       Create the wallet signing key
  2. popwallet add-tx --txid .. --value ..  Record a payment you made
  3. popwallet prove 'btcpop:?p=..&n=..'    Answer a payment request
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Wallet data directory (default: $POPWALLET_DIR or ~/.popwallet)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Timeout for delivering a proof, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the wallet signing key
    Keygen {
        /// Force overwrite an existing key
        #[arg(short, long)]
        force: bool,

        /// Store the key without a passphrase
        #[arg(long)]
        no_encrypt: bool,
    },

    /// Record a transaction in the wallet history
    AddTx {
        /// Transaction id (64 hex characters)
        #[arg(long)]
        txid: String,

        /// Net value in base units; negative for payments made
        #[arg(long, allow_hyphen_values = true)]
        value: i64,

        /// Memo shown in history and matched against request labels
        #[arg(long)]
        memo: Option<String>,

        /// Unix timestamp (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// List wallet transactions, newest first
    History,

    /// Answer a Proof-of-Payment request
    Prove {
        /// The btcpop: request URI
        uri: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show configuration and key info
    Info,
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = PopConfig::resolve(cli.data_dir, cli.timeout_secs)?;
    tracing::debug!(data_dir = %config.data_dir.display(), "resolved configuration");

    match cli.command {
        Commands::Keygen { force, no_encrypt } => {
            keygen::run(&config, keygen::KeygenOptions { force, encrypt: !no_encrypt })?;
        }
        Commands::AddTx { txid, value, memo, timestamp } => {
            add_tx::run(&config, &txid, value, memo.as_deref(), timestamp)?;
        }
        Commands::History => {
            history::run(&config)?;
        }
        Commands::Prove { uri, yes } => {
            prove::run(&config, &uri, yes).await?;
        }
        Commands::Info => {
            info::run(&config)?;
        }
    }

    Ok(())
}
