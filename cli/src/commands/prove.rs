//! Answer a Proof-of-Payment request

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;

use popwallet_core::{Capabilities, PopWorkflow, StateController, WorkflowState};

use crate::config::PopConfig;
use crate::crypto::Ed25519ProofGenerator;
use crate::http_sender::HttpPopSender;
use crate::secure_storage::{prompt_password, SecureKeyStorage, WalletKeyStore};
use crate::wallet_store::WalletStore;

/// Passphrase attempts before giving up
const MAX_PASSWORD_ATTEMPTS: usize = 3;

pub async fn run(config: &PopConfig, uri: &str, yes: bool) -> Result<()> {
    let store = WalletStore::open(config.wallet_file())?;
    let keys = Arc::new(WalletKeyStore::new(
        SecureKeyStorage::new(config.keys_file()).load()?,
    ));

    let capabilities = Capabilities {
        wallet: keys.clone(),
        generator: Arc::new(Ed25519ProofGenerator::new(keys)),
        sender: Arc::new(HttpPopSender::new(config.timeout)),
    };

    let mut workflow = PopWorkflow::from_uri(uri, &store.wallet, capabilities)?;
    show_request(&workflow);

    if !yes && !confirm("Send proof of payment? [y/N] ")? {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    for attempt in 1..=MAX_PASSWORD_ATTEMPTS {
        let passphrase = if workflow.controller().passphrase_visible() {
            Some(prompt_password("Wallet password: ")?)
        } else {
            None
        };

        let mut last = WorkflowState::Input;
        let resolution = workflow
            .submit(passphrase, |ctl: &StateController| {
                if ctl.state() != last {
                    last = ctl.state();
                    println!("  {}", ctl.label().dimmed());
                }
            })
            .await?;

        if resolution.state.is_terminal() {
            if resolution.message.is_error() {
                bail!("{}", resolution.message);
            }
            println!();
            println!("{}", resolution.message.to_string().green().bold());
            return Ok(());
        }

        println!("{}", resolution.message.to_string().red());
        tracing::debug!(attempt, "bad passphrase");
    }

    bail!("Too many failed password attempts");
}

fn show_request(workflow: &PopWorkflow) {
    let request = workflow.request();
    let tx = workflow.transaction();
    let destination = workflow.destination();

    println!();
    println!("{}", "=== Proof of Payment Request ===".cyan().bold());
    println!();
    println!("{}:", "Transaction".yellow());
    println!("  {}", tx.id);
    println!("  Value: {}", tx.value);
    if let Some(memo) = &tx.memo {
        println!("  Memo: {}", memo);
    }
    println!("  Time: {}", tx.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();
    println!("{}:", "Destination".yellow());
    println!("  {}", destination.host());
    if !destination.is_secure() {
        println!(
            "  {}",
            "Warning: this destination does not use a secure connection!".red()
        );
    }
    if let Some(message) = &request.message {
        println!();
        println!("{}:", "Message".yellow());
        println!("  {}", message);
    }
    println!();
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
