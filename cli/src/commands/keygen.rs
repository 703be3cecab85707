//! Key generation command with optional encrypted storage

use anyhow::{bail, Result};
use colored::Colorize;

use crate::config::PopConfig;
use crate::crypto::SigningKeyPair;
use crate::secure_storage::{prompt_new_password, KeyStoreFile, SecureKeyStorage};

/// Options for key generation
pub struct KeygenOptions {
    /// Force overwrite existing key
    pub force: bool,
    /// Protect the key with a passphrase
    pub encrypt: bool,
}

pub fn run(config: &PopConfig, options: KeygenOptions) -> Result<()> {
    let storage = SecureKeyStorage::new(config.keys_file());

    if storage.exists() && !options.force {
        bail!(
            "A signing key already exists. Use --force to overwrite.\n\
             Warning: Proofs for earlier payments are bound to the existing key!"
        );
    }

    println!("{}", "=== popwallet Key Generation ===".cyan().bold());
    println!();

    let pair = SigningKeyPair::generate()?;
    let key_data = pair.key_data();

    let file = if options.encrypt {
        println!("{}", "Choose a strong password to encrypt your signing key.".cyan());
        println!("{}", "Requirements: 8+ chars, uppercase, lowercase, and numbers".dimmed());
        println!();

        let password = prompt_new_password("Enter password: ")?;
        KeyStoreFile::encrypt(&key_data, &pair.public_key, &password)?
    } else {
        println!(
            "{}",
            "Warning: the signing key will be stored without a passphrase!".yellow()
        );
        KeyStoreFile::plain(&key_data, &pair.public_key)
    };
    drop(key_data);

    storage.save(&file)?;
    tracing::info!(path = %storage.path().display(), encrypted = file.encrypted, "signing key saved");

    println!();
    println!("{}", "Signing key generated successfully!".green().bold());
    println!();
    println!("{}:", "Public Key".yellow());
    println!("  {}", hex::encode(pair.public_key));
    println!();
    println!(
        "{}",
        format!("Key saved to: {}", storage.path().display()).dimmed()
    );

    Ok(())
}
