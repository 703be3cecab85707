//! Signing-key storage with optional encryption at rest
//!
//! Encrypted stores use AES-256-GCM under a key derived with Argon2id from
//! the passphrase and a stored salt. The passphrase is not verified when the
//! key is derived; a wrong one only surfaces when decryption fails
//! authentication.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::{
    password_hash::{rand_core::RngCore, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context, bail};
use zeroize::{Zeroize, ZeroizeOnDrop};
use std::fs;
use std::path::{Path, PathBuf};

use popwallet_core::{DecryptionKey, KeyCrypter, PopError, WalletKeys};

use crate::config::{write_private, KEYS_FILE};

/// Argon2 parameters for key derivation
const ARGON2_M_COST: u32 = 65536;  // 64 MB memory
const ARGON2_T_COST: u32 = 3;      // 3 iterations
const ARGON2_P_COST: u32 = 4;      // 4 parallel lanes

const KEY_FILE_VERSION: u8 = 1;

/// Why a stored signing key could not be recovered
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    /// Authentication failed: wrong passphrase or tampered file
    #[error("Decryption failed - wrong password or corrupted data")]
    BadKey,

    #[error("Signing key is encrypted but no decryption key was supplied")]
    MissingKey,

    #[error("Corrupted key file: {0}")]
    Corrupt(String),
}

/// On-disk key file
#[derive(Serialize, Deserialize, Clone)]
pub struct KeyStoreFile {
    /// Version for future compatibility
    pub version: u8,
    pub encrypted: bool,
    /// Salt for Argon2, present when encrypted
    pub salt: Option<String>,
    /// Nonce for AES-GCM (base64), present when encrypted
    pub nonce: Option<String>,
    /// Hex secret when plain, base64 ciphertext when encrypted
    pub secret: String,
    /// Ed25519 public key (hex)
    pub public_key: String,
    /// Creation timestamp
    pub created_at: String,
}

/// Unencrypted signing secret (internal use only)
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyData {
    pub signing_secret: [u8; 32],
}

fn argon2() -> Result<Argon2<'static>> {
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
            .map_err(|e| anyhow::anyhow!("Argon2 params error: {}", e))?,
    ))
}

fn derive_with_salt(password: &str, salt: &str) -> Result<DecryptionKey> {
    let mut key_bytes = [0u8; 32];
    argon2()?
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut key_bytes)
        .map_err(|e| anyhow::anyhow!("Key derivation failed: {}", e))?;

    let key = DecryptionKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

impl KeyStoreFile {
    /// Store the secret without encryption
    pub fn plain(data: &KeyData, public_key: &[u8; 32]) -> Self {
        Self {
            version: KEY_FILE_VERSION,
            encrypted: false,
            salt: None,
            nonce: None,
            secret: hex::encode(data.signing_secret),
            public_key: hex::encode(public_key),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Encrypt the secret with a password
    pub fn encrypt(data: &KeyData, public_key: &[u8; 32], password: &str) -> Result<Self> {
        // Generate random salt
        let salt = SaltString::generate(&mut OsRng);
        let key = derive_with_salt(password, salt.as_str())?;

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| anyhow::anyhow!("Cipher creation failed: {}", e))?;

        // Generate random nonce
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = cipher
            .encrypt(&nonce, data.signing_secret.as_ref())
            .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

        Ok(Self {
            version: KEY_FILE_VERSION,
            encrypted: true,
            salt: Some(salt.as_str().to_string()),
            nonce: Some(b64::encode(&nonce_bytes)),
            secret: b64::encode(&ciphertext),
            public_key: hex::encode(public_key),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Derive the key-encryption key; does not check the password
    pub fn derive_key(&self, password: &str) -> Result<DecryptionKey> {
        let salt = self
            .salt
            .as_deref()
            .context("Key file is not encrypted")?;
        derive_with_salt(password, salt)
    }

    /// Recover the signing secret, using `key` when the file is encrypted
    pub fn decrypt(&self, key: Option<&DecryptionKey>) -> std::result::Result<KeyData, KeyStoreError> {
        if !self.encrypted {
            return decode_secret(hex::decode(&self.secret).map_err(|e| KeyStoreError::Corrupt(e.to_string()))?);
        }

        let key = key.ok_or(KeyStoreError::MissingKey)?;

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| KeyStoreError::Corrupt(e.to_string()))?;

        let nonce_bytes = self
            .nonce
            .as_deref()
            .ok_or_else(|| KeyStoreError::Corrupt("missing nonce".into()))
            .and_then(|n| b64::decode(n).map_err(|e| KeyStoreError::Corrupt(e.to_string())))?;
        let ciphertext = b64::decode(&self.secret)
            .map_err(|e| KeyStoreError::Corrupt(e.to_string()))?;

        let nonce_array: [u8; 12] = nonce_bytes
            .try_into()
            .map_err(|_| KeyStoreError::Corrupt("invalid nonce length".into()))?;
        let nonce = Nonce::from(nonce_array);

        let plaintext = cipher
            .decrypt(&nonce, ciphertext.as_ref())
            .map_err(|_| KeyStoreError::BadKey)?;

        decode_secret(plaintext)
    }

    pub fn public_key_bytes(&self) -> Result<[u8; 32]> {
        let bytes = hex::decode(&self.public_key).context("Invalid public key encoding")?;
        bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Invalid public key length"))
    }
}

fn decode_secret(mut bytes: Vec<u8>) -> std::result::Result<KeyData, KeyStoreError> {
    if bytes.len() != 32 {
        let len = bytes.len();
        bytes.zeroize();
        return Err(KeyStoreError::Corrupt(format!("secret has {} bytes, expected 32", len)));
    }
    let mut signing_secret = [0u8; 32];
    signing_secret.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(KeyData { signing_secret })
}

/// Key file manager
pub struct SecureKeyStorage {
    path: PathBuf,
}

impl SecureKeyStorage {
    /// Create a new key storage at the given path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Key file inside a data directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(KEYS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a key file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, file: &KeyStoreFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file)?;
        write_private(&self.path, &json)
    }

    pub fn load(&self) -> Result<KeyStoreFile> {
        if !self.exists() {
            bail!("No signing key found. Run 'popwallet keygen' first.");
        }
        let json = fs::read_to_string(&self.path)
            .context("Failed to read key file")?;
        let file: KeyStoreFile = serde_json::from_str(&json)
            .context("Failed to parse key file")?;
        if file.version != KEY_FILE_VERSION {
            bail!("Unsupported key file version {}", file.version);
        }
        Ok(file)
    }
}

/// The wallet's signing key as seen by the workflow
pub struct WalletKeyStore {
    file: KeyStoreFile,
}

impl WalletKeyStore {
    pub fn new(file: KeyStoreFile) -> Self {
        Self { file }
    }

    pub fn file(&self) -> &KeyStoreFile {
        &self.file
    }
}

impl KeyCrypter for WalletKeyStore {
    fn derive_key(&self, passphrase: &str) -> popwallet_core::Result<DecryptionKey> {
        self.file
            .derive_key(passphrase)
            .map_err(|e| PopError::BadDecryptionKey(e.to_string()))
    }
}

impl WalletKeys for WalletKeyStore {
    fn key_crypter(&self) -> Option<&dyn KeyCrypter> {
        if self.file.encrypted {
            Some(self)
        } else {
            None
        }
    }
}

/// Password strength validation
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_upper || !has_lower || !has_digit {
        bail!("Password must contain uppercase, lowercase, and numeric characters");
    }

    Ok(())
}

/// Prompt for password securely (hides input)
pub fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt)
        .context("Failed to read password")
}

/// Prompt for password with confirmation
pub fn prompt_new_password(prompt: &str) -> Result<String> {
    let password = prompt_password(prompt)?;
    let confirm = prompt_password("Confirm password: ")?;

    if password != confirm {
        bail!("Passwords do not match");
    }

    validate_password_strength(&password)?;

    Ok(password)
}

// Base64 encoding/decoding helpers
mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};

    pub fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    pub fn decode(s: &str) -> anyhow::Result<Vec<u8>> {
        STANDARD.decode(s).map_err(|e| anyhow::anyhow!("Base64 decode error: {}", e))
    }
}
