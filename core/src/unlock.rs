//! Key unlocker
//!
//! Turns a user passphrase into the key that decrypts the wallet's signing
//! key. The derived key is not checked here; a wrong passphrase only shows up
//! when the signing key is decrypted, so the (expensive) KDF runs once per
//! attempt.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PopError, Result};
use crate::wallet::WalletKeys;

pub const DECRYPTION_KEY_LEN: usize = 32;

/// Passphrase-derived key, zeroed on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DecryptionKey {
    bytes: [u8; DECRYPTION_KEY_LEN],
}

impl DecryptionKey {
    pub fn from_bytes(bytes: [u8; DECRYPTION_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes (use carefully)
    pub fn as_bytes(&self) -> &[u8; DECRYPTION_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecryptionKey(..)")
    }
}

/// Derive the decryption key for `wallet`, or `None` if its key is not encrypted.
///
/// Any KDF failure is reported as [`PopError::BadDecryptionKey`] so the user
/// is sent back to the passphrase prompt.
pub fn derive_key(wallet: &dyn WalletKeys, passphrase: &str) -> Result<Option<DecryptionKey>> {
    let Some(crypter) = wallet.key_crypter() else {
        tracing::debug!("signing key not encrypted, no decryption key needed");
        return Ok(None);
    };

    match crypter.derive_key(passphrase.trim()) {
        Ok(key) => Ok(Some(key)),
        Err(e @ PopError::BadDecryptionKey(_)) => Err(e),
        Err(e) => Err(PopError::BadDecryptionKey(e.to_string())),
    }
}
