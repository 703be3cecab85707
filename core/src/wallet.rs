//! Wallet-side data the workflow reads but never mutates

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::unlock::DecryptionKey;

/// Transaction identifier, lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes, if the identifier is valid hex
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        hex::decode(&self.0).ok()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A transaction as seen from the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    /// Net value to the wallet in the smallest currency unit (negative when spent)
    pub value: i64,
    /// User memo, compared against the request label
    #[serde(default)]
    pub memo: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(id: impl Into<TxId>, value: i64, memo: Option<&str>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            value,
            memo: memo.map(str::to_string),
            timestamp,
        }
    }
}

/// Read access to the wallet's transaction history
pub trait TransactionHistory: Send + Sync {
    /// Transactions ordered by increasing age, newest first
    fn transactions_by_time(&self) -> Vec<Transaction>;
}

impl TransactionHistory for Vec<Transaction> {
    fn transactions_by_time(&self) -> Vec<Transaction> {
        let mut txs = self.clone();
        txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        txs
    }
}

/// Key-derivation function configured for an encrypted wallet
pub trait KeyCrypter: Send + Sync {
    /// Derive the key-encryption key; a wrong passphrase is not detected here
    fn derive_key(&self, passphrase: &str) -> Result<DecryptionKey>;
}

/// Wallet signing-key material as seen by the key unlocker
pub trait WalletKeys: Send + Sync {
    /// `None` when the signing key is stored unencrypted
    fn key_crypter(&self) -> Option<&dyn KeyCrypter>;

    fn is_encrypted(&self) -> bool {
        self.key_crypter().is_some()
    }
}
