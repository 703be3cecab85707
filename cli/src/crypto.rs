//! Cryptographic operations for the popwallet CLI
//!
//! Proof construction and Ed25519 signing behind the workflow's
//! `ProofGenerator` capability.
//!
//! Security features:
//! - Signing secrets are zeroized on drop
//! - The stored public key is compared in constant time before signing
//! - The decryption key is only borrowed; the caller drops it after signing

use std::sync::Arc;

use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signature, Signer, Verifier};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use popwallet_core::{
    DecryptionKey, Nonce, PopError, ProofGenerator, SignedProof, Transaction, UnsignedProof,
};

use crate::secure_storage::{KeyData, KeyStoreError, WalletKeyStore};

/// Domain separator for proof payloads
const POP_DOMAIN: &[u8] = b"popwallet_pop_v1";

/// Transaction ids are 32-byte hashes
const TXID_LEN: usize = 32;

/// Upper bound on request nonces
pub const MAX_NONCE_LEN: usize = 64;

// ============================================================================
// Signing Keys
// ============================================================================

/// Ed25519 signing key pair
///
/// Security:
/// - Secret bytes are zeroized on drop
/// - Clone is NOT derived to prevent accidental copies
pub struct SigningKeyPair {
    secret: [u8; 32],
    /// Ed25519 public key
    pub public_key: [u8; 32],
}

impl SigningKeyPair {
    /// Generate a new random key pair from OS entropy
    pub fn generate() -> anyhow::Result<Self> {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let pair = Self::from_secret(&bytes);
        bytes.zeroize();
        pair
    }

    /// Reconstruct from a stored secret
    pub fn from_secret(secret: &[u8; 32]) -> anyhow::Result<Self> {
        let secret_key = SecretKey::from_bytes(secret)
            .map_err(|e| anyhow::anyhow!("Invalid signing secret: {}", e))?;
        let public = PublicKey::from(&secret_key);

        Ok(Self {
            secret: *secret,
            public_key: public.to_bytes(),
        })
    }

    /// Export the secret for storage
    ///
    /// WARNING: Handle these bytes with extreme care!
    pub fn key_data(&self) -> KeyData {
        KeyData {
            signing_secret: self.secret,
        }
    }

    pub fn sign(&self, message: &[u8]) -> anyhow::Result<[u8; 64]> {
        let secret = SecretKey::from_bytes(&self.secret)
            .map_err(|e| anyhow::anyhow!("Invalid signing secret: {}", e))?;
        let public = PublicKey::from(&secret);
        let keypair = Keypair { secret, public };
        Ok(keypair.sign(message).to_bytes())
    }
}

impl Drop for SigningKeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

// ============================================================================
// Proof Payload
// ============================================================================

/// payload = SHA256(domain || txid || nonce)
pub fn compute_payload(txid: &[u8], nonce: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(POP_DOMAIN);
    hasher.update(txid);
    hasher.update(nonce);

    let result = hasher.finalize();
    let mut payload = [0u8; 32];
    payload.copy_from_slice(&result);
    payload
}

/// Check a signed proof against its own public key and payload
pub fn verify_proof(proof: &SignedProof) -> bool {
    let Some(txid) = proof.txid.to_bytes() else {
        return false;
    };
    if compute_payload(&txid, proof.nonce.as_bytes())[..] != proof.payload[..] {
        return false;
    }

    let Ok(public) = PublicKey::from_bytes(&proof.public_key) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(&proof.signature[..]) else {
        return false;
    };
    public.verify(&proof.payload, &signature).is_ok()
}

// ============================================================================
// Proof Generator
// ============================================================================

/// Builds proofs for wallet transactions and signs them with the stored key
pub struct Ed25519ProofGenerator {
    keys: Arc<WalletKeyStore>,
}

impl Ed25519ProofGenerator {
    pub fn new(keys: Arc<WalletKeyStore>) -> Self {
        Self { keys }
    }
}

impl ProofGenerator for Ed25519ProofGenerator {
    fn create_proof(
        &self,
        transaction: &Transaction,
        nonce: &Nonce,
    ) -> popwallet_core::Result<UnsignedProof> {
        let txid = transaction.id.to_bytes().filter(|b| b.len() == TXID_LEN).ok_or_else(|| {
            PopError::ProofConstruction(format!(
                "transaction id {} is not a {}-byte hash",
                transaction.id, TXID_LEN
            ))
        })?;

        if nonce.is_empty() || nonce.as_bytes().len() > MAX_NONCE_LEN {
            return Err(PopError::ProofConstruction(format!(
                "nonce must be 1-{} bytes, got {}",
                MAX_NONCE_LEN,
                nonce.as_bytes().len()
            )));
        }

        Ok(UnsignedProof {
            txid: transaction.id.clone(),
            nonce: nonce.clone(),
            payload: compute_payload(&txid, nonce.as_bytes()).to_vec(),
        })
    }

    fn sign_proof(
        &self,
        proof: UnsignedProof,
        key: Option<&DecryptionKey>,
    ) -> popwallet_core::Result<SignedProof> {
        let key_data = self.keys.file().decrypt(key).map_err(|e| match e {
            KeyStoreError::BadKey => PopError::BadDecryptionKey(e.to_string()),
            other => PopError::ProofSigning(other.to_string()),
        })?;

        let pair = SigningKeyPair::from_secret(&key_data.signing_secret)
            .map_err(|e| PopError::ProofSigning(e.to_string()))?;
        drop(key_data);

        let stored_public = self
            .keys
            .file()
            .public_key_bytes()
            .map_err(|e| PopError::ProofSigning(e.to_string()))?;
        if !bool::from(pair.public_key[..].ct_eq(&stored_public[..])) {
            return Err(PopError::ProofSigning(
                "decrypted key does not match the stored public key".into(),
            ));
        }

        let signature = pair
            .sign(&proof.payload)
            .map_err(|e| PopError::ProofSigning(e.to_string()))?;

        Ok(SignedProof {
            txid: proof.txid,
            nonce: proof.nonce,
            payload: proof.payload,
            public_key: pair.public_key.to_vec(),
            signature: signature.to_vec(),
        })
    }
}
