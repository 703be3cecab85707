//! Proof construction and signing capability

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::request::Nonce;
use crate::unlock::DecryptionKey;
use crate::wallet::{Transaction, TxId};

/// A proof that has been built but not signed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedProof {
    pub txid: TxId,
    pub nonce: Nonce,
    /// Bytes the signature commits to
    pub payload: Vec<u8>,
}

/// A proof ready to be sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProof {
    pub txid: TxId,
    pub nonce: Nonce,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

/// Builds and signs proofs with the wallet's key material.
///
/// Failures are reported as:
/// - [`PopError::ProofConstruction`](crate::PopError::ProofConstruction) from `create_proof`
/// - [`PopError::BadDecryptionKey`](crate::PopError::BadDecryptionKey) from `sign_proof`
///   when the key does not unlock the signing key
/// - [`PopError::ProofSigning`](crate::PopError::ProofSigning) for any other signing failure
pub trait ProofGenerator: Send + Sync {
    fn create_proof(&self, transaction: &Transaction, nonce: &Nonce) -> Result<UnsignedProof>;

    fn sign_proof(&self, proof: UnsignedProof, key: Option<&DecryptionKey>) -> Result<SignedProof>;
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
