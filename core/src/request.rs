//! Proof requests and the `btcpop:` URI form they arrive in
//!
//! ```text
//! btcpop:?p=https://shop.example/pop&n=3Pd6pZ&txid=<hex>&amount=10000&label=rent
//! ```
//!
//! `p` (destination) and `n` (base58 nonce) are required. `txid`, `amount`
//! and `label` narrow the transaction search; `message` is informational.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PopError, Result};
use crate::wallet::TxId;

pub const POP_URI_SCHEME: &str = "btcpop";

/// Length of a transaction id in hex characters
const TXID_HEX_LEN: usize = 64;

/// Replay-protection value carried into the proof, base58 on the wire
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Nonce(Vec<u8>);

impl Nonce {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_base58(s: &str) -> Result<Self> {
        bs58::decode(s)
            .into_vec()
            .map(Self)
            .map_err(|e| PopError::RequestParse(format!("nonce is not base58: {}", e)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl From<Nonce> for String {
    fn from(nonce: Nonce) -> Self {
        nonce.to_base58()
    }
}

impl TryFrom<String> for Nonce {
    type Error = PopError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_base58(&s)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.to_base58())
    }
}

/// A request to prove ownership of a past payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Where the signed proof is sent
    pub destination: String,
    pub nonce: Nonce,
    pub txid: Option<TxId>,
    /// Amount in the smallest currency unit
    pub amount: Option<i64>,
    pub label: Option<String>,
    pub message: Option<String>,
}

impl ProofRequest {
    pub fn new(destination: impl Into<String>, nonce: Nonce) -> Self {
        Self {
            destination: destination.into(),
            nonce,
            txid: None,
            amount: None,
            label: None,
            message: None,
        }
    }

    pub fn with_txid(mut self, txid: impl Into<TxId>) -> Self {
        self.txid = Some(txid.into());
        self
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Parse a `btcpop:` URI
    pub fn from_uri(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = Url::parse(input)
            .map_err(|e| PopError::RequestParse(format!("'{}': {}", input, e)))?;

        if url.scheme() != POP_URI_SCHEME {
            return Err(PopError::RequestParse(format!(
                "expected {}: scheme, got {}:",
                POP_URI_SCHEME,
                url.scheme()
            )));
        }
        if !url.path().is_empty() {
            return Err(PopError::RequestParse(format!(
                "unexpected path '{}' before query",
                url.path()
            )));
        }

        let mut destination = None;
        let mut nonce = None;
        let mut txid = None;
        let mut amount = None;
        let mut label = None;
        let mut message = None;

        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "p" => set_once(&mut destination, "p", non_empty("p", value)?)?,
                "n" => set_once(&mut nonce, "n", Nonce::from_base58(&non_empty("n", value)?)?)?,
                "txid" => set_once(&mut txid, "txid", parse_txid(&value)?)?,
                "amount" => set_once(&mut amount, "amount", parse_amount(&value)?)?,
                "label" => set_once(&mut label, "label", value)?,
                "message" => set_once(&mut message, "message", value)?,
                other if other.starts_with("req-") => {
                    return Err(PopError::RequestParse(format!(
                        "unsupported required parameter '{}'",
                        other
                    )));
                }
                other => tracing::debug!(parameter = other, "ignoring unknown btcpop parameter"),
            }
        }

        let destination =
            destination.ok_or_else(|| PopError::RequestParse("missing parameter 'p'".into()))?;
        let nonce = nonce.ok_or_else(|| PopError::RequestParse("missing parameter 'n'".into()))?;

        Ok(Self {
            destination,
            nonce,
            txid,
            amount,
            label,
            message,
        })
    }

    /// Render back into `btcpop:` form
    pub fn to_uri(&self) -> String {
        let mut params = vec![
            format!("p={}", encode(&self.destination)),
            format!("n={}", self.nonce.to_base58()),
        ];
        if let Some(ref txid) = self.txid {
            params.push(format!("txid={}", txid));
        }
        if let Some(amount) = self.amount {
            params.push(format!("amount={}", amount));
        }
        if let Some(ref label) = self.label {
            params.push(format!("label={}", encode(label)));
        }
        if let Some(ref message) = self.message {
            params.push(format!("message={}", encode(message)));
        }
        format!("{}:?{}", POP_URI_SCHEME, params.join("&"))
    }
}

impl FromStr for ProofRequest {
    type Err = PopError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_uri(s)
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn set_once<T>(slot: &mut Option<T>, name: &str, value: T) -> Result<()> {
    if slot.is_some() {
        return Err(PopError::RequestParse(format!("duplicate parameter '{}'", name)));
    }
    *slot = Some(value);
    Ok(())
}

fn non_empty(name: &str, value: String) -> Result<String> {
    if value.is_empty() {
        return Err(PopError::RequestParse(format!("empty parameter '{}'", name)));
    }
    Ok(value)
}

fn parse_txid(value: &str) -> Result<TxId> {
    if value.len() != TXID_HEX_LEN || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PopError::RequestParse(format!(
            "txid must be {} hex characters: '{}'",
            TXID_HEX_LEN, value
        )));
    }
    Ok(TxId::new(value))
}

fn parse_amount(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| PopError::RequestParse(format!("amount is not an integer: '{}'", value)))
}
