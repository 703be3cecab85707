//! Sender capability: delivers a signed proof to its destination

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::destination::Destination;
use crate::error::{PopError, Result};
use crate::proof::SignedProof;

/// The remote party's verdict on a submitted proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendResult {
    Ok,
    /// The proof itself was rejected
    InvalidPop,
    /// Any other protocol-level failure
    Failed { status: u16 },
}

impl fmt::Display for SendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendResult::Ok => f.write_str("OK"),
            SendResult::InvalidPop => f.write_str("INVALID_POP"),
            SendResult::Failed { status } => write!(f, "FAILED({})", status),
        }
    }
}

/// What the sender got back from the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub result: SendResult,
    /// Server-supplied error text, if any
    pub error_message: Option<String>,
}

impl SendReceipt {
    pub fn ok() -> Self {
        Self {
            result: SendResult::Ok,
            error_message: None,
        }
    }

    pub fn rejected(result: SendResult, error_message: Option<String>) -> Self {
        Self {
            result,
            error_message,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == SendResult::Ok
    }

    /// The failure this receipt stands for, `None` when accepted
    pub fn failure(&self) -> Option<PopError> {
        let text = self
            .error_message
            .clone()
            .unwrap_or_else(|| NO_MESSAGE.to_string());
        match self.result {
            SendResult::Ok => None,
            SendResult::InvalidPop => Some(PopError::RemoteInvalidProof(text)),
            SendResult::Failed { .. } => Some(PopError::Transport(text)),
        }
    }
}

/// Placeholder when the server gave no reason
pub const NO_MESSAGE: &str = "No message";

/// Transmits signed proofs.
///
/// Runs on the submission worker and may block. Network failures are
/// returned as [`PopError::Transport`]; a rejection by the remote party is a
/// successful send whose receipt carries a non-OK result.
pub trait PopSender: Send + Sync {
    fn send(&self, proof: &SignedProof, destination: &Destination) -> Result<SendReceipt>;
}
