//! popwallet-core - Proof-of-Payment workflow
//!
//! Proves ownership of the key behind a past payment and submits the proof
//! to the party that asked for it.
//!
//! ## Flow
//! 1. A [`ProofRequest`] arrives (structured, or as a `btcpop:` URI)
//! 2. [`match_transaction`] picks the wallet transaction it refers to
//! 3. The user confirms; a [`ProofSubmissionTask`] runs on a worker thread:
//!    derive key, build and sign the proof, send it
//! 4. Progress events drive the [`StateController`]
//! 5. [`resolve`] turns the [`Outcome`] into the final state and message
//!
//! Key material, proof construction and transport are injected through the
//! [`WalletKeys`], [`ProofGenerator`] and [`PopSender`] traits.

pub mod destination;
pub mod error;
pub mod matcher;
pub mod outcome;
pub mod proof;
pub mod request;
pub mod sender;
pub mod state;
pub mod task;
pub mod unlock;
pub mod wallet;
pub mod workflow;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod fuzz_tests;

pub use destination::Destination;
pub use error::{ErrorKind, PopError, Result};
pub use matcher::{match_transaction, NoMatch};
pub use outcome::{resolve, Outcome, Resolution, UserMessage};
pub use proof::{ProofGenerator, SignedProof, UnsignedProof};
pub use request::{Nonce, ProofRequest};
pub use sender::{PopSender, SendReceipt, SendResult, NO_MESSAGE};
pub use state::{StateController, WorkflowState};
pub use task::{Capabilities, ProofSubmissionTask, Submission};
pub use unlock::{derive_key, DecryptionKey};
pub use wallet::{KeyCrypter, Transaction, TransactionHistory, TxId, WalletKeys};
pub use workflow::PopWorkflow;
