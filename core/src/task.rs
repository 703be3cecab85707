//! Proof submission task
//!
//! One attempt = decrypt, sign, send, run on a dedicated worker thread. The
//! control side receives progress events through an ordered channel and the
//! single [`Outcome`] through a one-shot slot once the channel has closed.

use std::sync::Arc;
use std::thread;

use tokio::sync::{mpsc, oneshot};
use zeroize::Zeroizing;

use crate::destination::Destination;
use crate::error::PopError;
use crate::outcome::Outcome;
use crate::proof::{ProofGenerator, SignedProof};
use crate::request::Nonce;
use crate::sender::PopSender;
use crate::state::WorkflowState;
use crate::unlock;
use crate::wallet::{Transaction, WalletKeys};

const WORKER_NAME: &str = "pop-submission";

/// External collaborators injected into the workflow
#[derive(Clone)]
pub struct Capabilities {
    pub wallet: Arc<dyn WalletKeys>,
    pub generator: Arc<dyn ProofGenerator>,
    pub sender: Arc<dyn PopSender>,
}

/// Everything one attempt needs, owned by the task
pub struct ProofSubmissionTask {
    transaction: Transaction,
    nonce: Nonce,
    destination: Destination,
    passphrase: Zeroizing<String>,
    capabilities: Capabilities,
}

impl ProofSubmissionTask {
    pub fn new(
        transaction: Transaction,
        nonce: Nonce,
        destination: Destination,
        passphrase: Option<String>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            transaction,
            nonce,
            destination,
            passphrase: Zeroizing::new(passphrase.unwrap_or_default()),
            capabilities,
        }
    }

    /// Run the attempt on the current thread, reporting progress to `emit`.
    ///
    /// On failure the last event is `Input` for a bad decryption key raised
    /// while decrypting or signing, and `Failed` otherwise.
    pub fn run(self, mut emit: impl FnMut(WorkflowState)) -> Outcome {
        let outcome = self.execute(&mut emit);
        if let Err(ref e) = outcome {
            tracing::debug!(kind = ?e.kind(), "submission attempt failed");
            emit(if e.is_recoverable() {
                WorkflowState::Input
            } else {
                WorkflowState::Failed
            });
        }
        outcome
    }

    fn execute(&self, emit: &mut impl FnMut(WorkflowState)) -> Outcome {
        emit(WorkflowState::Decrypting);
        let key = unlock::derive_key(self.capabilities.wallet.as_ref(), &self.passphrase)?;

        emit(WorkflowState::Signing);
        let signed = self.sign(key)?;

        emit(WorkflowState::Sending);
        tracing::debug!(destination = %self.destination, "sending proof");
        self.capabilities
            .sender
            .send(&signed, &self.destination)
            .map_err(|e| match e {
                // the key was already used; the passphrase cannot be at fault here
                PopError::BadDecryptionKey(_) => PopError::Transport(e.to_string()),
                other => other,
            })
    }

    /// Consumes the key so it is zeroed as soon as signing returns
    fn sign(&self, key: Option<unlock::DecryptionKey>) -> Result<SignedProof, PopError> {
        let generator = &self.capabilities.generator;
        let proof = generator.create_proof(&self.transaction, &self.nonce)?;
        tracing::debug!(txid = %proof.txid, "proof created, signing");
        generator.sign_proof(proof, key.as_ref())
    }

    /// Start the attempt on its own worker thread
    pub fn spawn(self) -> Result<Submission, PopError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                let outcome = self.run(|event| {
                    let _ = events_tx.send(event);
                });
                drop(events_tx);
                let _ = outcome_tx.send(outcome);
            })
            .map_err(|e| PopError::Transport(format!("could not start submission worker: {}", e)))?;

        Ok(Submission {
            events: events_rx,
            outcome: outcome_rx,
        })
    }
}

/// Control-side handle on a running attempt
pub struct Submission {
    events: mpsc::UnboundedReceiver<WorkflowState>,
    outcome: oneshot::Receiver<Outcome>,
}

impl Submission {
    /// Next progress event, `None` once the task has stopped emitting
    pub async fn next_event(&mut self) -> Option<WorkflowState> {
        self.events.recv().await
    }

    /// The terminal outcome; call after the events are drained
    pub async fn outcome(self) -> Outcome {
        self.outcome.await.unwrap_or_else(|_| {
            Err(PopError::Transport(
                "submission worker terminated without a result".into(),
            ))
        })
    }
}
