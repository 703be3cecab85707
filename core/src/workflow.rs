//! Control side of the proof-of-payment workflow
//!
//! Request intake, matching and destination checks happen in
//! [`PopWorkflow::new`]; failures there abort the flow before any background
//! work. Each attempt then runs on its own worker while this side applies
//! progress events in order and resolves the outcome exactly once.

use crate::destination::Destination;
use crate::error::{PopError, Result};
use crate::matcher::match_transaction;
use crate::outcome::{resolve, Resolution, UserMessage};
use crate::request::ProofRequest;
use crate::state::{StateController, WorkflowState};
use crate::task::{Capabilities, ProofSubmissionTask, Submission};
use crate::wallet::{Transaction, TransactionHistory};

pub struct PopWorkflow {
    request: ProofRequest,
    transaction: Transaction,
    destination: Destination,
    capabilities: Capabilities,
    controller: StateController,
}

impl PopWorkflow {
    /// Match `request` against the wallet history and validate its destination
    pub fn new(
        request: ProofRequest,
        history: &dyn TransactionHistory,
        capabilities: Capabilities,
    ) -> Result<Self> {
        let transactions = history.transactions_by_time();
        let transaction =
            match_transaction(&request, &transactions).map_err(PopError::NoMatchingTransaction)?;
        let destination = Destination::parse(&request.destination)?;

        if !destination.is_secure() {
            tracing::warn!(host = destination.host(), "proof destination does not use TLS");
        }
        tracing::info!(txid = %transaction.id, host = destination.host(), "matched transaction for proof request");

        let controller = StateController::new(capabilities.wallet.is_encrypted());
        Ok(Self {
            request,
            transaction,
            destination,
            capabilities,
            controller,
        })
    }

    /// Parse a `btcpop:` URI, then as [`PopWorkflow::new`]
    pub fn from_uri(
        uri: &str,
        history: &dyn TransactionHistory,
        capabilities: Capabilities,
    ) -> Result<Self> {
        let request = ProofRequest::from_uri(uri)?;
        Self::new(request, history, capabilities)
    }

    pub fn request(&self) -> &ProofRequest {
        &self.request
    }

    /// The transaction the proof will be about
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn controller(&self) -> &StateController {
        &self.controller
    }

    pub fn state(&self) -> WorkflowState {
        self.controller.state()
    }

    /// Start an attempt. Allowed from `Input`, or from `Failed` which first
    /// returns to `Input`.
    pub fn launch(&mut self, passphrase: Option<String>) -> Result<Submission> {
        self.controller.reset()?;
        self.controller.confirm()?;

        let task = ProofSubmissionTask::new(
            self.transaction.clone(),
            self.request.nonce.clone(),
            self.destination.clone(),
            passphrase,
            self.capabilities.clone(),
        );

        task.spawn().map_err(|e| {
            let resolution = resolve(&Err(e.clone()));
            if let Err(apply_err) = self.controller.apply(&resolution) {
                tracing::error!(error = %apply_err, "could not record failed launch");
            }
            e
        })
    }

    /// Apply a running attempt's events in order, then its outcome.
    ///
    /// Events are always drained and the outcome always resolved. A transition
    /// the controller refuses ends the attempt in `Failed`.
    /// `observer` sees the controller after every change.
    pub async fn drive(
        &mut self,
        mut submission: Submission,
        mut observer: impl FnMut(&StateController),
    ) -> Resolution {
        let mut refused = None;
        while let Some(event) = submission.next_event().await {
            if refused.is_some() {
                continue;
            }
            match self.controller.on_progress(event) {
                Ok(()) => observer(&self.controller),
                Err(e) => {
                    tracing::error!(error = %e, "submission worker reported an illegal transition");
                    refused = Some(e);
                }
            }
        }

        let outcome = submission.outcome().await;
        let mut resolution = resolve(&outcome);

        if let Some(e) = refused {
            resolution = self.abort(&e);
        } else if let Err(e) = self.controller.apply(&resolution) {
            tracing::error!(error = %e, "could not apply submission outcome");
            resolution = self.abort(&e);
        }
        observer(&self.controller);

        resolution
    }

    fn abort(&mut self, error: &PopError) -> Resolution {
        let message = UserMessage::Failure(error.to_string());
        self.controller.abort(message.clone());
        Resolution {
            state: WorkflowState::Failed,
            message,
            via_sent: false,
        }
    }

    /// [`launch`](Self::launch) followed by [`drive`](Self::drive)
    pub async fn submit(
        &mut self,
        passphrase: Option<String>,
        observer: impl FnMut(&StateController),
    ) -> Result<Resolution> {
        let submission = self.launch(passphrase)?;
        Ok(self.drive(submission, observer).await)
    }
}
