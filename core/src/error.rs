//! Error taxonomy for the proof-of-payment workflow
//!
//! Every failure the workflow can observe is one variant of [`PopError`].
//! Callers branch on [`PopError::kind`] rather than on payloads.

use thiserror::Error;

use crate::matcher::NoMatch;
use crate::state::WorkflowState;

/// Result type alias for workflow operations
pub type Result<T> = std::result::Result<T, PopError>;

/// Fieldless discriminant of [`PopError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RequestParse,
    NoMatchingTransaction,
    InvalidDestination,
    BadDecryptionKey,
    ProofConstruction,
    ProofSigning,
    RemoteInvalidProof,
    Transport,
    AttemptInFlight,
    WorkflowFinished,
    InvalidTransition,
}

#[derive(Debug, Clone, Error)]
pub enum PopError {
    /// The incoming request could not be parsed
    #[error("Invalid btcpop request: {0}")]
    RequestParse(String),

    /// No wallet transaction satisfies the request criteria
    #[error("No matching transaction found for {0}")]
    NoMatchingTransaction(NoMatch),

    /// Destination is not a usable URL
    #[error("Not a proper destination URL: {0}")]
    InvalidDestination(String),

    /// Wrong passphrase, discovered at derivation or at decryption time
    #[error("Bad decryption key: {0}")]
    BadDecryptionKey(String),

    /// The transaction and nonce cannot form a proof
    #[error("Couldn't create proof: {0}")]
    ProofConstruction(String),

    /// Signing failed for a reason other than a bad key
    #[error("Couldn't sign proof: {0}")]
    ProofSigning(String),

    /// The remote party rejected the proof itself
    #[error("Proof rejected as invalid: {0}")]
    RemoteInvalidProof(String),

    /// Network failure, or any non-OK result other than an invalid proof
    #[error("Sending proof failed: {0}")]
    Transport(String),

    /// A submission attempt is already running
    #[error("A submission is already in progress (state: {0})")]
    AttemptInFlight(WorkflowState),

    /// The proof was already accepted; the workflow instance is done
    #[error("Proof already submitted successfully")]
    WorkflowFinished,

    /// State controller refused a transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: WorkflowState,
        to: WorkflowState,
    },
}

impl PopError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestParse(_) => ErrorKind::RequestParse,
            Self::NoMatchingTransaction(_) => ErrorKind::NoMatchingTransaction,
            Self::InvalidDestination(_) => ErrorKind::InvalidDestination,
            Self::BadDecryptionKey(_) => ErrorKind::BadDecryptionKey,
            Self::ProofConstruction(_) => ErrorKind::ProofConstruction,
            Self::ProofSigning(_) => ErrorKind::ProofSigning,
            Self::RemoteInvalidProof(_) => ErrorKind::RemoteInvalidProof,
            Self::Transport(_) => ErrorKind::Transport,
            Self::AttemptInFlight(_) => ErrorKind::AttemptInFlight,
            Self::WorkflowFinished => ErrorKind::WorkflowFinished,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }

    /// Only a bad decryption key lets the user retry from `Input`
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::BadDecryptionKey(_))
    }

    /// Errors raised before any background work starts
    pub fn aborts_flow(&self) -> bool {
        matches!(
            self,
            Self::RequestParse(_) | Self::NoMatchingTransaction(_) | Self::InvalidDestination(_)
        )
    }
}

impl From<url::ParseError> for PopError {
    fn from(e: url::ParseError) -> Self {
        PopError::InvalidDestination(e.to_string())
    }
}
