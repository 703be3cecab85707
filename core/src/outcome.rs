//! Outcome resolver
//!
//! Classifies what a submission attempt produced into the next workflow state
//! and the message shown to the user.

use std::fmt;

use crate::error::PopError;
use crate::sender::SendReceipt;
use crate::state::WorkflowState;

/// Terminal result of one submission attempt
pub type Outcome = std::result::Result<SendReceipt, PopError>;

/// What the user sees once an attempt has finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMessage {
    /// Shown as the passphrase field's indicator, not in the message area
    BadPassword,
    /// Failure text taken from the error
    Failure(String),
    /// The remote party accepted the proof
    Proven,
    /// The remote party rejected the proof as invalid
    InvalidProof(String),
    /// Sending failed with any other result code
    SendFailed(String),
}

impl UserMessage {
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Proven)
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPassword => f.write_str("Bad password, please try again"),
            Self::Failure(text) => f.write_str(text),
            Self::Proven => f.write_str("Proof of payment sent and accepted"),
            Self::InvalidProof(text) => write!(f, "The receiver rejected the proof as invalid: {}", text),
            Self::SendFailed(text) => write!(f, "Sending the proof failed: {}", text),
        }
    }
}

/// Next state plus message for a finished attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: WorkflowState,
    pub message: UserMessage,
    /// The proof reached the destination, so the workflow passes through `Sent`
    pub via_sent: bool,
}

impl Resolution {
    /// Only an accepted proof ends the workflow instance
    pub fn finishes_workflow(&self) -> bool {
        self.state == WorkflowState::Success
    }

    pub fn is_recoverable(&self) -> bool {
        self.state == WorkflowState::Input
    }
}

/// Resolve a completed [`Outcome`]
pub fn resolve(outcome: &Outcome) -> Resolution {
    match outcome {
        Err(e) if e.is_recoverable() => {
            tracing::warn!("bad decryption key, returning to input");
            Resolution {
                state: WorkflowState::Input,
                message: UserMessage::BadPassword,
                via_sent: false,
            }
        }
        Err(e) => {
            tracing::info!(kind = ?e.kind(), error = %e, "proof submission failed");
            Resolution {
                state: WorkflowState::Failed,
                message: UserMessage::Failure(e.to_string()),
                via_sent: false,
            }
        }
        Ok(receipt) => match receipt.failure() {
            None => {
                tracing::info!("proof accepted by destination");
                Resolution {
                    state: WorkflowState::Success,
                    message: UserMessage::Proven,
                    via_sent: true,
                }
            }
            Some(failure) => {
                tracing::info!(result = %receipt.result, "proof rejected by destination");
                let message = match failure {
                    PopError::RemoteInvalidProof(text) => UserMessage::InvalidProof(text),
                    other => UserMessage::SendFailed(failure_text(other)),
                };
                Resolution {
                    state: WorkflowState::Failed,
                    message,
                    via_sent: true,
                }
            }
        },
    }
}

fn failure_text(error: PopError) -> String {
    match error {
        PopError::Transport(text) => text,
        other => other.to_string(),
    }
}
