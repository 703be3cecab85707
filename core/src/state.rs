//! Workflow state machine
//!
//! ```text
//! Input -> Decrypting -> Signing -> Sending -> Sent -> Success
//!                                                  \-> Failed
//! Decrypting | Signing | Sending | Sent -> Failed
//! Decrypting | Signing -> Input          (bad decryption key)
//! Failed -> Input                        (new attempt)
//! ```
//!
//! The controller also carries the presentation flags derived from the
//! state: button label, passphrase field enablement, the bad-password
//! indicator and the message area.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PopError, Result};
use crate::outcome::{Resolution, UserMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    /// Waiting for the user to confirm (and enter a passphrase)
    Input,
    Decrypting,
    Signing,
    Sending,
    Sent,
    Success,
    Failed,
}

impl WorkflowState {
    /// Text for the action button in this state
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Send proof",
            Self::Decrypting => "Decrypting key…",
            Self::Signing => "Preparing proof…",
            Self::Sending => "Sending…",
            Self::Sent => "Sent",
            Self::Success => "Proven",
            Self::Failed => "Failed",
        }
    }

    /// Terminal for one attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn can_transition_to(&self, to: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, to),
            (Input, Decrypting)
                | (Decrypting, Signing)
                | (Signing, Sending)
                | (Sending, Sent)
                | (Sent, Success)
                | (Decrypting | Signing | Sending | Sent, Failed)
                | (Decrypting | Signing, Input)
                | (Failed, Input)
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Owns the current [`WorkflowState`] on the control side
#[derive(Debug, Clone)]
pub struct StateController {
    state: WorkflowState,
    wallet_encrypted: bool,
    bad_password: bool,
    focus_passphrase: bool,
    message: Option<UserMessage>,
    history: Vec<WorkflowState>,
}

impl StateController {
    pub fn new(wallet_encrypted: bool) -> Self {
        Self {
            state: WorkflowState::Input,
            wallet_encrypted,
            bad_password: false,
            focus_passphrase: false,
            message: None,
            history: vec![WorkflowState::Input],
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn label(&self) -> &'static str {
        self.state.label()
    }

    /// Every state entered, in order, starting with `Input`
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    /// The passphrase field is only shown for encrypted wallets
    pub fn passphrase_visible(&self) -> bool {
        self.wallet_encrypted
    }

    /// The passphrase can only be edited while waiting for input
    pub fn passphrase_enabled(&self) -> bool {
        self.state == WorkflowState::Input
    }

    pub fn passphrase_focus_requested(&self) -> bool {
        self.focus_passphrase
    }

    pub fn bad_password_visible(&self) -> bool {
        self.bad_password
    }

    /// Contents of the message area, if shown
    pub fn message(&self) -> Option<&UserMessage> {
        self.message.as_ref()
    }

    /// The user confirmed: start a new attempt.
    ///
    /// Only allowed from `Input`; at most one attempt is in flight.
    pub fn confirm(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::Input => {}
            WorkflowState::Success => return Err(PopError::WorkflowFinished),
            other => {
                tracing::warn!(state = %other, "refusing to launch while not in Input");
                return Err(PopError::AttemptInFlight(other));
            }
        }
        self.bad_password = false;
        self.focus_passphrase = false;
        self.message = None;
        self.transition(WorkflowState::Decrypting)
    }

    /// Return to `Input` after a failed attempt
    pub fn reset(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::Input => Ok(()),
            WorkflowState::Failed => {
                self.message = None;
                self.transition(WorkflowState::Input)
            }
            WorkflowState::Success => Err(PopError::WorkflowFinished),
            other => Err(PopError::AttemptInFlight(other)),
        }
    }

    /// Apply a progress event from the submission task
    pub fn on_progress(&mut self, event: WorkflowState) -> Result<()> {
        self.transition(event)
    }

    /// Apply the resolved outcome of an attempt
    pub fn apply(&mut self, resolution: &Resolution) -> Result<()> {
        if resolution.via_sent {
            self.transition(WorkflowState::Sent)?;
        }
        self.transition(resolution.state)?;

        match resolution.message {
            UserMessage::BadPassword => {
                self.bad_password = true;
                self.focus_passphrase = true;
                self.message = None;
            }
            ref message => {
                self.bad_password = false;
                self.message = Some(message.clone());
            }
        }
        Ok(())
    }

    /// Force `Failed`, bypassing the transition table.
    ///
    /// Used when the worker's events or outcome cannot be applied, so the
    /// controller never stays mid-flight.
    pub fn abort(&mut self, message: UserMessage) {
        tracing::warn!(from = %self.state, "attempt aborted");
        if self.state != WorkflowState::Failed {
            self.state = WorkflowState::Failed;
            self.history.push(WorkflowState::Failed);
        }
        self.bad_password = false;
        self.focus_passphrase = false;
        self.message = Some(message);
    }

    /// Moving to the current state is a no-op
    fn transition(&mut self, to: WorkflowState) -> Result<()> {
        if to == self.state {
            return Ok(());
        }
        if !self.state.can_transition_to(to) {
            return Err(PopError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(from = %self.state, to = %to, "workflow state change");
        self.state = to;
        self.history.push(to);
        Ok(())
    }
}
