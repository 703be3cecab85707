//! HTTP delivery of signed proofs to the requesting party

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use popwallet_core::{Destination, PopError, PopSender, SendReceipt, SendResult, SignedProof};

/// Cap on how much of a rejection body is surfaced to the user
const MAX_ERROR_BODY: usize = 512;

/// Posts proofs as JSON with a blocking client.
///
/// The client is built inside `send`, on the submission worker, never on an
/// async runtime thread.
pub struct HttpPopSender {
    timeout: Duration,
}

impl HttpPopSender {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self) -> popwallet_core::Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("popwallet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PopError::Transport(e.to_string()))
    }
}

/// Map a response status and body onto the remote verdict
pub fn classify_response(status: StatusCode, body: &str) -> SendReceipt {
    if status.is_success() {
        return SendReceipt::ok();
    }

    let text = body.trim();
    let message = if text.is_empty() {
        None
    } else {
        Some(text.chars().take(MAX_ERROR_BODY).collect())
    };

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            SendReceipt::rejected(SendResult::InvalidPop, message)
        }
        other => SendReceipt::rejected(
            SendResult::Failed {
                status: other.as_u16(),
            },
            message,
        ),
    }
}

impl PopSender for HttpPopSender {
    fn send(
        &self,
        proof: &SignedProof,
        destination: &Destination,
    ) -> popwallet_core::Result<SendReceipt> {
        tracing::debug!(host = destination.host(), txid = %proof.txid, "posting proof");

        let response = self
            .client()?
            .post(destination.url().clone())
            .json(proof)
            .send()
            .map_err(|e| PopError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            tracing::warn!(status = status.as_u16(), error = %e, "could not read response body");
            PopError::Transport(format!("failed to read response ({}): {}", status, e))
        })?;
        let receipt = classify_response(status, &body);

        tracing::info!(status = status.as_u16(), result = %receipt.result, "proof delivered");
        Ok(receipt)
    }
}
