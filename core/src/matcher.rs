//! Transaction matcher
//!
//! Picks the first transaction, in the order the history gives them (newest
//! first), that satisfies every criterion present in the request. Absent criteria are wildcards. The free-text
//! message is informational and never filters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::ProofRequest;
use crate::wallet::{Transaction, TxId};

/// The criteria that were specified when nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoMatch {
    pub txid: Option<TxId>,
    pub label: Option<String>,
    pub message: Option<String>,
    pub amount: Option<i64>,
}

impl NoMatch {
    fn from_request(request: &ProofRequest) -> Self {
        Self {
            txid: request.txid.clone(),
            label: request.label.clone(),
            message: request.message.clone(),
            amount: request.amount,
        }
    }

    /// `key=value` pairs for every specified criterion
    pub fn criteria(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(ref txid) = self.txid {
            out.push(format!("txid={}", txid));
        }
        if let Some(ref label) = self.label {
            out.push(format!("label={}", label));
        }
        if let Some(ref message) = self.message {
            out.push(format!("message={}", message));
        }
        if let Some(amount) = self.amount {
            out.push(format!("amount={}", amount));
        }
        out
    }
}

impl fmt::Display for NoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let criteria = self.criteria();
        if criteria.is_empty() {
            f.write_str("any transaction")
        } else {
            f.write_str(&criteria.join(", "))
        }
    }
}

fn satisfies(request: &ProofRequest, tx: &Transaction) -> bool {
    if let Some(ref txid) = request.txid {
        if *txid != tx.id {
            return false;
        }
    }
    if let Some(amount) = request.amount {
        if amount != tx.value {
            return false;
        }
    }
    if let Some(ref label) = request.label {
        if tx.memo.as_deref() != Some(label.as_str()) {
            return false;
        }
    }
    true
}

/// Select the transaction a proof request refers to.
///
/// `transactions` is scanned exactly as given, normally
/// [`TransactionHistory::transactions_by_time`](crate::TransactionHistory::transactions_by_time)
/// order, so the most recent qualifying payment wins.
pub fn match_transaction(
    request: &ProofRequest,
    transactions: &[Transaction],
) -> Result<Transaction, NoMatch> {
    transactions
        .iter()
        .find(|tx| satisfies(request, tx))
        .cloned()
        .ok_or_else(|| NoMatch::from_request(request))
}
