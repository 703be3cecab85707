//! Property-based tests for matching and request parsing
//!
//! Properties tested:
//! - Matching is deterministic for unchanged wallet and request
//! - A selected transaction satisfies every present criterion
//! - `NoMatch` only when no transaction satisfies the criteria
//! - The URI parser never panics on arbitrary input

#[cfg(test)]
mod property_tests {
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    use crate::matcher::match_transaction;
    use crate::request::{Nonce, ProofRequest};
    use crate::wallet::Transaction;

    const LABELS: &[&str] = &["coffee", "rent", "salary", "gift"];

    fn arbitrary_transaction() -> impl Strategy<Value = Transaction> {
        (0u8..8, prop::sample::select(vec![5000i64, 10000, -2500, 42]), prop::option::of(0usize..LABELS.len()), 0i64..10_000)
            .prop_map(|(id, value, label, secs)| {
                Transaction::new(
                    format!("tx{}", id).as_str(),
                    value,
                    label.map(|i| LABELS[i]),
                    Utc.timestamp_opt(secs, 0).unwrap(),
                )
            })
    }

    fn arbitrary_request() -> impl Strategy<Value = ProofRequest> {
        (
            prop::option::of(0u8..8),
            prop::option::of(prop::sample::select(vec![5000i64, 10000, -2500, 42, 7])),
            prop::option::of(0usize..LABELS.len()),
        )
            .prop_map(|(id, amount, label)| {
                let mut request = ProofRequest::new("https://shop.example/pop", Nonce::new(vec![1]));
                request.txid = id.map(|i| format!("tx{}", i).as_str().into());
                request.amount = amount;
                request.label = label.map(|i| LABELS[i].to_string());
                request
            })
    }

    fn satisfies(request: &ProofRequest, tx: &Transaction) -> bool {
        request.txid.as_ref().map_or(true, |id| *id == tx.id)
            && request.amount.map_or(true, |a| a == tx.value)
            && request
                .label
                .as_ref()
                .map_or(true, |l| tx.memo.as_deref() == Some(l.as_str()))
    }

    proptest! {
        #[test]
        fn prop_match_is_deterministic(
            txs in prop::collection::vec(arbitrary_transaction(), 0..12),
            request in arbitrary_request(),
        ) {
            let first = match_transaction(&request, &txs);
            let second = match_transaction(&request, &txs);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_selection_satisfies_criteria(
            txs in prop::collection::vec(arbitrary_transaction(), 0..12),
            request in arbitrary_request(),
        ) {
            match match_transaction(&request, &txs) {
                Ok(selected) => {
                    prop_assert!(satisfies(&request, &selected));
                    // nothing earlier in the given order also qualifies
                    let position = txs.iter().position(|tx| *tx == selected).unwrap();
                    for tx in &txs[..position] {
                        prop_assert!(!satisfies(&request, tx));
                    }
                }
                Err(no_match) => {
                    prop_assert!(txs.iter().all(|tx| !satisfies(&request, tx)));
                    prop_assert_eq!(no_match.txid, request.txid.clone());
                    prop_assert_eq!(no_match.amount, request.amount);
                    prop_assert_eq!(no_match.label, request.label.clone());
                }
            }
        }

        #[test]
        fn prop_uri_parser_never_panics(input in ".{0,200}") {
            let _ = ProofRequest::from_uri(&input);
            let _ = ProofRequest::from_uri(&format!("btcpop:?{}", input));
        }
    }
}
