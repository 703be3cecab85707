//! End-to-end tests for the proof-of-payment workflow
//!
//! Tests cover:
//! - Matching and abort paths before any background work
//! - Progress ordering on the worker
//! - Bad-passphrase recovery and retry
//! - Remote rejection and transport failures

#[cfg(test)]
mod workflow_tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};

    use crate::*;

    const PASSPHRASE: &str = "CorrectHorse1";

    // ==================== Fixtures ====================

    struct TestCrypter;

    impl KeyCrypter for TestCrypter {
        fn derive_key(&self, passphrase: &str) -> Result<DecryptionKey> {
            let mut bytes = [0u8; 32];
            for (i, b) in passphrase.bytes().enumerate() {
                bytes[i % 32] = bytes[i % 32].wrapping_mul(31).wrapping_add(b);
            }
            Ok(DecryptionKey::from_bytes(bytes))
        }
    }

    struct TestWallet {
        crypter: Option<TestCrypter>,
    }

    impl WalletKeys for TestWallet {
        fn key_crypter(&self) -> Option<&dyn KeyCrypter> {
            self.crypter.as_ref().map(|c| c as &dyn KeyCrypter)
        }
    }

    /// Accepts only the key derived from `PASSPHRASE` when encrypted
    struct TestGenerator {
        expected: Option<DecryptionKey>,
        sign_calls: AtomicUsize,
    }

    impl TestGenerator {
        fn new(encrypted: bool) -> Self {
            let expected = encrypted.then(|| TestCrypter.derive_key(PASSPHRASE).unwrap());
            Self {
                expected,
                sign_calls: AtomicUsize::new(0),
            }
        }
    }

    impl ProofGenerator for TestGenerator {
        fn create_proof(&self, transaction: &Transaction, nonce: &Nonce) -> Result<UnsignedProof> {
            if nonce.is_empty() {
                return Err(PopError::ProofConstruction("empty nonce".into()));
            }
            let mut payload = transaction.id.as_str().as_bytes().to_vec();
            payload.extend_from_slice(nonce.as_bytes());
            Ok(UnsignedProof {
                txid: transaction.id.clone(),
                nonce: nonce.clone(),
                payload,
            })
        }

        fn sign_proof(&self, proof: UnsignedProof, key: Option<&DecryptionKey>) -> Result<SignedProof> {
            self.sign_calls.fetch_add(1, Ordering::SeqCst);
            match (&self.expected, key) {
                (Some(expected), Some(key)) if expected.as_bytes() != key.as_bytes() => {
                    return Err(PopError::BadDecryptionKey("could not decrypt signing key".into()));
                }
                (Some(_), None) => {
                    return Err(PopError::ProofSigning("signing key is encrypted".into()));
                }
                _ => {}
            }
            Ok(SignedProof {
                txid: proof.txid,
                nonce: proof.nonce,
                payload: proof.payload,
                public_key: vec![0xAA; 32],
                signature: vec![0xBB; 64],
            })
        }
    }

    /// Replays queued responses, then accepts everything
    #[derive(Default)]
    struct ScriptedSender {
        responses: Mutex<VecDeque<Result<SendReceipt>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSender {
        fn with(responses: Vec<Result<SendReceipt>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PopSender for ScriptedSender {
        fn send(&self, _proof: &SignedProof, _destination: &Destination) -> Result<SendReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SendReceipt::ok()))
        }
    }

    struct Harness {
        history: Vec<Transaction>,
        generator: Arc<TestGenerator>,
        sender: Arc<ScriptedSender>,
        capabilities: Capabilities,
    }

    fn harness(encrypted: bool, sender: ScriptedSender) -> Harness {
        let history = vec![
            Transaction::new("tx1", 5000, Some("coffee"), Utc.timestamp_opt(1_000, 0).unwrap()),
            Transaction::new("tx2", 10000, Some("rent"), Utc.timestamp_opt(2_000, 0).unwrap()),
        ];
        let generator = Arc::new(TestGenerator::new(encrypted));
        let sender = Arc::new(sender);
        let wallet = Arc::new(TestWallet {
            crypter: encrypted.then_some(TestCrypter),
        });
        let capabilities = Capabilities {
            wallet,
            generator: generator.clone(),
            sender: sender.clone(),
        };
        Harness {
            history,
            generator,
            sender,
            capabilities,
        }
    }

    fn rent_request() -> ProofRequest {
        ProofRequest::new("https://shop.example/pop", Nonce::new(vec![1, 2, 3, 4])).with_amount(10000)
    }

    fn workflow(h: &Harness, request: ProofRequest) -> PopWorkflow {
        PopWorkflow::new(request, &h.history, h.capabilities.clone()).expect("request should match")
    }

    // ==================== Scenarios ====================

    #[tokio::test]
    async fn test_encrypted_wallet_correct_passphrase_succeeds() {
        let h = harness(true, ScriptedSender::default());
        let mut wf = workflow(&h, rent_request());
        assert_eq!(wf.transaction().id.as_str(), "tx2");
        assert!(wf.controller().passphrase_visible());

        let mut labels = Vec::new();
        let resolution = wf
            .submit(Some(PASSPHRASE.to_string()), |ctl| labels.push(ctl.label()))
            .await
            .unwrap();

        assert_eq!(resolution.state, WorkflowState::Success);
        assert!(resolution.finishes_workflow());
        assert_eq!(
            wf.controller().history(),
            &[
                WorkflowState::Input,
                WorkflowState::Decrypting,
                WorkflowState::Signing,
                WorkflowState::Sending,
                WorkflowState::Sent,
                WorkflowState::Success,
            ]
        );
        assert_eq!(labels.last(), Some(&"Proven"));
        assert_eq!(wf.controller().message(), Some(&UserMessage::Proven));
        assert_eq!(h.sender.calls(), 1);
    }

    #[tokio::test]
    async fn test_wrong_passphrase_returns_to_input_then_retry() {
        let h = harness(true, ScriptedSender::default());
        let mut wf = workflow(&h, rent_request());

        let resolution = wf
            .submit(Some("wrong".to_string()), |_| {})
            .await
            .unwrap();

        assert_eq!(resolution.state, WorkflowState::Input);
        assert_eq!(wf.state(), WorkflowState::Input);
        assert!(wf.controller().bad_password_visible());
        assert!(wf.controller().passphrase_enabled());
        assert!(wf.controller().passphrase_focus_requested());
        assert!(wf.controller().message().is_none());
        assert!(!wf.controller().history().contains(&WorkflowState::Failed));
        assert_eq!(h.sender.calls(), 0);

        let retry = wf
            .submit(Some(format!("  {}  ", PASSPHRASE)), |_| {})
            .await
            .unwrap();
        assert_eq!(retry.state, WorkflowState::Success);
        assert!(!wf.controller().bad_password_visible());
        assert_eq!(h.sender.calls(), 1);
    }

    #[tokio::test]
    async fn test_unencrypted_wallet_ignores_passphrase() {
        let h = harness(false, ScriptedSender::default());
        let mut wf = workflow(&h, rent_request());
        assert!(!wf.controller().passphrase_visible());

        let resolution = wf.submit(Some("whatever".into()), |_| {}).await.unwrap();
        assert_eq!(resolution.state, WorkflowState::Success);
        assert!(!wf.controller().bad_password_visible());
    }

    #[tokio::test]
    async fn test_invalid_pop_reports_server_message() {
        let sender = ScriptedSender::with(vec![Ok(SendReceipt::rejected(
            SendResult::InvalidPop,
            Some("replay detected".into()),
        ))]);
        let h = harness(false, sender);
        let mut wf = workflow(&h, rent_request());

        let resolution = wf.submit(None, |_| {}).await.unwrap();

        assert_eq!(resolution.state, WorkflowState::Failed);
        assert_eq!(
            wf.controller().history(),
            &[
                WorkflowState::Input,
                WorkflowState::Decrypting,
                WorkflowState::Signing,
                WorkflowState::Sending,
                WorkflowState::Sent,
                WorkflowState::Failed,
            ]
        );
        let message = wf.controller().message().unwrap().to_string();
        assert!(message.contains("replay detected"), "got: {}", message);
        assert!(message.contains("invalid"));
    }

    #[tokio::test]
    async fn test_transport_failure_then_new_attempt() {
        let sender = ScriptedSender::with(vec![Err(PopError::Transport("connection refused".into()))]);
        let h = harness(false, sender);
        let mut wf = workflow(&h, rent_request());

        let first = wf.submit(None, |_| {}).await.unwrap();
        assert_eq!(first.state, WorkflowState::Failed);
        assert!(!first.via_sent);
        assert_eq!(
            wf.controller().message(),
            Some(&UserMessage::Failure("Sending proof failed: connection refused".into()))
        );

        let second = wf.submit(None, |_| {}).await.unwrap();
        assert_eq!(second.state, WorkflowState::Success);
        assert_eq!(h.sender.calls(), 2);
    }

    #[tokio::test]
    async fn test_construction_failure_skips_signing_and_sending() {
        let h = harness(false, ScriptedSender::default());
        let request = ProofRequest::new("https://shop.example/pop", Nonce::new(Vec::new()));
        let mut wf = workflow(&h, request);

        let resolution = wf.submit(None, |_| {}).await.unwrap();
        assert_eq!(resolution.state, WorkflowState::Failed);
        assert!(matches!(wf.controller().message(), Some(UserMessage::Failure(m)) if m.contains("empty nonce")));
        assert_eq!(h.generator.sign_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.sender.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_launch_rejected_while_in_flight() {
        let h = harness(false, ScriptedSender::default());
        let mut wf = workflow(&h, rent_request());

        let submission = wf.launch(None).unwrap();
        let err = wf.launch(None).err().expect("second launch must fail");
        assert_eq!(err.kind(), ErrorKind::AttemptInFlight);

        let resolution = wf.drive(submission, |_| {}).await;
        assert_eq!(resolution.state, WorkflowState::Success);

        let err = wf.launch(None).err().expect("finished workflow cannot relaunch");
        assert_eq!(err.kind(), ErrorKind::WorkflowFinished);
        assert_eq!(h.sender.calls(), 1);
    }

    #[tokio::test]
    async fn test_sender_key_error_is_terminal_and_retryable() {
        let sender = ScriptedSender::with(vec![Err(PopError::BadDecryptionKey("stale key".into()))]);
        let h = harness(false, sender);
        let mut wf = workflow(&h, rent_request());

        let first = wf.submit(None, |_| {}).await.unwrap();
        assert_eq!(first.state, WorkflowState::Failed);
        assert_eq!(wf.state(), WorkflowState::Failed);
        assert!(!wf.controller().bad_password_visible());
        assert_eq!(
            wf.controller().history().last(),
            Some(&WorkflowState::Failed)
        );

        let second = wf.submit(None, |_| {}).await.unwrap();
        assert_eq!(second.state, WorkflowState::Success);
        assert_eq!(h.sender.calls(), 2);
    }

    // ==================== Abort paths ====================

    #[test]
    fn test_unknown_txid_aborts_with_criteria() {
        let h = harness(false, ScriptedSender::default());
        let request = ProofRequest::new("https://shop.example/pop", Nonce::new(vec![1])).with_txid("abc");

        let err = PopWorkflow::new(request, &h.history, h.capabilities.clone())
            .err()
            .expect("no transaction has txid abc");
        match err {
            PopError::NoMatchingTransaction(ref no_match) => {
                assert_eq!(no_match.criteria(), vec!["txid=abc".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.aborts_flow());
        assert!(err.to_string().contains("txid=abc"));
    }

    #[test]
    fn test_invalid_destination_aborts() {
        let h = harness(false, ScriptedSender::default());
        let request = ProofRequest::new("not a url", Nonce::new(vec![1]));
        let err = PopWorkflow::new(request, &h.history, h.capabilities.clone())
            .err()
            .expect("destination is invalid");
        assert_eq!(err.kind(), ErrorKind::InvalidDestination);
        assert_eq!(h.sender.calls(), 0);
    }

    #[test]
    fn test_malformed_uri_aborts_before_matching() {
        let h = harness(false, ScriptedSender::default());
        let err = PopWorkflow::from_uri("btcpop:?p=https://shop.example/", &h.history, h.capabilities.clone())
            .err()
            .expect("nonce is missing");
        assert_eq!(err.kind(), ErrorKind::RequestParse);
    }

    #[test]
    fn test_uri_with_label_matches() {
        let h = harness(false, ScriptedSender::default());
        let wf = PopWorkflow::from_uri(
            "btcpop:?p=http%3A%2F%2Fshop.example%2Fpop&n=2NEpo7TZRRrLZSi2U&label=coffee",
            &h.history,
            h.capabilities.clone(),
        )
        .unwrap();
        assert_eq!(wf.transaction().id.as_str(), "tx1");
        assert!(!wf.destination().is_secure());
    }

    // ==================== Task ordering ====================

    fn run_sync(h: &Harness, passphrase: Option<&str>, nonce: Vec<u8>) -> (Vec<WorkflowState>, Outcome) {
        let task = ProofSubmissionTask::new(
            h.history[1].clone(),
            Nonce::new(nonce),
            Destination::parse("https://shop.example/pop").unwrap(),
            passphrase.map(str::to_string),
            h.capabilities.clone(),
        );
        let mut events = Vec::new();
        let outcome = task.run(|event| events.push(event));
        (events, outcome)
    }

    #[test]
    fn test_success_event_order() {
        let h = harness(true, ScriptedSender::default());
        let (events, outcome) = run_sync(&h, Some(PASSPHRASE), vec![9]);
        assert!(outcome.unwrap().is_ok());
        assert_eq!(
            events,
            vec![WorkflowState::Decrypting, WorkflowState::Signing, WorkflowState::Sending]
        );
    }

    #[test]
    fn test_bad_key_event_order() {
        let h = harness(true, ScriptedSender::default());
        let (events, outcome) = run_sync(&h, Some("nope"), vec![9]);
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::BadDecryptionKey);
        assert_eq!(
            events,
            vec![WorkflowState::Decrypting, WorkflowState::Signing, WorkflowState::Input]
        );
    }

    #[test]
    fn test_missing_passphrase_on_encrypted_wallet() {
        let h = harness(true, ScriptedSender::default());
        let (events, outcome) = run_sync(&h, None, vec![9]);
        // empty passphrase still derives a key; it just does not decrypt
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::BadDecryptionKey);
        assert_eq!(events.last(), Some(&WorkflowState::Input));
    }

    #[test]
    fn test_construction_failure_event_order() {
        let h = harness(false, ScriptedSender::default());
        let (events, outcome) = run_sync(&h, None, Vec::new());
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::ProofConstruction);
        assert_eq!(
            events,
            vec![WorkflowState::Decrypting, WorkflowState::Signing, WorkflowState::Failed]
        );
    }

    #[test]
    fn test_key_error_after_sending_ends_in_failed() {
        let sender = ScriptedSender::with(vec![Err(PopError::BadDecryptionKey("stale key".into()))]);
        let h = harness(false, sender);
        let (events, outcome) = run_sync(&h, None, vec![9]);
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Transport);
        assert_eq!(
            events,
            vec![
                WorkflowState::Decrypting,
                WorkflowState::Signing,
                WorkflowState::Sending,
                WorkflowState::Failed,
            ]
        );
    }
}
