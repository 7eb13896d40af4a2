//! End-to-end submission tests against a mock remote ledger.

use std::sync::Arc;

use audittrail::core::{verify_transaction, Transaction};
use audittrail::{AuditProxy, ProxyConfig, ProxyError, GENESIS_OUTPUT_ID};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORDERED: &str = r#"{"header":{"actor":"alice","intent":"view","object":"doc1"},"details":[{"k":"ip","v":"10.0.0.1"}]}"#;
const SHUFFLED: &str = r#"{"details":[{"v":"10.0.0.1","k":"ip"}],"header":{"object":"doc1","actor":"alice","intent":"view"}}"#;

async fn ledger(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn proxy(server: &MockServer, dir: &tempfile::TempDir) -> AuditProxy {
    let config = ProxyConfig::new(format!("{}/", server.uri())).with_data_dir(dir.path());
    AuditProxy::from_config(&config).unwrap()
}

async fn forwarded(server: &MockServer) -> Vec<(Transaction, u64)> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|request| {
            let nonce = request
                .headers
                .get("x-audit-nonce")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap();
            (serde_json::from_slice(&request.body).unwrap(), nonce)
        })
        .collect()
}

#[tokio::test]
async fn test_formatting_only_changes_transaction() {
    let server = ledger(201).await;
    let dir = tempfile::tempdir().unwrap();
    let proxy = proxy(&server, &dir);

    let first = proxy.submit_json(ORDERED.as_bytes()).await.unwrap();
    let second = proxy.submit_json(SHUFFLED.as_bytes()).await.unwrap();

    assert_eq!(first.record_hash, second.record_hash);
    assert_ne!(first.transaction_id, second.transaction_id);
    assert_eq!((first.nonce, second.nonce), (0, 1));

    let sent = forwarded(&server).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, 0);
    assert_eq!(sent[1].1, 1);
    assert_eq!(sent[0].0.id().unwrap(), first.transaction_id);
    assert_eq!(sent[1].0.id().unwrap(), second.transaction_id);

    let public_key = proxy.public_key().unwrap();
    for (tx, _) in &sent {
        verify_transaction(tx, &public_key).unwrap();
    }
}

#[tokio::test]
async fn test_unavailable_ledger_rolls_back() {
    let server = ledger(503).await;
    let dir = tempfile::tempdir().unwrap();
    let proxy = proxy(&server, &dir);

    let nonce_before = proxy.next_nonce().unwrap();
    let output_before = proxy.tracked_output().await.unwrap();

    let err = proxy.submit_json(ORDERED.as_bytes()).await.unwrap_err();
    assert!(matches!(err, ProxyError::Rejected { status: 503, .. }));
    assert!(err.to_string().contains("503"));

    assert_eq!(proxy.next_nonce().unwrap(), nonce_before);
    assert_eq!(proxy.tracked_output().await.unwrap(), output_before);
    assert_eq!(output_before.output_id, GENESIS_OUTPUT_ID);
}

#[tokio::test]
async fn test_unreachable_ledger_rolls_back() {
    let server = ledger(201).await;
    let dir = tempfile::tempdir().unwrap();
    let config = ProxyConfig::new("http://127.0.0.1:1/").with_data_dir(dir.path());
    let unreachable = AuditProxy::from_config(&config).unwrap();

    let err = unreachable.submit_json(ORDERED.as_bytes()).await.unwrap_err();
    assert!(matches!(err, ProxyError::Forwarding { .. }));
    assert_eq!(unreachable.next_nonce().unwrap(), 0);

    // Same state directory, working ledger: the first submission uses nonce 0.
    let proxy = proxy(&server, &dir);
    assert_eq!(proxy.submit_json(ORDERED.as_bytes()).await.unwrap().nonce, 0);
}

#[tokio::test]
async fn test_recovery_after_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let proxy = proxy(&server, &dir);

    assert!(proxy.submit_json(ORDERED.as_bytes()).await.is_err());
    let accepted = proxy.submit_json(ORDERED.as_bytes()).await.unwrap();
    assert_eq!(accepted.nonce, 0);

    let sent = forwarded(&server).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, sent[1].1);
    assert_eq!(sent[1].0.inputs[0].output_id, GENESIS_OUTPUT_ID);
}

#[tokio::test]
async fn test_concurrent_submissions_are_serialized() {
    let server = ledger(201).await;
    let dir = tempfile::tempdir().unwrap();
    let proxy = Arc::new(proxy(&server, &dir));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let proxy = Arc::clone(&proxy);
            tokio::spawn(async move { proxy.submit_json(ORDERED.as_bytes()).await })
        })
        .collect();

    let mut nonces = Vec::new();
    for handle in handles {
        nonces.push(handle.await.unwrap().unwrap().nonce);
    }
    nonces.sort_unstable();
    assert_eq!(nonces, (0..6).collect::<Vec<_>>());

    // Each transaction spends the change output of the one before it.
    let mut sent = forwarded(&server).await;
    sent.sort_by_key(|(_, nonce)| *nonce);
    assert_eq!(sent[0].0.inputs[0].output_id, GENESIS_OUTPUT_ID);
    for pair in sent.windows(2) {
        assert_eq!(pair[1].0.inputs[0].output_id, pair[0].0.outputs[1].id().unwrap());
    }
    assert_eq!(
        proxy.tracked_output().await.unwrap().output_id,
        sent[5].0.outputs[1].id().unwrap()
    );
}
