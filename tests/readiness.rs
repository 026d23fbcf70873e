//! Readiness gate against scripted and real HTTP probes.

mod support;

use ai_services_client::client::ServiceEndpoint;
use ai_services_client::resilience::{wait_until_ready, FnProbe, ReadinessGate};
use ai_services_client::GenerationClient;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use support::fakes::FakeTransport;
use support::mock_server::MockServerFixture;

#[tokio::test(start_paused = true)]
async fn test_three_failed_probes_report_not_ready() {
    let probes = Arc::new(AtomicU32::new(0));
    let counter = probes.clone();
    let probe = FnProbe(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        }
    });

    let status = wait_until_ready(&probe, 3, Duration::from_secs(2)).await;

    assert!(!status.ready);
    assert_eq!(status.attempts, 3);
    assert_eq!(probes.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_client_becomes_ready_after_warmup() {
    let transport = FakeTransport::with_replies(vec![
        FakeTransport::ok(503, "loading"),
        FakeTransport::ok(503, "loading"),
        FakeTransport::ok(200, r#"{"version":"0.3.12"}"#),
    ]);
    let client = GenerationClient::with_transport(ServiceEndpoint::default(), transport.clone());

    let status = ReadinessGate::new(30, Duration::from_secs(2)).wait(&client).await;

    assert!(status.ready);
    assert_eq!(status.attempts, 3);
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_ready_on_first_probe_against_http_server() {
    let fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_get("/api/version", 200, r#"{"version":"0.3.12"}"#)
        .await;
    let status = ReadinessGate::new(5, Duration::from_millis(10))
        .wait(&fixture.client())
        .await;
    assert!(status.ready);
    assert_eq!(status.attempts, 1);
}

#[tokio::test]
async fn test_unreachable_server_never_errors() {
    let client = GenerationClient::builder()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let status = ReadinessGate::new(2, Duration::from_millis(5)).wait(&client).await;
    assert!(!status.ready);
    assert_eq!(status.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_wait_probes_again() {
    let transport = FakeTransport::with_replies(vec![
        FakeTransport::ok(200, "{}"),
        FakeTransport::ok(500, ""),
    ]);
    let client = GenerationClient::with_transport(ServiceEndpoint::default(), transport.clone());
    let gate = ReadinessGate::new(1, Duration::from_secs(1));

    assert!(gate.wait(&client).await.ready);
    assert!(!gate.wait(&client).await.ready);
    assert_eq!(transport.calls(), 2);
}
