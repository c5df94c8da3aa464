//! Integration tests for the verification runner
//!
//! These cover the parts that touch real I/O without a browser: endpoint
//! discovery against live sockets, scenario file parsing, URL patterns, and
//! artifact handling. Engine semantics (ordering, fail-fast, arm-then-act)
//! are exercised against a scripted driver in the runner's unit tests.

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use httpmock::prelude::*;

use pagecheck::runner::{discover, scenario::Scenario, ArtifactSink};
use pagecheck::{Error, UrlPattern};

/// Reserve a port that nothing is listening on.
fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let port = listener.local_addr().expect("no local addr").port();
    drop(listener);
    port
}

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("scenarios")
        .join(name)
}

const PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

#[tokio::test]
async fn discovery_selects_the_reachable_candidate_after_failed_probes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/");
            then.status(200).body("ok");
        })
        .await;

    // Only the second candidate is alive.
    let ports = vec![dead_port(), server.port()];
    let base = discover("127.0.0.1", &ports, PROBE_TIMEOUT)
        .await
        .expect("discovery should succeed");

    assert_eq!(base, format!("http://127.0.0.1:{}", server.port()));
}

#[tokio::test]
async fn discovery_stops_probing_after_the_first_success() {
    let first = MockServer::start_async().await;
    let second = MockServer::start_async().await;
    let first_mock = first
        .mock_async(|when, then| {
            when.path("/");
            then.status(200);
        })
        .await;
    let second_mock = second
        .mock_async(|when, then| {
            when.path("/");
            then.status(200);
        })
        .await;

    let ports = vec![first.port(), second.port()];
    let base = discover("127.0.0.1", &ports, PROBE_TIMEOUT)
        .await
        .expect("discovery should succeed");

    assert_eq!(base, format!("http://127.0.0.1:{}", first.port()));
    first_mock.assert_async().await;
    assert_eq!(second_mock.hits_async().await, 0);
}

#[tokio::test]
async fn discovery_treats_error_statuses_as_reachable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/");
            then.status(500);
        })
        .await;

    let base = discover("127.0.0.1", &[server.port()], PROBE_TIMEOUT)
        .await
        .expect("a 500 still means something is listening");
    assert_eq!(base, format!("http://127.0.0.1:{}", server.port()));
}

#[tokio::test]
async fn discovery_exhaustion_reports_how_many_candidates_were_probed() {
    let ports = vec![dead_port(), dead_port(), dead_port()];
    let err = discover("127.0.0.1", &ports, PROBE_TIMEOUT)
        .await
        .expect_err("nothing is listening");

    match err {
        Error::DiscoveryExhausted { tried } => assert_eq!(tried, 3),
        other => panic!("expected DiscoveryExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn discovery_probes_candidates_strictly_in_order() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/");
            then.status(200);
        })
        .await;

    // Two dead candidates first: their connect failures must be paid for
    // before the live one is reached.
    let ports = vec![dead_port(), dead_port(), server.port()];
    let start = Instant::now();
    let base = discover("127.0.0.1", &ports, PROBE_TIMEOUT)
        .await
        .expect("third candidate is alive");

    assert_eq!(base, format!("http://127.0.0.1:{}", server.port()));
    // Refused connections fail fast; sequential probing still means the
    // live candidate was only reached after both failures resolved.
    assert!(start.elapsed() < PROBE_TIMEOUT * 3);
}

#[tokio::test]
async fn empty_candidate_list_is_a_config_error() {
    let err = discover("127.0.0.1", &[], PROBE_TIMEOUT)
        .await
        .expect_err("no candidates");
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn login_scenario_fixture_parses() {
    let scenario = Scenario::load(&scenario_path("login.yaml")).expect("fixture should parse");
    assert_eq!(scenario.name, "login reaches dashboard");
    assert_eq!(scenario.target.ports, vec![3000, 3001, 3003, 3004, 3005]);
    assert_eq!(scenario.steps.len(), 6);
    assert_eq!(scenario.defaults.timeout_ms, Some(15_000));
}

#[test]
fn store_module_fixture_parses() {
    let scenario =
        Scenario::load(&scenario_path("store_module.yaml")).expect("fixture should parse");
    assert_eq!(
        scenario.target.base_url.as_deref(),
        Some("http://localhost:3006")
    );
    assert_eq!(scenario.steps.len(), 8);
}

#[test]
fn missing_scenario_file_is_a_config_error() {
    let err = Scenario::load(&scenario_path("does-not-exist.yaml"))
        .expect_err("file is missing");
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn stepless_scenario_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.yaml");
    std::fs::write(&path, "name: nothing to do\nsteps: []\n").unwrap();

    let err = Scenario::load(&path).expect_err("no steps");
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn artifact_dir_creation_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let sink = ArtifactSink::new(dir.path().join("shots"));

    let first = sink.write("submit login", b"png-bytes").unwrap();
    let second = sink.write("submit login", b"png-bytes-again").unwrap();

    // Deterministic path derived from the tag; the second write lands on
    // the same file without a directory error.
    assert_eq!(first, second);
    assert_eq!(first, dir.path().join("shots").join("submit-login.png"));
    assert_eq!(std::fs::read(&first).unwrap(), b"png-bytes-again");
}

#[test]
fn artifact_write_into_blocked_path_is_a_capture_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, b"file, not a directory").unwrap();

    let sink = ArtifactSink::new(blocked.join("shots"));
    let err = sink.write("final", b"bytes").expect_err("dir is a file");
    assert!(matches!(err, Error::Capture(_)));
}

#[test]
fn url_patterns_cover_the_login_flow() {
    let token = UrlPattern::compile("**/auth/v1/token**").unwrap();
    assert!(token.matches("http://localhost:3000/auth/v1/token?grant_type=password"));

    let dashboard = UrlPattern::compile("**/dashboard").unwrap();
    assert!(dashboard.matches("http://localhost:3001/dashboard"));
    assert!(!dashboard.matches("http://localhost:3001/"));
}
