//! Audio sink tests: player process piping and relay forwarding
//!
//! The player sink is exercised with a shell `cat` pipeline instead of a
//! real audio player; the relay sink runs against an in-process websocket
//! server.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use cadence_voice::sink::{AudioSink, PlayerSink, RelaySink};
use cadence_voice::Error;

mod common;

use common::spawn_relay_server;

#[tokio::test]
async fn test_player_sink_pipes_bytes_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let capture = dir.path().join("captured");
    let script = format!("cat > {}", capture.display());

    let mut sink = PlayerSink::with_player("sh", &["-c", script.as_str()]).unwrap();
    sink.write(b"first-").await.unwrap();
    sink.write(b"second-").await.unwrap();
    sink.write(b"third").await.unwrap();
    sink.close().await.unwrap();

    // close waits for process exit, so the capture file is complete
    let captured = std::fs::read(&capture).unwrap();
    assert_eq!(captured, b"first-second-third");
}

#[tokio::test]
async fn test_player_sink_close_is_idempotent() {
    let mut sink = PlayerSink::with_player("sh", &["-c", "cat > /dev/null"]).unwrap();
    sink.write(b"bytes").await.unwrap();
    sink.close().await.unwrap();
    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_player_sink_rejects_write_after_close() {
    let mut sink = PlayerSink::with_player("sh", &["-c", "cat > /dev/null"]).unwrap();
    sink.close().await.unwrap();

    let err = sink.write(b"late").await.unwrap_err();
    assert!(matches!(err, Error::SinkWrite(_)));
}

#[test]
fn test_missing_player_fails_at_construction() {
    let err = PlayerSink::with_player("definitely-not-a-player-xyz", &[]).unwrap_err();
    assert!(matches!(err, Error::DependencyMissing(_)));
}

#[tokio::test]
async fn test_relay_sink_forwards_media_envelopes_in_order() {
    let (addr, received) = spawn_relay_server().await;

    let mut sink = RelaySink::connect(&format!("ws://{addr}")).await.unwrap();
    sink.write(b"abc").await.unwrap();
    sink.write(b"def").await.unwrap();
    sink.close().await.unwrap();

    let received = received.await.unwrap();
    assert_eq!(received.len(), 2);

    let first: serde_json::Value = serde_json::from_str(&received[0]).unwrap();
    assert_eq!(first["event"], "media");
    assert_eq!(first["media"]["track"], "outbound");
    let payload = BASE64
        .decode(first["media"]["payload"].as_str().unwrap())
        .unwrap();
    assert_eq!(payload, b"abc");

    let second: serde_json::Value = serde_json::from_str(&received[1]).unwrap();
    let payload = BASE64
        .decode(second["media"]["payload"].as_str().unwrap())
        .unwrap();
    assert_eq!(payload, b"def");
}

#[tokio::test]
async fn test_relay_sink_unreachable_endpoint_is_connection_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = RelaySink::connect(&format!("ws://{addr}")).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
}
