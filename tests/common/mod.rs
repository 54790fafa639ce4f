//! Shared test utilities
//!
//! Scripted websocket backends stand in for the synthesis service and the
//! downstream relay, so the pipeline is exercised end to end without any
//! network or audio hardware.

use std::net::SocketAddr;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::{SinkExt, StreamExt};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use cadence_voice::sink::AudioSink;
use cadence_voice::{Error, Result, SynthesisClient};

/// Behavior of the scripted synthesis backend after the init record arrives
pub enum Backend {
    /// Immediately send the given raw records; optionally follow with a
    /// final signal and a clean close. Without the final signal the
    /// connection is simply dropped.
    Scripted {
        records: Vec<String>,
        send_final: bool,
    },
    /// Interactive echo: every non-empty text record is answered with
    /// `frames_per_chunk` audio records whose payload is the chunk text
    /// itself; the empty end-of-input record is answered with a final signal.
    Echo { frames_per_chunk: usize },
}

/// Spawn a one-connection scripted synthesis backend
///
/// Returns the listening address and a handle resolving to the transcript of
/// inbound text records (the init record first).
pub async fn spawn_backend(mode: Backend) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut transcript = Vec::new();

        // first record is the session initialization
        if let Some(Ok(Message::Text(init))) = ws.next().await {
            transcript.push(init.to_string());
        }

        match mode {
            Backend::Scripted {
                records,
                send_final,
            } => {
                for record in records {
                    ws.send(Message::text(record)).await.unwrap();
                }
                if send_final {
                    ws.send(Message::text(r#"{"isFinal":true}"#)).await.unwrap();
                    let _ = ws.close(None).await;
                    // drain until the peer closes so no inbound data is
                    // discarded with a reset
                    while let Some(Ok(message)) = ws.next().await {
                        if let Message::Text(raw) = message {
                            transcript.push(raw.to_string());
                        }
                    }
                } else {
                    // give the peer a moment to finish sending, then drop
                    // the connection without a close handshake
                    let drain = async {
                        while let Some(Ok(message)) = ws.next().await {
                            if let Message::Text(raw) = message {
                                let record: serde_json::Value =
                                    serde_json::from_str(raw.as_str()).unwrap_or_default();
                                let end_of_input = record["text"].as_str() == Some("");
                                transcript.push(raw.to_string());
                                if end_of_input {
                                    break;
                                }
                            }
                        }
                    };
                    let _ = tokio::time::timeout(std::time::Duration::from_millis(200), drain)
                        .await;
                }
            }
            Backend::Echo { frames_per_chunk } => {
                while let Some(Ok(message)) = ws.next().await {
                    let Message::Text(raw) = message else {
                        continue;
                    };
                    transcript.push(raw.to_string());

                    let record: serde_json::Value = serde_json::from_str(raw.as_str()).unwrap();
                    let text = record["text"].as_str().unwrap_or_default().to_string();
                    if text.is_empty() {
                        ws.send(Message::text(r#"{"isFinal":true}"#)).await.unwrap();
                        let _ = ws.close(None).await;
                        break;
                    }
                    for _ in 0..frames_per_chunk {
                        let frame = audio_record(text.as_bytes());
                        ws.send(Message::text(frame)).await.unwrap();
                    }
                }
            }
        }

        transcript
    });

    (addr, handle)
}

/// Spawn a one-connection relay server collecting every text message
pub async fn spawn_relay_server() -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut received = Vec::new();
        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Text(raw) => received.push(raw.to_string()),
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });

    (addr, handle)
}

/// Synthesis client pointed at a scripted backend
pub fn test_client(addr: SocketAddr) -> SynthesisClient {
    SynthesisClient::new(
        format!("ws://{addr}"),
        "model-test".to_string(),
        SecretString::from("test-key".to_string()),
    )
}

/// An `{"audio": ...}` record carrying the given payload
pub fn audio_record(payload: &[u8]) -> String {
    format!(r#"{{"audio":"{}"}}"#, BASE64.encode(payload))
}

/// In-memory audio sink recording writes, with an optional failure point
#[derive(Debug, Default)]
pub struct MemorySink {
    pub bytes: Vec<u8>,
    pub writes: Vec<Vec<u8>>,
    pub closed: bool,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every write after the first `writes` succeed
    pub fn failing_after(writes: usize) -> Self {
        Self {
            fail_after: Some(writes),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AudioSink for MemorySink {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_after.is_some_and(|limit| self.writes.len() >= limit) {
            return Err(Error::SinkWrite("memory sink rejected write".to_string()));
        }
        self.bytes.extend_from_slice(bytes);
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
