//! Relay sink: forwards audio frames to a downstream media consumer

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::SinkExt;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::sink::AudioSink;
use crate::{Error, Result};

/// Track identifier tagged onto every forwarded frame
const OUTBOUND_TRACK: &str = "outbound";

/// Forwards each audio frame as a media envelope over a persistent websocket
#[derive(Debug)]
pub struct RelaySink {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl RelaySink {
    /// Connect to the downstream media consumer
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the relay endpoint is unreachable
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| Error::Connection(format!("relay {url}: {e}")))?;
        tracing::debug!(url, "relay connected");
        Ok(Self { ws, closed: false })
    }
}

#[async_trait]
impl AudioSink for RelaySink {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let envelope = MediaEnvelope {
            event: "media",
            media: MediaPayload {
                track: OUTBOUND_TRACK,
                payload: BASE64.encode(bytes),
            },
        };
        let json = serde_json::to_string(&envelope)?;
        self.ws
            .send(Message::text(json))
            .await
            .map_err(|e| Error::SinkWrite(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!(error = %e, "relay close not delivered");
        }
        Ok(())
    }
}

/// Wire envelope understood by the downstream consumer
#[derive(Serialize)]
struct MediaEnvelope<'a> {
    event: &'a str,
    media: MediaPayload<'a>,
}

/// Frame payload: fixed track plus base64 audio
#[derive(Serialize)]
struct MediaPayload<'a> {
    track: &'a str,
    payload: String,
}
