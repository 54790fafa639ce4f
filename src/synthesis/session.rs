//! Duplex streaming session with the synthesis backend
//!
//! One websocket connection per utterance: chunked text goes out, base64
//! audio records come back. The two directions are independent; the session
//! splits into owned halves so a bridge can drive both concurrently.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::config::{Config, VoiceSettings};
use crate::{Error, Result};

/// Client-side websocket stream type
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// State of the send direction of a synthesis session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection established, initialization record not yet sent
    Opening,
    /// Accepting text chunks
    Streaming,
    /// End-of-input sent; audio may still be arriving
    Draining,
    /// Closed by us or by connection loss
    Closed,
}

/// Opens synthesis sessions against a streaming backend
///
/// Holds the connection coordinates; each `open` call produces a fresh
/// session scoped to one utterance.
#[derive(Clone)]
pub struct SynthesisClient {
    ws_base: String,
    model_id: String,
    api_key: SecretString,
}

impl SynthesisClient {
    /// Create a client for the given websocket base and model
    #[must_use]
    pub const fn new(ws_base: String, model_id: String, api_key: SecretString) -> Self {
        Self {
            ws_base,
            model_id,
            api_key,
        }
    }

    /// Create a client from pipeline configuration
    ///
    /// # Errors
    ///
    /// Returns error if the synthesis API key is not configured
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.voice.ws_base.clone(),
            config.voice.model_id.clone(),
            config.elevenlabs_key()?,
        ))
    }

    /// Endpoint URL for a voice: voice id in the path, model id in the query
    ///
    /// # Errors
    ///
    /// Returns error if the configured base does not form a valid URL
    pub fn endpoint(&self, voice_id: &str) -> Result<Url> {
        let raw = format!(
            "{}/v1/text-to-speech/{voice_id}/stream-input?model_id={}",
            self.ws_base.trim_end_matches('/'),
            self.model_id
        );
        Url::parse(&raw).map_err(|e| Error::Config(format!("invalid synthesis endpoint: {e}")))
    }

    /// Open a duplex session and send the initialization record
    ///
    /// The initialization record carries a single leading space as text plus
    /// the voice settings and API key, all passed through verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the transport cannot be established
    /// or the initialization record cannot be delivered
    pub async fn open(
        &self,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> Result<SynthesisSession> {
        let url = self.endpoint(voice_id)?;

        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        let (outbound, inbound) = ws.split();

        let mut sender = SessionSender {
            outbound,
            state: SessionState::Opening,
        };
        sender
            .send_record(&OutboundRecord {
                text: " ",
                voice_settings: Some(settings),
                xi_api_key: Some(self.api_key.expose_secret()),
                try_trigger_generation: None,
            })
            .await?;
        sender.state = SessionState::Streaming;

        tracing::debug!(voice = voice_id, "synthesis session opened");

        Ok(SynthesisSession {
            sender,
            receiver: SessionReceiver {
                inbound,
                finished: false,
                truncated: false,
            },
        })
    }
}

/// One duplex synthesis session, scoped to a single utterance
#[derive(Debug)]
pub struct SynthesisSession {
    sender: SessionSender,
    receiver: SessionReceiver,
}

impl SynthesisSession {
    /// Split into independently owned send and receive halves
    #[must_use]
    pub fn into_parts(self) -> (SessionSender, SessionReceiver) {
        (self.sender, self.receiver)
    }
}

/// Send half: text chunks out
#[derive(Debug)]
pub struct SessionSender {
    outbound: SplitSink<WsStream, Message>,
    state: SessionState,
}

impl SessionSender {
    /// Send one text chunk, asking the backend to start generating early
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the session is not streaming or the
    /// transport write fails
    pub async fn send_chunk(&mut self, text: &str) -> Result<()> {
        if self.state != SessionState::Streaming {
            return Err(Error::Connection(format!(
                "cannot send chunk in {:?} state",
                self.state
            )));
        }
        self.send_record(&OutboundRecord {
            text,
            voice_settings: None,
            xi_api_key: None,
            try_trigger_generation: Some(true),
        })
        .await?;
        tracing::trace!(len = text.len(), "chunk sent");
        Ok(())
    }

    /// Signal end-of-input with an empty text record
    ///
    /// The send direction transitions to draining; the receive direction is
    /// unaffected and may keep producing frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the session is not streaming or the
    /// transport write fails
    pub async fn finish_sending(&mut self) -> Result<()> {
        if self.state != SessionState::Streaming {
            return Err(Error::Connection(format!(
                "cannot finish sending in {:?} state",
                self.state
            )));
        }
        self.send_record(&OutboundRecord {
            text: "",
            voice_settings: None,
            xi_api_key: None,
            try_trigger_generation: None,
        })
        .await?;
        self.state = SessionState::Draining;
        Ok(())
    }

    /// Close the send direction; idempotent, best-effort
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.outbound.send(Message::Close(None)).await {
            tracing::debug!(error = %e, "close frame not delivered");
        }
        self.state = SessionState::Closed;
    }

    /// Current send-direction state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    async fn send_record(&mut self, record: &OutboundRecord<'_>) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.outbound
            .send(Message::text(json))
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }
}

/// Receive half: audio frames in
#[derive(Debug)]
pub struct SessionReceiver {
    inbound: SplitStream<WsStream>,
    finished: bool,
    truncated: bool,
}

impl SessionReceiver {
    /// Next decoded audio frame, or `None` when the stream has ended
    ///
    /// The stream ends on an explicit final signal, on a malformed record,
    /// or on connection loss. The latter two are recorded as truncation and
    /// are not errors: callers treat them as premature end-of-audio.
    pub async fn next_frame(&mut self) -> Option<Vec<u8>> {
        if self.finished || self.truncated {
            return None;
        }
        loop {
            match self.inbound.next().await {
                Some(Ok(Message::Text(raw))) => match ServerEvent::decode(raw.as_str()) {
                    ServerEvent::Audio(frame) => return Some(frame),
                    ServerEvent::Final => {
                        self.finished = true;
                        tracing::debug!("final signal received");
                        return None;
                    }
                    ServerEvent::Malformed => {
                        self.truncated = true;
                        tracing::warn!("malformed synthesis record, ending audio stream");
                        return None;
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    self.truncated = true;
                    tracing::warn!("connection closed before final signal");
                    return None;
                }
                // control frames carry no audio
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.truncated = true;
                    tracing::warn!(error = %e, "synthesis connection lost");
                    return None;
                }
            }
        }
    }

    /// Whether the stream ended without an explicit final signal
    #[must_use]
    pub const fn truncated(&self) -> bool {
        self.truncated
    }
}

/// Outbound record on the synthesis socket
#[derive(Serialize)]
struct OutboundRecord<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_settings: Option<&'a VoiceSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xi_api_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    try_trigger_generation: Option<bool>,
}

/// Inbound record on the synthesis socket
#[derive(Deserialize)]
struct InboundRecord {
    #[serde(default)]
    audio: Option<String>,
    #[serde(default, rename = "isFinal")]
    is_final: Option<bool>,
}

/// Decoded inbound event; every record is exactly one of these
#[derive(Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// Decoded audio payload
    Audio(Vec<u8>),
    /// Explicit end-of-audio signal
    Final,
    /// Undecodable or unrecognized record
    Malformed,
}

impl ServerEvent {
    /// Decode a raw inbound record
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let Ok(record) = serde_json::from_str::<InboundRecord>(raw) else {
            return Self::Malformed;
        };
        if let Some(audio) = record.audio.filter(|a| !a.is_empty()) {
            return BASE64.decode(audio).map_or(Self::Malformed, Self::Audio);
        }
        if record.is_final == Some(true) {
            return Self::Final;
        }
        Self::Malformed
    }
}
