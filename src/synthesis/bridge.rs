//! Bridge between a token stream and a spoken-audio sink
//!
//! Wires a token source through the chunker into a synthesis session, and
//! concurrently drains the returned audio into a sink. One bridge run is one
//! utterance: both directions are joined before the run completes, and the
//! session and sink are always released on the way out.

use futures::{Stream, StreamExt};

use crate::config::VoiceSettings;
use crate::sink::AudioSink;
use crate::synthesis::chunker::SentenceChunker;
use crate::synthesis::session::SynthesisClient;
use crate::{Error, Result};

/// State of a bridge over its single utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Constructed, not yet run
    Idle,
    /// Both directions in flight
    Active,
    /// Run finished cleanly
    Completed,
    /// Run finished with a terminal error
    Failed,
}

/// Counters for one completed utterance
#[derive(Debug, Clone)]
pub struct UtteranceSummary {
    /// Text chunks delivered to the backend
    pub chunks_sent: u64,
    /// Audio frames received from the backend
    pub frames_received: u64,
    /// Audio bytes written to the sink
    pub bytes_written: u64,
    /// Whether the audio stream ended without a final signal
    pub truncated: bool,
}

/// Drives one utterance: tokens in, audio out
pub struct SpeechBridge {
    client: SynthesisClient,
    state: BridgeState,
}

impl SpeechBridge {
    /// Create a bridge for one utterance
    #[must_use]
    pub const fn new(client: SynthesisClient) -> Self {
        Self {
            client,
            state: BridgeState::Idle,
        }
    }

    /// Current bridge state
    #[must_use]
    pub const fn state(&self) -> BridgeState {
        self.state
    }

    /// Run the utterance to completion
    ///
    /// Opens a fresh session, then runs two concurrent activities: the send
    /// side pulls fragments, chunks them, and finishes with an end-of-input
    /// record once the source is exhausted (the only cancellation trigger);
    /// the receive side pumps every audio frame into the sink in order.
    ///
    /// The run completes only when both activities have completed. A
    /// send-side failure does not cancel the receive side: audio already in
    /// flight for delivered text is drained, not discarded. The session and
    /// the sink are closed on every exit path; audio already written to the
    /// sink is preserved even when the run fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the session cannot be opened or a
    /// transport write fails, [`Error::SinkWrite`] if the sink rejects a
    /// frame, or the token source's own error if it fails mid-stream.
    pub async fn run<S>(
        &mut self,
        mut tokens: S,
        voice_id: &str,
        settings: &VoiceSettings,
        sink: &mut dyn AudioSink,
    ) -> Result<UtteranceSummary>
    where
        S: Stream<Item = Result<String>> + Unpin,
    {
        self.state = BridgeState::Active;

        let session = match self.client.open(voice_id, settings).await {
            Ok(session) => session,
            Err(e) => {
                self.state = BridgeState::Failed;
                if let Err(close_err) = sink.close().await {
                    tracing::warn!(error = %close_err, "sink close failed");
                }
                return Err(e);
            }
        };
        let (mut sender, mut receiver) = session.into_parts();

        let send_activity = async {
            let mut chunker = SentenceChunker::new();
            let mut chunks_sent: u64 = 0;
            while let Some(fragment) = tokens.next().await {
                if let Some(chunk) = chunker.process(&fragment?) {
                    sender.send_chunk(&chunk).await?;
                    chunks_sent += 1;
                }
            }
            if let Some(chunk) = chunker.flush() {
                sender.send_chunk(&chunk).await?;
                chunks_sent += 1;
            }
            sender.finish_sending().await?;
            Ok::<u64, Error>(chunks_sent)
        };

        let receive_activity = async {
            let mut frames_received: u64 = 0;
            let mut bytes_written: u64 = 0;
            while let Some(frame) = receiver.next_frame().await {
                sink.write(&frame).await?;
                frames_received += 1;
                bytes_written += frame.len() as u64;
            }
            Ok::<(u64, u64), Error>((frames_received, bytes_written))
        };

        let (send_result, receive_result) = tokio::join!(send_activity, receive_activity);

        sender.close().await;
        let truncated = receiver.truncated();
        let close_result = sink.close().await;

        match (send_result, receive_result) {
            (Ok(chunks_sent), Ok((frames_received, bytes_written))) => {
                if let Err(e) = close_result {
                    self.state = BridgeState::Failed;
                    return Err(e);
                }
                if truncated {
                    tracing::warn!(frames_received, "audio stream truncated");
                }
                self.state = BridgeState::Completed;
                Ok(UtteranceSummary {
                    chunks_sent,
                    frames_received,
                    bytes_written,
                    truncated,
                })
            }
            (Err(send_err), receive_result) => {
                if let Err(receive_err) = receive_result {
                    tracing::warn!(error = %receive_err, "receive side also failed");
                }
                self.state = BridgeState::Failed;
                Err(send_err)
            }
            (Ok(_), Err(receive_err)) => {
                self.state = BridgeState::Failed;
                Err(receive_err)
            }
        }
    }
}
