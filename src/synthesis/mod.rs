//! Streaming text-to-speech
//!
//! The engineered core of the pipeline: sentence-aware chunking, the duplex
//! synthesis session, and the bridge that joins the two directions over an
//! audio sink.

mod bridge;
mod chunker;
mod session;

pub use bridge::{BridgeState, SpeechBridge, UtteranceSummary};
pub use chunker::SentenceChunker;
pub use session::{
    ServerEvent, SessionReceiver, SessionSender, SessionState, SynthesisClient, SynthesisSession,
};
