//! Cadence - streaming voice pipeline
//!
//! Turns a streamed chat completion into spoken audio with no full-response
//! buffering anywhere: tokens are re-segmented into speakable chunks, fed to
//! a duplex synthesis session, and the returned audio is drained to a local
//! player or a downstream relay while the text is still being produced.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   tokens    ┌─────────────────┐   chunks   ┌───────────────────┐
//! │  ChatClient  ├────────────▶│ SentenceChunker ├───────────▶│ SynthesisSession  │
//! └──────────────┘             └─────────────────┘            │  (duplex socket)  │
//!                                                             └─────────┬─────────┘
//!                                    ┌───────────────┐   audio frames   │
//!                                    │   AudioSink   │◀─────────────────┘
//!                                    │ player │ relay│
//!                                    └───────────────┘
//! ```
//!
//! The send and receive directions run concurrently under one
//! [`SpeechBridge`] per utterance.

pub mod chat;
pub mod config;
pub mod error;
pub mod sink;
pub mod synthesis;

pub use chat::{ChatClient, ConversationContext, TokenStream};
pub use config::{Config, VoiceSettings};
pub use error::{Error, Result};
pub use sink::{AudioSink, PlayerSink, RelaySink};
pub use synthesis::{
    BridgeState, SentenceChunker, SpeechBridge, SynthesisClient, SynthesisSession,
    UtteranceSummary,
};
