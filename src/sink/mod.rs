//! Audio sinks
//!
//! Final consumers of decoded audio bytes. The bridge only sees the
//! `AudioSink` capability, so local playback and relaying to a downstream
//! server are interchangeable.

mod player;
mod relay;

use async_trait::async_trait;

pub use player::PlayerSink;
pub use relay::RelaySink;

use crate::Result;

/// Consumer of decoded audio bytes
///
/// Implementations must preserve write order and must not drop bytes
/// silently; a failed write surfaces as [`crate::Error::SinkWrite`] and
/// aborts the caller's receive loop.
#[async_trait]
pub trait AudioSink: Send {
    /// Write audio bytes, in order
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Release the sink; idempotent
    async fn close(&mut self) -> Result<()>;
}
