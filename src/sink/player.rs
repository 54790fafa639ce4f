//! Local playback through an external player process

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use crate::sink::AudioSink;
use crate::{Error, Result};

/// Default player executable
const DEFAULT_PLAYER: &str = "mpv";

/// Arguments for the default player: uncached playback from stdin
const DEFAULT_PLAYER_ARGS: &[&str] = &["--no-cache", "--no-terminal", "--", "fd://0"];

/// Pipes audio bytes into the stdin of a long-lived player process
#[derive(Debug)]
pub struct PlayerSink {
    child: Child,
    stdin: Option<ChildStdin>,
    program: String,
    closed: bool,
}

impl PlayerSink {
    /// Spawn the default player (`mpv`) reading audio from stdin
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyMissing`] if the player executable is not
    /// on the PATH, or an IO error if it fails to start
    pub fn spawn() -> Result<Self> {
        Self::with_player(DEFAULT_PLAYER, DEFAULT_PLAYER_ARGS)
    }

    /// Spawn a specific player command reading audio from stdin
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyMissing`] if the executable is not on the
    /// PATH, or an IO error if it fails to start
    pub fn with_player(program: &str, args: &[&str]) -> Result<Self> {
        which::which(program).map_err(|_| {
            Error::DependencyMissing(format!(
                "{program} not found on PATH, required to stream audio"
            ))
        })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::SinkWrite("player stdin unavailable".to_string()))?;

        tracing::debug!(player = program, "player process started");

        Ok(Self {
            child,
            stdin: Some(stdin),
            program: program.to_string(),
            closed: false,
        })
    }
}

#[async_trait]
impl AudioSink for PlayerSink {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::SinkWrite("player stdin closed".to_string()))?;
        stdin
            .write_all(bytes)
            .await
            .map_err(|e| Error::SinkWrite(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| Error::SinkWrite(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // closing stdin lets the player drain and exit on its own
        drop(self.stdin.take());
        let status = self.child.wait().await?;
        if status.success() {
            tracing::debug!(player = %self.program, "player exited");
        } else {
            tracing::warn!(player = %self.program, %status, "player exited abnormally");
        }
        Ok(())
    }
}
