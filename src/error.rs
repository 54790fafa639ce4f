//! Error types for the Cadence voice pipeline

use thiserror::Error;

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Synthesis session could not be opened, or its transport failed
    #[error("connection error: {0}")]
    Connection(String),

    /// Audio stream ended without a final signal from the backend
    #[error("synthesis stream truncated before final signal")]
    Truncated,

    /// Required external executable is not installed
    #[error("missing dependency: {0}")]
    DependencyMissing(String),

    /// Downstream audio consumer rejected a write
    #[error("sink write error: {0}")]
    SinkWrite(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
