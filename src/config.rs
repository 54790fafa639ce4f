//! Configuration for the Cadence voice pipeline
//!
//! Everything is environment-provided, matching how the pipeline is deployed:
//! API keys and the voice identifier are opaque inputs, the rest has
//! sensible defaults.

use secrecy::SecretString;

use crate::{Error, Result};

/// Default synthesis websocket base
const DEFAULT_TTS_WS_BASE: &str = "wss://api.elevenlabs.io";

/// Default synthesis model identifier
const DEFAULT_TTS_MODEL: &str = "eleven_turbo_v2_5";

/// Default chat completions API base
const DEFAULT_CHAT_API_BASE: &str = "https://api.openai.com/v1";

/// Default chat model identifier
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default bounded history window (messages kept after the system entry)
const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Cadence pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API keys for external services
    pub api_keys: ApiKeys,

    /// Synthesis voice configuration
    pub voice: VoiceConfig,

    /// Chat completion configuration
    pub chat: ChatConfig,

    /// Downstream relay configuration
    pub relay: RelayConfig,

    /// Local player executable (defaults to `mpv`)
    pub player: Option<String>,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (chat completions)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` API key (streaming synthesis)
    pub elevenlabs: Option<SecretString>,
}

/// Synthesis voice configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Voice identifier (path parameter of the synthesis endpoint)
    pub voice_id: Option<String>,

    /// Synthesis model identifier (query parameter of the synthesis endpoint)
    pub model_id: String,

    /// Websocket base URL of the synthesis backend
    pub ws_base: String,

    /// Voice settings passed through verbatim to the backend
    pub settings: VoiceSettings,
}

/// Backend-defined voice settings, passed through verbatim
#[derive(Debug, Clone, serde::Serialize)]
pub struct VoiceSettings {
    /// Voice stability
    pub stability: f32,

    /// Similarity boost
    pub similarity_boost: f32,

    /// Style exaggeration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,

    /// Speaker boost
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.8,
            style: None,
            use_speaker_boost: None,
        }
    }
}

/// Chat completion configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Chat completions API base URL
    pub api_base: String,

    /// Chat model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// System prompt seeding each conversation
    pub system_prompt: String,

    /// Messages kept after the system entry when trimming history
    pub history_window: usize,
}

/// Downstream relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Websocket URL of the downstream media consumer
    pub url: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads from:
    /// - `OPENAI_API_KEY`: chat completions key
    /// - `ELEVENLABS_API_KEY`: synthesis key
    /// - `ELEVENLABS_VOICE_ID`: voice identifier
    /// - `CADENCE_TTS_WS_BASE`: synthesis websocket base (default `wss://api.elevenlabs.io`)
    /// - `CADENCE_TTS_MODEL`: synthesis model id (default `eleven_turbo_v2_5`)
    /// - `CADENCE_VOICE_STABILITY` / `CADENCE_VOICE_SIMILARITY` /
    ///   `CADENCE_VOICE_STYLE` / `CADENCE_VOICE_SPEAKER_BOOST`: voice settings
    /// - `CADENCE_CHAT_API_BASE`: chat API base (default `https://api.openai.com/v1`)
    /// - `CADENCE_CHAT_MODEL`: chat model (default `gpt-4o-mini`)
    /// - `CADENCE_CHAT_TEMPERATURE`: sampling temperature (default 1.0)
    /// - `CADENCE_SYSTEM_PROMPT`: system prompt
    /// - `CADENCE_HISTORY_WINDOW`: bounded history size (default 10)
    /// - `CADENCE_RELAY_URL`: downstream relay websocket (default `ws://127.0.0.1:3000/media`)
    /// - `CADENCE_PLAYER`: local player executable (default `mpv`)
    #[must_use]
    pub fn from_env() -> Self {
        let api_keys = ApiKeys {
            openai: env_var("OPENAI_API_KEY").map(SecretString::from),
            elevenlabs: env_var("ELEVENLABS_API_KEY").map(SecretString::from),
        };

        let settings = VoiceSettings {
            stability: env_parse("CADENCE_VOICE_STABILITY").unwrap_or(0.5),
            similarity_boost: env_parse("CADENCE_VOICE_SIMILARITY").unwrap_or(0.8),
            style: env_parse("CADENCE_VOICE_STYLE"),
            use_speaker_boost: env_parse("CADENCE_VOICE_SPEAKER_BOOST"),
        };

        let voice = VoiceConfig {
            voice_id: env_var("ELEVENLABS_VOICE_ID"),
            model_id: env_var("CADENCE_TTS_MODEL").unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            ws_base: env_var("CADENCE_TTS_WS_BASE")
                .unwrap_or_else(|| DEFAULT_TTS_WS_BASE.to_string()),
            settings,
        };

        let chat = ChatConfig {
            api_base: env_var("CADENCE_CHAT_API_BASE")
                .unwrap_or_else(|| DEFAULT_CHAT_API_BASE.to_string()),
            model: env_var("CADENCE_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            temperature: env_parse("CADENCE_CHAT_TEMPERATURE").unwrap_or(1.0),
            system_prompt: env_var("CADENCE_SYSTEM_PROMPT").unwrap_or_else(|| {
                "You are a helpful assistant. Answer all questions to the best of your ability."
                    .to_string()
            }),
            history_window: env_parse("CADENCE_HISTORY_WINDOW").unwrap_or(DEFAULT_HISTORY_WINDOW),
        };

        let relay = RelayConfig {
            url: env_var("CADENCE_RELAY_URL")
                .unwrap_or_else(|| "ws://127.0.0.1:3000/media".to_string()),
        };

        Self {
            api_keys,
            voice,
            chat,
            relay,
            player: env_var("CADENCE_PLAYER"),
        }
    }

    /// The synthesis API key, required for opening a session
    ///
    /// # Errors
    ///
    /// Returns error if `ELEVENLABS_API_KEY` is not set
    pub fn elevenlabs_key(&self) -> Result<SecretString> {
        self.api_keys
            .elevenlabs
            .clone()
            .ok_or_else(|| Error::Config("ELEVENLABS_API_KEY is not set".to_string()))
    }

    /// The chat API key, required for streaming completions
    ///
    /// # Errors
    ///
    /// Returns error if `OPENAI_API_KEY` is not set
    pub fn openai_key(&self) -> Result<SecretString> {
        self.api_keys
            .openai
            .clone()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))
    }

    /// The configured voice identifier
    ///
    /// # Errors
    ///
    /// Returns error if `ELEVENLABS_VOICE_ID` is not set
    pub fn voice_id(&self) -> Result<String> {
        self.voice
            .voice_id
            .clone()
            .ok_or_else(|| Error::Config("ELEVENLABS_VOICE_ID is not set".to_string()))
    }
}

/// Read an environment variable, treating empty values as unset
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an environment variable, ignoring unparseable values
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}
