//! Thin chat-completions collaborator
//!
//! Streams an OpenAI-style chat completion as text fragments in arrival
//! order. This is orchestration around a vendor API: the pipeline only
//! depends on the resulting token stream.

mod context;

use std::pin::Pin;

use futures::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub use context::{ChatMessage, ConversationContext, Role, trim_history};

use crate::config::ChatConfig;
use crate::{Error, Result};

/// Stream of text fragments in arrival order
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Streaming chat-completions client
pub struct ChatClient {
    http: reqwest::Client,
    api_base: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
}

impl ChatClient {
    /// Create a client from chat configuration
    #[must_use]
    pub fn new(config: &ChatConfig, api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Stream a completion for the conversation as text fragments
    ///
    /// The returned stream yields each non-empty content delta; it ends when
    /// the endpoint reports completion.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or the endpoint rejects
    /// it; mid-stream read failures surface as items on the stream.
    pub async fn stream_completion(&self, context: &ConversationContext) -> Result<TokenStream> {
        let request = CompletionRequest {
            model: &self.model,
            messages: context.messages(),
            temperature: self.temperature,
            stream: true,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("chat endpoint returned {status}: {body}")));
        }

        let stream = async_stream::try_stream! {
            let mut bytes = response.bytes_stream();
            // SSE events may arrive split across reads; buffer partial lines
            let mut line_buffer = String::new();

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                let Ok(text) = std::str::from_utf8(&chunk) else {
                    tracing::warn!("non-utf8 data on completion stream, skipping");
                    continue;
                };
                line_buffer.push_str(text);

                while let Some(newline) = line_buffer.find('\n') {
                    let line = line_buffer[..newline].trim().to_string();
                    line_buffer.drain(..=newline);

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        break 'read;
                    }
                    if let Some(content) = extract_content(data) {
                        yield content;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Pull the content delta out of one completion chunk, if it carries any
fn extract_content(data: &str) -> Option<String> {
    let chunk: CompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable completion chunk");
            return None;
        }
    };
    chunk
        .choices
        .into_iter()
        .next()?
        .delta?
        .content
        .filter(|content| !content.is_empty())
}

/// Streaming chat-completions request body
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

/// One SSE chunk from the completions endpoint
#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}
