// Chat-completion streaming client using reqwest-eventsource.
//
// Sends the question prompt to an OpenAI-compatible `/chat/completions`
// endpoint with `stream: true` and parses the Server-Sent Events into
// `LlmEvent` variants forwarded over an mpsc channel. Every failure ends the
// stream with `LlmEvent::Error`; nothing here aborts the caller.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use rosterscope_core::config::{AssistantConfig, Config};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::LlmEvent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DONE_SENTINEL: &str = "[DONE]";
const CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// Low-level streaming chat-completion client.
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(api_key: String, settings: &AssistantConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("failed to build HTTP client with timeout, using defaults: {e}");
                reqwest::Client::new()
            });
        Self {
            http,
            api_key,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// Send `user_content` as a single user message and stream the response
    /// as `LlmEvent`s over `tx`.
    ///
    /// Returns when the stream is complete, an error occurs, or the receiver
    /// is dropped.
    pub async fn stream_message(
        &self,
        user_content: &str,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "API key not configured".to_string(),
                })
                .await;
            return Ok(());
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": user_content }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": true
        });

        let request = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let mut es = match request.eventsource() {
            Ok(es) => es,
            Err(e) => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: format!("Failed to create event source: {e}"),
                    })
                    .await;
                return Ok(());
            }
        };

        let mut full_text = String::new();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!(endpoint = %self.endpoint, "SSE connection opened");
                }
                Ok(Event::Message(msg)) => {
                    let data = msg.data.trim();
                    if data == DONE_SENTINEL {
                        debug!(chars = full_text.len(), "stream complete");
                        let _ = tx.send(LlmEvent::Complete { full_text }).await;
                        es.close();
                        return Ok(());
                    }
                    if let Some(message) = parse_stream_error(data) {
                        warn!(%message, "error payload in stream");
                        let _ = tx.send(LlmEvent::Error { message }).await;
                        es.close();
                        return Ok(());
                    }
                    match parse_delta_content(data) {
                        Some(text) if !text.is_empty() => {
                            full_text.push_str(&text);
                            if tx.send(LlmEvent::Token { text }).await.is_err() {
                                // Receiver gone.
                                es.close();
                                return Ok(());
                            }
                        }
                        _ => debug!("ignoring chunk without content"),
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    let message = describe_error(err).await;
                    let _ = tx.send(LlmEvent::Error { message }).await;
                    es.close();
                    return Ok(());
                }
            }
        }
        es.close();

        // Server closed the stream without the [DONE] sentinel.
        if full_text.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "Stream ended unexpectedly without any content".to_string(),
                })
                .await;
        } else {
            let _ = tx.send(LlmEvent::Complete { full_text }).await;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// Either a configured chat client or a disabled placeholder.
pub enum LlmClient {
    Active(ChatClient),
    /// No API key configured.
    Disabled,
}

impl LlmClient {
    /// `Active` when credentials carry a non-empty key, otherwise `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.xai_api_key {
            Some(key) if !key.trim().is_empty() => {
                LlmClient::Active(ChatClient::new(key.trim().to_string(), &config.assistant))
            }
            _ => LlmClient::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    pub async fn stream_message(
        &self,
        user_content: &str,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        match self {
            LlmClient::Active(client) => client.stream_message(user_content, tx).await,
            LlmClient::Disabled => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: "assistant not configured".to_string(),
                    })
                    .await;
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Assistant seam
// ---------------------------------------------------------------------------

/// Anything that can answer a prompt by streaming `LlmEvent`s.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn stream(&self, prompt: &str, tx: mpsc::Sender<LlmEvent>) -> anyhow::Result<()>;
}

#[async_trait]
impl Assistant for LlmClient {
    async fn stream(&self, prompt: &str, tx: mpsc::Sender<LlmEvent>) -> anyhow::Result<()> {
        self.stream_message(prompt, tx).await
    }
}

/// Final text of one streamed answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// The text is an error message rather than an answer.
    pub failed: bool,
}

/// Drive `assistant` to completion, handing each token to `on_token` as it
/// arrives, and fold the stream into a single `Reply`.
pub async fn collect_reply<A, F>(assistant: &A, prompt: &str, mut on_token: F) -> Reply
where
    A: Assistant + ?Sized,
    F: FnMut(&str) + Send,
{
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);

    let produce = assistant.stream(prompt, tx);
    let consume = async {
        let mut reply = None;
        while let Some(event) = rx.recv().await {
            match event {
                LlmEvent::Token { text } => on_token(&text),
                LlmEvent::Complete { full_text } => {
                    reply = Some(Reply {
                        text: full_text,
                        failed: false,
                    })
                }
                LlmEvent::Error { message } => {
                    reply = Some(Reply {
                        text: message,
                        failed: true,
                    })
                }
            }
        }
        reply
    };

    let (result, reply) = tokio::join!(produce, consume);
    if let Err(e) = result {
        warn!("assistant call failed: {e:#}");
        return Reply {
            text: format!("Request error: {e:#}"),
            failed: true,
        };
    }
    reply.unwrap_or_else(|| Reply {
        text: "assistant returned no response".to_string(),
        failed: true,
    })
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// Extract `choices[0].delta.content` from a streamed chunk.
///
/// Expected shape: `{ "choices": [ { "delta": { "content": "..." } } ] }`
pub(crate) fn parse_delta_content(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract `error.message` from an error payload, whether it arrives inside
/// the stream or as a non-success response body.
pub(crate) fn parse_stream_error(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    let error = v.get("error")?;
    match error.get("message").and_then(Value::as_str) {
        Some(msg) => Some(msg.to_string()),
        None => error.as_str().map(|s| s.to_string()),
    }
}

/// Human-readable message for an SSE failure. Non-success responses include
/// the service's own error text when it has one.
async fn describe_error(err: reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            let detail = parse_stream_error(&body).unwrap_or_else(|| body.trim().to_string());
            if detail.is_empty() {
                format!("API error: {status}")
            } else {
                format!("API error: {status} - {detail}")
            }
        }
        reqwest_eventsource::Error::Transport(e) => format!("Request error: {e}"),
        other => format!("Stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
