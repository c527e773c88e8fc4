//! DeepSeek chat-completions adapter.
//!
//! Builds the outbound request from a message, prior turns and options,
//! sends it once (no retries), and classifies the outcome into a
//! [`ChatOutcome`]. The streaming variant shares request construction and
//! error normalization but hands the raw body stream back unconsumed.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{Map, Value};

use super::error::AdapterError;
use super::types::{ChatFailure, ChatOptions, ChatOutcome, ChatReply, ChatTurn};
use super::ChatCompletion;
use crate::config::{AppConfig, DEFAULT_DEEPSEEK_API_URL};

/// Body keys that `options.extra` is not allowed to replace.
pub const PROTECTED_KEYS: &[&str] = &["messages", "stream"];

/// Raw upstream byte stream returned by [`DeepSeekClient::chat_stream`].
pub type ChatStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// Client for the DeepSeek (OpenAI-compatible) chat-completions API.
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
}

impl DeepSeekClient {
    /// Create a client. A blank key counts as unset.
    pub fn new(api_key: Option<String>, api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_url: api_url.into(),
        }
    }

    /// Build from service configuration, warning when no key is set.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.deepseek_api_key.is_none() {
            log::warn!(
                "DEEPSEEK_API_KEY is not set; chat requests will fail until it is configured"
            );
        }
        Self::new(
            config.deepseek_api_key.clone(),
            config.deepseek_api_url.clone(),
        )
    }

    /// Replace the underlying HTTP client (shared pools, custom TLS).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Outbound message list: history followed by the new user turn.
    pub fn build_messages(message: &str, history: &[ChatTurn]) -> Vec<ChatTurn> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(ChatTurn::user(message));
        messages
    }

    /// Build the request body for a regular chat call.
    pub fn build_request_body(
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> Value {
        let mut body = Map::new();
        body.insert("model".into(), Value::from(options.model()));
        body.insert(
            "messages".into(),
            serde_json::to_value(Self::build_messages(message, history))
                .unwrap_or_else(|_| Value::Array(Vec::new())),
        );
        body.insert("temperature".into(), Value::from(options.temperature()));
        body.insert("max_tokens".into(), Value::from(options.max_tokens()));
        merge_extra(&mut body, options.extra.as_ref());
        Value::Object(body)
    }

    /// Build the request body for a streaming chat call.
    ///
    /// Same as [`build_request_body`](Self::build_request_body) with
    /// `stream: true` and without `max_tokens`.
    pub fn build_stream_request_body(
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> Value {
        let mut body = Map::new();
        body.insert("model".into(), Value::from(options.model()));
        body.insert(
            "messages".into(),
            serde_json::to_value(Self::build_messages(message, history))
                .unwrap_or_else(|_| Value::Array(Vec::new())),
        );
        body.insert("temperature".into(), Value::from(options.temperature()));
        body.insert("stream".into(), Value::Bool(true));
        merge_extra(&mut body, options.extra.as_ref());
        Value::Object(body)
    }

    /// Send one chat request and normalize the outcome.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> ChatOutcome {
        self.try_chat(message, history, options)
            .await
            .map_err(|e| {
                log::error!("DeepSeek API call failed: {}", e);
                e.into_failure()
            })
    }

    /// Start a streaming chat request and return the raw body stream.
    ///
    /// The timeout bounds the wait for response headers only; the returned
    /// stream is not consumed here.
    pub async fn chat_stream(
        &self,
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> Result<ChatStream, ChatFailure> {
        self.try_chat_stream(message, history, options)
            .await
            .map_err(|e| {
                log::error!("DeepSeek stream API call failed: {}", e);
                e.into_failure()
            })
    }

    async fn try_chat(
        &self,
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> Result<ChatReply, AdapterError> {
        let api_key = self.api_key.as_deref().ok_or(AdapterError::MissingCredential)?;
        let body = Self::build_request_body(message, history, options);

        log::debug!(
            "DeepSeekClient.chat: model={}, messages={}",
            options.model(),
            history.len() + 1,
        );

        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .timeout(options.timeout())
            .json(&body)
            .send()
            .await
            .map_err(AdapterError::from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(AdapterError::from_reqwest)?;

        if !status.is_success() {
            return Err(AdapterError::Upstream {
                status: status.as_u16(),
                body: parse_body(&text),
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            AdapterError::MalformedResponse(format!(
                "invalid JSON ({}): {}",
                e,
                text.chars().take(500).collect::<String>()
            ))
        })?;

        parse_reply(json)
    }

    async fn try_chat_stream(
        &self,
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> Result<ChatStream, AdapterError> {
        let api_key = self.api_key.as_deref().ok_or(AdapterError::MissingCredential)?;
        let body = Self::build_stream_request_body(message, history, options);

        log::debug!(
            "DeepSeekClient.chat_stream: model={}, messages={}",
            options.model(),
            history.len() + 1,
        );

        let request = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .build()
            .map_err(AdapterError::Request)?;

        let timeout = options.stream_timeout();
        let response = tokio::time::timeout(timeout, self.http.execute(request))
            .await
            .map_err(|_| AdapterError::Timeout(timeout))?
            .map_err(AdapterError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(AdapterError::from_reqwest)?;
            return Err(AdapterError::Upstream {
                status: status.as_u16(),
                body: parse_body(&text),
            });
        }

        Ok(response.bytes_stream().boxed())
    }
}

impl Default for DeepSeekClient {
    fn default() -> Self {
        Self::new(None, DEFAULT_DEEPSEEK_API_URL)
    }
}

#[async_trait]
impl ChatCompletion for DeepSeekClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn chat(
        &self,
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> ChatOutcome {
        DeepSeekClient::chat(self, message, history, options).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Shallow-merge `extra` into the body, skipping protected keys.
fn merge_extra(body: &mut Map<String, Value>, extra: Option<&Map<String, Value>>) {
    let Some(extra) = extra else {
        return;
    };
    for (key, value) in extra {
        if PROTECTED_KEYS.contains(&key.as_str()) {
            log::warn!("Ignoring options.extra.{}: field cannot be overridden", key);
            continue;
        }
        body.insert(key.clone(), value.clone());
    }
}

/// Parse an upstream body as JSON, keeping the raw text when it is not.
fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Extract the first choice, model and usage from a 2xx body.
fn parse_reply(json: Value) -> Result<ChatReply, AdapterError> {
    let reply = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            AdapterError::MalformedResponse("no choices[0].message.content in response".into())
        })?
        .to_string();

    let model = json
        .get("model")
        .and_then(|m| m.as_str())
        .map(String::from);
    let usage = json.get("usage").filter(|u| !u.is_null()).cloned();

    if let Some(ref usage) = usage {
        log::debug!(
            "DeepSeek token usage: prompt={}, completion={}, total={}",
            usage.get("prompt_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
            usage.get("completion_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
            usage.get("total_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
        );
    }

    Ok(ChatReply {
        reply,
        model,
        usage,
        raw: json,
    })
}
