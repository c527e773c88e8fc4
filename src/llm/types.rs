//! Chat types shared by the adapter and the HTTP layer.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Sampling temperature used when the caller does not pick one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Completion token cap used when the caller does not pick one.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Upstream timeout for a regular chat call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream timeout for a streaming chat call.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Conversation turns
// ---------------------------------------------------------------------------

/// Author of a conversation turn. Roles the service does not know about
/// (`tool`, vendor additions) pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    #[serde(untagged)]
    Other(String),
}

/// A single message in a conversation, in chronological order.
///
/// Keys beyond `role` and `content` (`name`, `tool_call_id`, ...) are kept in
/// `extra` and forwarded upstream as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            extra: Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-call options. Absent fields fall back to the defaults above.
///
/// Unknown keys are ignored on deserialization; only `extra` reaches the
/// upstream verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Upstream timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Fields shallow-merged into the outbound request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl ChatOptions {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn stream_timeout(&self) -> Duration {
        self.timeout
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_STREAM_TIMEOUT)
    }
}

// ---------------------------------------------------------------------------
// Normalized result
// ---------------------------------------------------------------------------

/// A successful upstream reply, decoupled from the upstream response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Content of the first choice.
    pub reply: String,
    /// Model name reported by the upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Token usage block reported by the upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    /// Full upstream body, kept for diagnostics.
    pub raw: Value,
}

/// Failure classes for an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The upstream answered with a non-2xx status.
    UpstreamError,
    /// No response was received (connect failure, timeout).
    NetworkError,
    /// Anything else: missing credential, malformed response.
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamError => "upstream_error",
            Self::NetworkError => "network_error",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified upstream failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ChatFailure {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
}

/// Outcome of a chat call: `Ok` for success, `Err` for a classified failure.
pub type ChatOutcome = Result<ChatReply, ChatFailure>;
