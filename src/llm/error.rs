//! Adapter errors and their mapping onto normalized failures.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::types::{ChatFailure, ErrorCode};

/// Message used when the upstream error body carries none.
pub const UPSTREAM_FALLBACK_MESSAGE: &str = "DeepSeek API call failed";

/// Message used when no response was received.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the DeepSeek API, check the network connection";

/// Errors that can occur while talking to the upstream API.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No API key configured; raised before any network call.
    #[error("DeepSeek API key is not configured, set DEEPSEEK_API_KEY")]
    MissingCredential,

    /// The upstream answered with a non-2xx status.
    #[error("DeepSeek API returned HTTP {status}")]
    Upstream { status: u16, body: Value },

    /// The request was sent but no complete response came back.
    #[error("network error: {}", error_chain(.0))]
    Network(#[source] reqwest::Error),

    /// No response headers arrived within the timeout.
    #[error("no response from DeepSeek API within {0:?}")]
    Timeout(Duration),

    /// The request could not be built (bad URL, bad header).
    #[error("request error: {}", error_chain(.0))]
    Request(#[source] reqwest::Error),

    /// The upstream body did not have the expected shape.
    #[error("malformed DeepSeek response: {0}")]
    MalformedResponse(String),
}

impl AdapterError {
    /// Classify a `reqwest` send/read error.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::Request(error)
        } else {
            Self::Network(error)
        }
    }

    /// Normalized failure class.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Upstream { .. } => ErrorCode::UpstreamError,
            Self::Network(_) | Self::Timeout(_) => ErrorCode::NetworkError,
            Self::MissingCredential | Self::Request(_) | Self::MalformedResponse(_) => {
                ErrorCode::UnknownError
            }
        }
    }

    /// Convert into the normalized failure handed to callers.
    pub fn into_failure(self) -> ChatFailure {
        let code = self.code();
        match self {
            Self::Upstream { status, body } => {
                let message = body
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or(UPSTREAM_FALLBACK_MESSAGE)
                    .to_string();
                ChatFailure {
                    code,
                    message,
                    details: serde_json::json!({
                        "status": status,
                        "body": body,
                    }),
                }
            }
            Self::Network(ref e) => ChatFailure {
                code,
                message: NETWORK_ERROR_MESSAGE.to_string(),
                details: Value::String(error_chain(e)),
            },
            timeout @ Self::Timeout(_) => ChatFailure {
                code,
                message: NETWORK_ERROR_MESSAGE.to_string(),
                details: Value::String(timeout.to_string()),
            },
            other => {
                let message = other.to_string();
                ChatFailure {
                    code,
                    details: Value::String(message.clone()),
                    message,
                }
            }
        }
    }
}

/// Render an error together with its `source()` chain.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
