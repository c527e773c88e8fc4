//! Chat handlers — `POST /api/v1/chat` and `GET /api/v1/chat/health`.
//!
//! ```text
//! request body
//!   → validate message (trimmed, non-empty), history, options
//!   → ChatCompletion::chat in its own task
//!   → {code: 0, data: {reply, model, usage}} or {code: 1001 | 1002, error}
//! ```

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::routes::AppState;
use crate::llm::{ChatFailure, ChatOptions, ChatTurn};

/// Application code for a classified upstream failure.
pub const CODE_UPSTREAM_FAILURE: u32 = 1001;

/// Application code for an unexpected failure inside the handler.
pub const CODE_INTERNAL_ERROR: u32 = 1002;

const INVALID_MESSAGE: &str = "Please provide a valid message";
const MESSAGE_REQUIRED: &str = "the message field is required and must not be empty";

// ============================================================================
// Request parsing
// ============================================================================

/// A validated chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Trimmed, non-empty user message.
    pub message: String,
    pub history: Vec<ChatTurn>,
    pub options: ChatOptions,
}

impl ChatRequest {
    /// Validate a raw JSON body. `message` is checked before anything else.
    pub fn from_json(body: &Value) -> Result<Self, ChatError> {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ChatError::invalid(MESSAGE_REQUIRED))?
            .to_string();

        let history = match body.get("history") {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => serde_json::from_value(raw.clone())
                .map_err(|e| ChatError::invalid(format!("history is invalid: {}", e)))?,
        };

        let options = match body.get("options") {
            None | Some(Value::Null) => ChatOptions::default(),
            Some(raw) => serde_json::from_value(raw.clone())
                .map_err(|e| ChatError::invalid(format!("options are invalid: {}", e)))?,
        };

        Ok(Self {
            message,
            history,
            options,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures of the chat endpoint, each with its own response body.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// 400: the request shape is wrong.
    #[error("invalid chat request: {0}")]
    Invalid(String),

    /// 500 / 1001: the adapter reported a failure.
    #[error("AI service call failed: {0}")]
    Upstream(ChatFailure),

    /// 500 / 1002: something unexpected broke inside the handler.
    #[error("chat handler failed: {detail}")]
    Internal { detail: String, expose: bool },
}

impl ChatError {
    fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid(detail.into())
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Invalid(detail) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": INVALID_MESSAGE,
                    "error": detail,
                }),
            ),
            Self::Upstream(failure) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "code": CODE_UPSTREAM_FAILURE,
                    "success": false,
                    "message": "AI service call failed",
                    "error": failure,
                }),
            ),
            Self::Internal { detail, expose } => {
                let error = if expose {
                    detail
                } else {
                    "Please try again later".to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "code": CODE_INTERNAL_ERROR,
                        "success": false,
                        "message": "Internal server error",
                        "error": error,
                    }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/chat — forward one message (plus history) upstream.
///
/// The backend call runs in a spawned task: it completes even if the caller
/// goes away, and a panic inside it becomes a 1002 response.
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ChatError> {
    let Json(body) = body.map_err(|e| ChatError::invalid(e.body_text()))?;
    let ChatRequest {
        message,
        history,
        options,
    } = ChatRequest::from_json(&body)?;

    let backend = state.chat.clone();
    let task = tokio::spawn(async move { backend.chat(&message, &history, &options).await });

    match task.await {
        Ok(Ok(reply)) => Ok(Json(json!({
            "code": 0,
            "success": true,
            "data": {
                "reply": reply.reply,
                "model": reply.model,
                "usage": reply.usage,
            },
            "message": "Message sent successfully",
        }))),
        Ok(Err(failure)) => Err(ChatError::Upstream(failure)),
        Err(join_error) => {
            let detail = format!("chat task failed: {}", join_error);
            tracing::error!("{}", detail);
            Err(ChatError::Internal {
                detail,
                expose: state.run_mode.is_development(),
            })
        }
    }
}

/// GET /api/v1/chat/health — reports credential presence, no upstream call.
pub async fn chat_health_handler(State(state): State<AppState>) -> Json<Value> {
    let configured = state.chat.is_configured();
    let message = if configured {
        "DeepSeek API is configured"
    } else {
        "DeepSeek API is not configured, set the DEEPSEEK_API_KEY environment variable"
    };
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "apiConfigured": configured,
            "message": message,
        },
    }))
}

// ============================================================================
// Tests
// ============================================================================
