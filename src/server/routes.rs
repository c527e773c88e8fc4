//! Axum router and service-level handlers.
//!
//! # Routes
//!
//! - `GET  /`                      — Service descriptor
//! - `GET  /health`                — Returns `{"status": "ok", "timestamp": ...}`
//! - `GET  /api/v1/users`          — List users
//! - `GET  /api/v1/users/:id`      — Get one user
//! - `POST /api/v1/users`          — Create a user
//! - `PUT  /api/v1/users/:id`      — Update a user
//! - `DELETE /api/v1/users/:id`    — Delete a user
//! - `POST /api/v1/chat`           — Forward a chat message upstream
//! - `GET  /api/v1/chat/health`    — Upstream credential status
//! - `GET  /api/v1/products`       — Static sample products

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{chat, users};
use crate::config::{AppConfig, RunMode};
use crate::llm::{ChatCompletion, DeepSeekClient};
use crate::users::{InMemoryUserStore, UserStore};

/// Prefix shared by every versioned API route.
pub const API_PREFIX: &str = "/api/v1";

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// User storage backend.
    pub users: Arc<dyn UserStore>,
    /// Upstream chat backend.
    pub chat: Arc<dyn ChatCompletion>,
    /// Controls how much error detail reaches callers.
    pub run_mode: RunMode,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        chat: Arc<dyn ChatCompletion>,
        run_mode: RunMode,
    ) -> Self {
        Self {
            users,
            chat,
            run_mode,
        }
    }

    /// Seeded in-memory users plus a DeepSeek client built from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(InMemoryUserStore::seeded()),
            Arc::new(DeepSeekClient::from_config(config)),
            config.run_mode,
        )
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    let expose_errors = state.run_mode.is_development();

    let api = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/chat", post(chat::chat_handler))
        .route("/chat/health", get(chat::chat_health_handler))
        .route("/products", get(products_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest(API_PREFIX, api)
        .fallback(not_found_handler)
        .layer(CatchPanicLayer::custom(panic_handler(expose_errors)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET / — service descriptor.
async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "API service is running",
        "service": crate::SERVICE_NAME,
        "version": crate::VERSION,
        "endpoints": {
            "api": API_PREFIX,
            "users": format!("{}/users", API_PREFIX),
            "chat": format!("{}/chat", API_PREFIX),
            "health": "/health",
        },
    }))
}

/// GET /health — liveness probe.
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/v1/products — fixed sample catalogue.
async fn products_handler() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [
            {"id": 1, "name": "Product A", "price": 100},
            {"id": 2, "name": "Product B", "price": 200},
        ],
    }))
}

/// Any unmatched route.
async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "The requested endpoint does not exist",
        })),
    )
}

/// Turn a handler panic into the generic 500 body. The panic text is only
/// returned in development mode; it is always logged.
fn panic_handler(expose: bool) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone {
    move |panic| {
        let detail = panic_message(panic.as_ref());
        tracing::error!("handler panicked: {}", detail);
        let error = if expose { Value::String(detail) } else { json!({}) };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Internal server error",
                "error": error,
            })),
        )
            .into_response()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    use crate::server::test_support::{empty_request, send, test_app};

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app();
        let (status, json) = send(&app, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_root_descriptor_lists_endpoints() {
        let app = test_app();
        let (status, json) = send(&app, empty_request("GET", "/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["endpoints"]["users"], "/api/v1/users");
        assert_eq!(json["endpoints"]["chat"], "/api/v1/chat");
        assert_eq!(json["endpoints"]["health"], "/health");
        assert_eq!(json["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_products_endpoint() {
        let app = test_app();
        let (status, json) = send(&app, empty_request("GET", "/api/v1/products")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][1]["price"], 200);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_envelope() {
        let app = test_app();
        for uri in ["/nope", "/api/v1/nope", "/api/v2/users"] {
            let (status, json) = send(&app, empty_request("GET", uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(json["success"], false);
            assert_eq!(json["message"], "The requested endpoint does not exist");
        }
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let app = test_app();
        let request = Request::builder()
            .uri("/health")
            .header("origin", "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_generic_500() {
        async fn boom() -> &'static str {
            panic!("kaboom")
        }

        for (expose, expected) in [(false, json!({})), (true, json!("kaboom"))] {
            let app = Router::new()
                .route("/boom", get(boom))
                .layer(CatchPanicLayer::custom(panic_handler(expose)));
            let (status, json) = send(&app, empty_request("GET", "/boom")).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json["success"], false);
            assert_eq!(json["message"], "Internal server error");
            assert_eq!(json["error"], expected);
        }
    }

    #[test]
    fn test_from_config_uses_run_mode_and_credential() {
        let config = AppConfig {
            deepseek_api_key: Some("sk-test".into()),
            run_mode: RunMode::Development,
            ..Default::default()
        };
        let state = AppState::from_config(&config);
        assert!(state.chat.is_configured());
        assert!(state.run_mode.is_development());
    }
}
