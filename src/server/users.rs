//! `/api/v1/users` handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::error::{ApiError, USER_NOT_FOUND};
use super::routes::AppState;
use crate::users::UserPayload;

/// Non-numeric ids can never match a user.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::NotFound(USER_NOT_FOUND.to_string()))
}

/// GET /api/v1/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(json!({
        "success": true,
        "data": users,
        "message": "User list retrieved",
    })))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.get(parse_id(&id)?).await?;
    Ok(Json(json!({
        "success": true,
        "data": user,
    })))
}

/// POST /api/v1/users — requires `name` and `email`.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload?;
    let user = state.users.create(payload).await?;
    tracing::info!(user_id = user.id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": user,
            "message": "User created",
        })),
    ))
}

/// PUT /api/v1/users/:id — fields left out or empty keep their value.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    let user = state.users.update(id, payload).await?;
    Ok(Json(json!({
        "success": true,
        "data": user,
        "message": "User updated",
    })))
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.delete(parse_id(&id)?).await?;
    tracing::info!(user_id = user.id, "user deleted");
    Ok(Json(json!({
        "success": true,
        "data": user,
        "message": "User deleted",
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::test_support::{empty_request, json_request, send, test_app};

    #[tokio::test]
    async fn test_list_seeded_users() {
        let app = test_app();
        let (status, json) = send(&app, empty_request("GET", "/api/v1/users")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
        assert_eq!(json["message"], "User list retrieved");
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let app = test_app();
        let (status, json) = send(&app, empty_request("GET", "/api/v1/users/3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], 3);
        assert_eq!(json["data"]["email"], "wangwu@example.com");
    }

    #[tokio::test]
    async fn test_get_unknown_or_non_numeric_id_is_404() {
        let app = test_app();
        for uri in ["/api/v1/users/42", "/api/v1/users/abc", "/api/v1/users/1abc"] {
            let (status, json) = send(&app, empty_request("GET", uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(json["success"], false);
            assert_eq!(json["message"], "User not found");
        }
    }

    #[tokio::test]
    async fn test_create_user_returns_201_with_next_id() {
        let app = test_app();
        let (status, json) = send(
            &app,
            json_request("POST", "/api/v1/users", json!({"name": "A", "email": "a@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 4);
        assert_eq!(json["data"]["name"], "A");
        assert!(json["data"]["createdAt"].is_string());
        assert_eq!(json["message"], "User created");
    }

    #[tokio::test]
    async fn test_create_user_ids_are_unique() {
        let app = test_app();
        let mut seen = vec![1, 2, 3];
        for i in 0..3 {
            let email = format!("u{i}@x.com");
            let (status, json) = send(
                &app,
                json_request("POST", "/api/v1/users", json!({"name": "U", "email": email})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            let id = json["data"]["id"].as_u64().unwrap();
            assert!(!seen.contains(&id));
            seen.push(id);

            let (status, _) =
                send(&app, empty_request("DELETE", &format!("/api/v1/users/{id}"))).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_create_user_requires_name_and_email() {
        let app = test_app();
        for body in [
            json!({"name": "A"}),
            json!({"email": "a@x.com"}),
            json!({"name": "", "email": "a@x.com"}),
        ] {
            let (status, json) = send(&app, json_request("POST", "/api/v1/users", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["success"], false);
            assert_eq!(json["message"], "Please provide a name and email");
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_malformed_json() {
        let app = test_app();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/users")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_update_user_keeps_email() {
        let app = test_app();
        let (status, json) = send(
            &app,
            json_request("PUT", "/api/v1/users/2", json!({"name": "B"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "B");
        assert_eq!(json["data"]["email"], "lisi@example.com");
        assert!(json["data"]["updatedAt"].is_string());

        let (_, json) = send(&app, empty_request("GET", "/api/v1/users/2")).await;
        assert_eq!(json["data"]["name"], "B");
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_404() {
        let app = test_app();
        let (status, json) = send(
            &app,
            json_request("PUT", "/api/v1/users/99", json!({"name": "B"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_delete_is_not_idempotent() {
        let app = test_app();
        let (status, json) = send(&app, empty_request("DELETE", "/api/v1/users/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], 1);
        assert_eq!(json["message"], "User deleted");

        let (status, json) = send(&app, empty_request("DELETE", "/api/v1/users/1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }
}
