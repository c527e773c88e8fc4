//! HTTP server.
//!
//! Exposes the user CRUD routes, the chat proxy, and the service/health
//! endpoints. See [`routes`] for the full route table.

pub mod chat;
pub mod error;
pub mod routes;
pub mod users;

pub use error::ApiError;
pub use routes::{app_router, AppState, API_PREFIX};
