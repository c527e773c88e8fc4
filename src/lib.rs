//! # chat-gateway
//!
//! A small HTTP service with in-memory user CRUD and a proxy endpoint that
//! forwards chat messages to the DeepSeek chat-completions API.
//!
//! - [`config`] - Environment-driven settings
//! - [`llm`] - Upstream adapter and its normalized result types
//! - [`users`] - User records and the store abstraction
//! - [`datastore`] - Startup reachability probe for the data store
//! - [`server`] - Axum router, handlers and shared state

pub mod config;
pub mod datastore;
pub mod llm;
pub mod server;
pub mod users;

pub use config::{AppConfig, RunMode};
pub use llm::{ChatCompletion, ChatOptions, ChatOutcome, ChatTurn, DeepSeekClient};
pub use server::{app_router, AppState};
pub use users::{InMemoryUserStore, User, UserStore};

/// Service name reported by the descriptor endpoint.
pub const SERVICE_NAME: &str = "chat-gateway";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
