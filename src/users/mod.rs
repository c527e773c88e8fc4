//! User records and the store abstraction behind the `/api/v1/users` routes.
//!
//! Handlers only see [`UserStore`]; [`InMemoryUserStore`] is the one
//! backend shipped today.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryUserStore;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Inbound fields for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserPayload {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    /// Name, if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    /// Email, if present and non-empty.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.is_empty())
    }
}

/// Errors returned by a [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserStoreError {
    #[error("User {0} not found")]
    NotFound(u64),

    #[error("Please provide a name and email")]
    MissingFields,
}

/// CRUD over users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users in insertion order.
    async fn list(&self) -> Result<Vec<User>, UserStoreError>;

    async fn get(&self, id: u64) -> Result<User, UserStoreError>;

    /// Create a user; both `name` and `email` are required.
    async fn create(&self, payload: UserPayload) -> Result<User, UserStoreError>;

    /// Replace the fields present in `payload`, keeping the rest.
    async fn update(&self, id: u64, payload: UserPayload) -> Result<User, UserStoreError>;

    /// Remove and return a user.
    async fn delete(&self, id: u64) -> Result<User, UserStoreError>;
}
