//! Process-lifetime user store.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{User, UserPayload, UserStore, UserStoreError};

#[derive(Debug)]
struct Inner {
    users: Vec<User>,
    /// Next id to hand out. Only ever increases, so ids are never reissued.
    next_id: u64,
}

/// In-memory [`UserStore`] guarded by a read-write lock.
#[derive(Debug)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    /// Empty store; the first id is 1.
    pub fn new() -> Self {
        Self::with_users(Vec::new())
    }

    /// Store pre-populated with `users`; new ids start after the largest one.
    pub fn with_users(users: Vec<User>) -> Self {
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(Inner { users, next_id }),
        }
    }

    /// Store with the three sample users.
    pub fn seeded() -> Self {
        let seed = |id, name: &str, email: &str| User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: None,
            updated_at: None,
        };
        Self::with_users(vec![
            seed(1, "Zhang San", "zhangsan@example.com"),
            seed(2, "Li Si", "lisi@example.com"),
            seed(3, "Wang Wu", "wangwu@example.com"),
        ])
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        Ok(self.inner.read().users.clone())
    }

    async fn get(&self, id: u64) -> Result<User, UserStoreError> {
        self.inner
            .read()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(UserStoreError::NotFound(id))
    }

    async fn create(&self, payload: UserPayload) -> Result<User, UserStoreError> {
        let (Some(name), Some(email)) = (payload.name(), payload.email()) else {
            return Err(UserStoreError::MissingFields);
        };

        let mut inner = self.inner.write();
        let user = User {
            id: inner.next_id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        inner.next_id += 1;
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: u64, payload: UserPayload) -> Result<User, UserStoreError> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(UserStoreError::NotFound(id))?;

        if let Some(name) = payload.name() {
            user.name = name.to_string();
        }
        if let Some(email) = payload.email() {
            user.email = email.to_string();
        }
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    async fn delete(&self, id: u64) -> Result<User, UserStoreError> {
        let mut inner = self.inner.write();
        let index = inner
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(UserStoreError::NotFound(id))?;
        Ok(inner.users.remove(index))
    }
}
