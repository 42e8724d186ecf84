use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UpgradeError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_premium: bool,
}

/// Account state consumed by the upgrade flow. The controller only reads the
/// current user and requests the premium mutation; everything else about the
/// account lives behind this trait.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>, UpgradeError>;

    /// Marks the user as premium. Idempotent: promoting an already premium
    /// user is a no-op success. Unknown users yield `Ok(None)`.
    async fn promote_to_premium(&self, user_id: &str) -> Result<Option<User>, UpgradeError>;
}

#[derive(Default)]
struct MemoryAccounts {
    users: HashMap<String, User>,
    current: Option<String>,
}

/// In-memory account store, used by tests and by embedders without a real
/// backing store.
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: Mutex<MemoryAccounts>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_user(&self, payload: CreateUserPayload) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: payload.name,
            email: payload.email,
            is_premium: payload.is_premium,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.lock_inner();
        inner.users.insert(user.id.clone(), user.clone());
        user
    }

    pub fn sign_in(&self, user_id: &str) {
        self.lock_inner().current = Some(user_id.to_string());
    }

    pub fn sign_out(&self) {
        self.lock_inner().current = None;
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.lock_inner().users.get(user_id).cloned()
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, MemoryAccounts> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn current_user(&self) -> Result<Option<User>, UpgradeError> {
        let inner = self.lock_inner();
        Ok(inner
            .current
            .as_deref()
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn promote_to_premium(&self, user_id: &str) -> Result<Option<User>, UpgradeError> {
        let mut inner = self.lock_inner();
        let Some(user) = inner.users.get_mut(user_id) else {
            return Ok(None);
        };
        if !user.is_premium {
            user.is_premium = true;
            user.updated_at = Utc::now();
        }
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, email: &str) -> CreateUserPayload {
        CreateUserPayload {
            name: name.to_string(),
            email: email.to_string(),
            is_premium: false,
        }
    }

    #[tokio::test]
    async fn promote_is_idempotent() {
        let store = MemoryAccountStore::new();
        let user = store.create_user(payload("U", "u@example.com"));

        let first = store.promote_to_premium(&user.id).await.unwrap().unwrap();
        assert!(first.is_premium);

        let second = store.promote_to_premium(&user.id).await.unwrap().unwrap();
        assert!(second.is_premium);
        assert_eq!(second.updated_at, first.updated_at);
    }

    #[tokio::test]
    async fn promote_unknown_user_is_none() {
        let store = MemoryAccountStore::new();
        assert!(store.promote_to_premium("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn current_user_follows_sign_in_and_out() {
        let store = MemoryAccountStore::new();
        let user = store.create_user(payload("U", "u@example.com"));

        assert!(store.current_user().await.unwrap().is_none());

        store.sign_in(&user.id);
        let current = store.current_user().await.unwrap().unwrap();
        assert_eq!(current.id, user.id);

        store.sign_out();
        assert!(store.current_user().await.unwrap().is_none());
    }
}
