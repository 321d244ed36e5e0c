use crate::error::StoreError;
use crate::store::{RoleStore, TokenVerifier, UserStore};
use crate::types::{RoleDefinition, UserId, UserRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory store implementation for tests and demos.
///
/// Plays all three collaborator parts at once: role store, user store, and
/// a token verifier backed by a plain token-to-user map.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    roles: RwLock<Vec<RoleDefinition>>,
    users: RwLock<HashMap<UserId, UserRecord>>,
    tokens: RwLock<HashMap<String, UserId>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role definition.
    pub fn insert_role(&self, role: RoleDefinition) {
        let mut guard = self.inner.roles.write().expect("poisoned lock");
        guard.push(role);
    }

    /// Adds or replaces a user record.
    pub fn insert_user(&self, user: UserRecord) {
        let mut guard = self.inner.users.write().expect("poisoned lock");
        guard.insert(user.id.clone(), user);
    }

    /// Binds a bearer token to a user id.
    pub fn insert_token(&self, token: impl Into<String>, id: UserId) {
        let mut guard = self.inner.tokens.write().expect("poisoned lock");
        guard.insert(token.into(), id);
    }

    /// Marks a user as disabled or enabled.
    pub fn set_disabled(&self, id: &UserId, disabled: bool) {
        let mut guard = self.inner.users.write().expect("poisoned lock");
        if let Some(user) = guard.get_mut(id) {
            user.disabled = disabled;
        }
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn list_roles(&self) -> std::result::Result<Vec<RoleDefinition>, StoreError> {
        let guard = self.inner.roles.read().expect("poisoned lock");
        Ok(guard.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn fetch_user(
        &self,
        id: &UserId,
    ) -> std::result::Result<Option<UserRecord>, StoreError> {
        let guard = self.inner.users.read().expect("poisoned lock");
        Ok(guard.get(id).cloned())
    }
}

#[async_trait]
impl TokenVerifier for MemoryStore {
    async fn verify_token(&self, token: &str) -> std::result::Result<UserId, StoreError> {
        let guard = self.inner.tokens.read().expect("poisoned lock");
        guard
            .get(token)
            .cloned()
            .ok_or_else(|| "unknown token".into())
    }
}
