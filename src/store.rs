use crate::error::StoreError;
use crate::types::{RoleDefinition, UserId, UserRecord};
use async_trait::async_trait;

/// External role store collaborator.
///
/// Backed in production by an admin-editable registry; latency, retries and
/// timeouts are its own concern. The engine treats a failure as "serve the
/// last known registry" and never retries itself.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns all role definitions.
    async fn list_roles(&self) -> std::result::Result<Vec<RoleDefinition>, StoreError>;
}

/// External user store collaborator.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the user record for an id, or `None` when unknown.
    async fn fetch_user(&self, id: &UserId)
    -> std::result::Result<Option<UserRecord>, StoreError>;
}

/// External token verifier collaborator.
///
/// Opaque; any cryptographic or identity-provider detail is its
/// responsibility. The engine maps every failure uniformly to an
/// authentication failure.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies a bearer token and returns the subject id.
    async fn verify_token(&self, token: &str) -> std::result::Result<UserId, StoreError>;
}
