use crate::cache::TtlCache;
use crate::capability::CapabilityDeriver;
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::permission::Permission;
use crate::rate_limit::RateLimiter;
use crate::registry::RoleRegistry;
use crate::resolver::PermissionResolver;
use crate::store::{RoleStore, TokenVerifier, UserStore};
use crate::types::{UserId, UserRecord};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const DEFAULT_REGISTRY_TTL: Duration = Duration::from_secs(30);
const DEFAULT_USER_TTL: Duration = Duration::from_secs(10);

/// Authorization engine: one explicit context object holding the role
/// registry, the user read-through cache, and the rate limiter, constructed
/// once at process start and injected into handlers.
///
/// All authentication failures surface uniformly as
/// [`Error::Unauthorized`], never distinguishing cause; an authenticated
/// user lacking a required role surfaces as [`Error::Forbidden`].
#[derive(Debug)]
pub struct Engine<R, U, V> {
    registry: RoleRegistry<R>,
    users: U,
    verifier: V,
    user_cache: TtlCache<UserId, UserRecord>,
    limiter: RateLimiter,
}

/// Builder for [`Engine`].
#[derive(Debug)]
pub struct EngineBuilder<R, U, V> {
    role_store: R,
    user_store: U,
    verifier: V,
    registry_ttl: Duration,
    user_ttl: Duration,
}

impl<R, U, V> EngineBuilder<R, U, V> {
    /// Creates a new builder with default TTLs.
    pub fn new(role_store: R, user_store: U, verifier: V) -> Self {
        Self {
            role_store,
            user_store,
            verifier,
            registry_ttl: DEFAULT_REGISTRY_TTL,
            user_ttl: DEFAULT_USER_TTL,
        }
    }

    /// Sets how long the role registry index is served before a re-fetch.
    /// Bounds staleness after an admin edits a role.
    pub fn registry_ttl(mut self, ttl: Duration) -> Self {
        self.registry_ttl = ttl;
        self
    }

    /// Sets how long a loaded user record is served from cache. Short, to
    /// absorb request bursts only.
    pub fn user_ttl(mut self, ttl: Duration) -> Self {
        self.user_ttl = ttl;
        self
    }

    /// Builds the engine.
    pub fn build(self) -> Engine<R, U, V>
    where
        R: RoleStore,
    {
        Engine {
            registry: RoleRegistry::new(self.role_store, self.registry_ttl),
            users: self.user_store,
            verifier: self.verifier,
            user_cache: TtlCache::new(self.user_ttl),
            limiter: RateLimiter::new(),
        }
    }
}

impl<R, U, V> Engine<R, U, V>
where
    R: RoleStore,
    U: UserStore,
    V: TokenVerifier,
{
    /// Verifies a bearer token and loads the subject's user record.
    pub async fn authenticate(&self, token: &str) -> Result<UserRecord> {
        let id = self
            .verifier
            .verify_token(token)
            .await
            .map_err(|_| Error::Unauthorized)?;
        self.load_user(&id).await
    }

    /// Loads a user record, cache-first. A disabled user is an
    /// authentication failure, not a valid-but-restricted user.
    pub async fn load_user(&self, id: &UserId) -> Result<UserRecord> {
        let user = match self.user_cache.get(id) {
            Some(user) => user,
            None => {
                let fetched = self
                    .users
                    .fetch_user(id)
                    .await
                    .map_err(|err| {
                        warn!(user = %id, error = %err, "user store lookup failed");
                        Error::Unauthorized
                    })?
                    .ok_or(Error::Unauthorized)?;
                self.user_cache.set(id.clone(), fetched.clone());
                fetched
            }
        };
        if user.disabled {
            return Err(Error::Unauthorized);
        }
        Ok(user)
    }

    /// Authenticates and then invokes `handler` with the resolved user.
    /// Short-circuits with [`Error::Unauthorized`] on any failure.
    pub async fn require_auth<F, Fut, T>(&self, token: &str, handler: F) -> Result<T>
    where
        F: FnOnce(UserRecord) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let user = self.authenticate(token).await?;
        handler(user).await
    }

    /// Authenticates, checks the user's primary role against `allowed`, and
    /// invokes `handler`. Role names are compared after normalization.
    ///
    /// The primary role is a single coarse field, distinct from the richer
    /// `role_names` list the permission resolver consumes.
    pub async fn require_role<F, Fut, T>(
        &self,
        token: &str,
        allowed: &[&str],
        handler: F,
    ) -> Result<T>
    where
        F: FnOnce(UserRecord) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let user = self.authenticate(token).await?;
        let permitted = user
            .primary_role
            .as_deref()
            .is_some_and(|role| allowed.iter().any(|name| normalize(name) == normalize(role)));
        if !permitted {
            return Err(Error::Forbidden);
        }
        handler(user).await
    }

    /// Returns a resolver over this engine's role registry.
    pub fn resolver(&self) -> PermissionResolver<'_, R> {
        PermissionResolver::new(&self.registry)
    }

    /// Returns a capability deriver over this engine's resolver.
    pub fn capabilities(&self) -> CapabilityDeriver<'_, R> {
        CapabilityDeriver::new(self.resolver())
    }

    /// Returns whether the user holds `permission`. See
    /// [`PermissionResolver::has_permission`].
    pub async fn has_permission(&self, user: &UserRecord, permission: &Permission) -> bool {
        self.resolver().has_permission(user, permission).await
    }

    /// Returns the user's full effective permission set.
    pub async fn effective_permissions(&self, user: &UserRecord) -> HashSet<Permission> {
        self.resolver().effective_permissions(user).await
    }

    /// Returns whether the user is an administrator.
    pub async fn is_admin(&self, user: &UserRecord) -> bool {
        self.capabilities().is_admin(user).await
    }

    /// Returns whether the user is a project manager.
    pub async fn is_project_manager(&self, user: &UserRecord) -> bool {
        self.capabilities().is_project_manager(user).await
    }

    /// Rate-limit gate. Callers derive `key` from the authenticated subject
    /// id when available, else the client address, else a constant, and map
    /// `false` to a throttling response.
    pub fn allow(&self, key: &str, max: usize, window: Duration) -> bool {
        self.limiter.allow(key, max, window)
    }

    /// Returns the shared rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Drops one cached user record so an edit takes effect before TTL
    /// expiry.
    pub fn invalidate_user(&self, id: &UserId) {
        self.user_cache.del(id);
    }

    /// Drops the cached role registry index.
    pub fn invalidate_roles(&self) {
        self.registry.invalidate();
    }

    /// Eagerly loads the role registry, surfacing store failures. Intended
    /// for process startup; regular operation tolerates a cold registry.
    pub async fn warm_up(&self) -> Result<()> {
        self.registry.refresh().await
    }
}
