use crate::builtin::PERMISSIONS_BY_ROLE;
use crate::cache::TtlCache;
use crate::normalize::variations;
use crate::permission::Permission;
use crate::store::RoleStore;
use crate::types::RoleDefinition;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

const REGISTRY_CACHE_KEY: &str = "role_registry";

/// Map from every role-name variation to the union of granted permissions.
pub(crate) type RoleIndex = HashMap<String, HashSet<Permission>>;

/// Role registry: external role definitions merged with the built-in table.
///
/// The whole registry is cached as one unit under a fixed sentinel key with
/// a short TTL, so repeated lookups across many requests do not re-fetch the
/// external store, while an admin edit becomes visible within one TTL. A
/// failed refresh serves the last successfully built index instead of
/// denying all access; if no index was ever built, lookups fall back to the
/// built-in table alone.
#[derive(Debug)]
pub struct RoleRegistry<R> {
    store: R,
    cache: TtlCache<&'static str, Arc<RoleIndex>>,
    last_good: Mutex<Option<Arc<RoleIndex>>>,
}

impl<R: RoleStore> RoleRegistry<R> {
    /// Creates a registry over an external role store.
    pub fn new(store: R, ttl: Duration) -> Self {
        Self {
            store,
            cache: TtlCache::new(ttl),
            last_good: Mutex::new(None),
        }
    }

    /// Returns the union of permissions found under any variation of
    /// `role_name`. Empty when no variation matches.
    pub async fn lookup(&self, role_name: &str) -> HashSet<Permission> {
        let index = self.index().await;
        let mut out = HashSet::new();
        for key in variations(role_name) {
            if let Some(perms) = index.get(&key) {
                out.extend(perms.iter().cloned());
            }
        }
        out
    }

    /// Drops the cached index so the next lookup re-fetches the store.
    pub fn invalidate(&self) {
        self.cache.del(REGISTRY_CACHE_KEY);
    }

    /// Eagerly rebuilds and caches the index, surfacing store failures.
    /// Useful at startup to catch misconfiguration before serving requests;
    /// lookups themselves never propagate store errors.
    pub async fn refresh(&self) -> crate::error::Result<()> {
        let index = self.rebuild().await.map_err(crate::error::Error::from)?;
        self.cache.set(REGISTRY_CACHE_KEY, Arc::clone(&index));
        let mut guard = self.last_good.lock().expect("poisoned lock");
        *guard = Some(index);
        Ok(())
    }

    async fn index(&self) -> Arc<RoleIndex> {
        if let Some(index) = self.cache.get(REGISTRY_CACHE_KEY) {
            return index;
        }
        match self.rebuild().await {
            Ok(index) => {
                self.cache.set(REGISTRY_CACHE_KEY, Arc::clone(&index));
                let mut guard = self.last_good.lock().expect("poisoned lock");
                *guard = Some(Arc::clone(&index));
                index
            }
            Err(err) => {
                let guard = self.last_good.lock().expect("poisoned lock");
                match guard.as_ref() {
                    Some(stale) => {
                        warn!(error = %err, "role store refresh failed; serving stale registry");
                        Arc::clone(stale)
                    }
                    None => {
                        warn!(error = %err, "role store unavailable; serving built-in roles only");
                        Arc::new(builtin_index())
                    }
                }
            }
        }
    }

    async fn rebuild(&self) -> std::result::Result<Arc<RoleIndex>, crate::error::StoreError> {
        let definitions = self.store.list_roles().await?;
        let mut index = builtin_index();
        for definition in &definitions {
            index_role(&mut index, definition);
        }
        debug!(
            roles = definitions.len(),
            keys = index.len(),
            "rebuilt role registry index"
        );
        Ok(Arc::new(index))
    }
}

/// Indexes one external role definition under all its name variations,
/// unioning with whatever is already there (the built-in overlay is
/// additive, never a replacement).
fn index_role(index: &mut RoleIndex, definition: &RoleDefinition) {
    let mut permissions = HashSet::new();
    for raw in &definition.permissions {
        match Permission::new(raw) {
            Ok(permission) => {
                permissions.insert(permission);
            }
            Err(err) => {
                warn!(role = %definition.name, permission = %raw, error = %err,
                    "dropping malformed permission from role definition");
            }
        }
    }
    for key in variations(&definition.name) {
        index
            .entry(key)
            .or_default()
            .extend(permissions.iter().cloned());
    }
}

fn builtin_index() -> RoleIndex {
    let mut index = RoleIndex::new();
    for (name, permissions) in PERMISSIONS_BY_ROLE {
        let definition = RoleDefinition::new(*name, permissions.iter().copied());
        index_role(&mut index, &definition);
    }
    index
}
