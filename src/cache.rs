use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Generic in-memory cache with per-entry expiry.
///
/// Eviction is lazy: an expired entry is removed the next time it is read,
/// or by an explicit [`del`](TtlCache::del)/[`clear`](TtlCache::clear).
/// There is no background sweep and no size bound; distinct keys accumulate
/// for the life of the process. Cloning shares the underlying state.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    inner: Arc<Mutex<HashMap<K, Entry<V>>>>,
    default_ttl: Duration,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            default_ttl: self.default_ttl,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates a cache whose entries live for `default_ttl` unless a
    /// per-entry TTL is given at insertion.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
        }
    }

    /// Returns the cached value if present and not expired.
    ///
    /// An expired entry is evicted and reported as a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get_at(key, Instant::now())
    }

    /// Stores a value under the default TTL, overwriting any existing entry.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Stores a value under an explicit TTL, overwriting any existing entry.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    /// Removes one entry.
    pub fn del<Q>(&self, key: &Q)
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut guard = self.inner.lock().expect("poisoned lock");
        guard.remove(key);
    }

    /// Removes all entries.
    pub fn clear(&self) {
        let mut guard = self.inner.lock().expect("poisoned lock");
        guard.clear();
    }

    /// Number of stored entries, counting expired entries that have not yet
    /// been lazily evicted.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().expect("poisoned lock");
        guard.len()
    }

    /// Returns whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at<Q>(&self, key: &Q, now: Instant) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut guard = self.inner.lock().expect("poisoned lock");
        match guard.get(key) {
            Some(entry) if now <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                guard.remove(key);
                None
            }
            None => None,
        }
    }

    fn set_at(&self, key: K, value: V, ttl: Duration, now: Instant) {
        let mut guard = self.inner.lock().expect("poisoned lock");
        guard.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }
}
