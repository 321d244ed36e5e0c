use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-window rate limiter keyed by caller-supplied strings.
///
/// Each key holds an ordered list of request timestamps, pruned to the
/// window on every access. A denial is non-blocking and is not recorded,
/// so a storm of rejected requests cannot extend its own lockout. Keys are
/// never evicted wholesale; only their timestamp lists shrink. Cloning
/// shares the underlying state.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            buckets: Arc::clone(&self.buckets),
        }
    }
}

impl RateLimiter {
    /// Creates an empty limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records and admits a request for `key` unless the window is full.
    ///
    /// Prunes the bucket to `[now - window, now]`, denies without recording
    /// when the pruned count has reached `max`, and otherwise records `now`
    /// and admits.
    pub fn allow(&self, key: &str, max: usize, window: Duration) -> bool {
        self.allow_at(key, max, window, Instant::now())
    }

    /// Remaining capacity for `key` within the window. Pure read; records
    /// nothing.
    pub fn remaining(&self, key: &str, max: usize, window: Duration) -> usize {
        let now = Instant::now();
        let mut guard = self.buckets.lock().expect("poisoned lock");
        let Some(bucket) = guard.get_mut(key) else {
            return max;
        };
        prune(bucket, window, now);
        max.saturating_sub(bucket.len())
    }

    fn allow_at(&self, key: &str, max: usize, window: Duration, now: Instant) -> bool {
        let mut guard = self.buckets.lock().expect("poisoned lock");
        let bucket = guard.entry(key.to_string()).or_default();
        prune(bucket, window, now);
        if bucket.len() >= max {
            return false;
        }
        bucket.push_back(now);
        true
    }
}

fn prune(bucket: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    // A window reaching past the clock's origin covers the whole history:
    // nothing has aged out yet.
    let Some(cutoff) = now.checked_sub(window) else {
        return;
    };
    while let Some(oldest) = bucket.front() {
        if *oldest < cutoff {
            bucket.pop_front();
        } else {
            break;
        }
    }
}
