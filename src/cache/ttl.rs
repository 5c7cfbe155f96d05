use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::trace;
use parking_lot::RwLock;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

pub const SWEEP: Duration = Duration::from_secs(5);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Expiry {
    Never,
    At(Instant),
}

struct Entry<V> {
    value:  V,
    expiry: Expiry,
}

/// Key/value store with optional per-entry expiry. Expired entries read
/// as missing and are removed either by the reader, when that can be
/// done without waiting, or by the periodic sweep.
pub struct Cache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    sweep:   Duration,
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> {
    pub fn new() -> Self {
        Self::with_sweep(SWEEP)
    }

    pub fn with_sweep(sweep: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            sweep:   sweep,
        }
    }

    pub fn set(&self, key: K, value: V) {
        self.insert(key, value, Expiry::Never);
    }

    pub fn set_ttl(&self, key: K, value: V, ttl: Duration) {
        self.insert(key, value, Expiry::At(Instant::now() + ttl));
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        match self.entries.read().get(key) {
            Some(e) if !e.expiry.expired(now) => return Some(e.value.clone()),
            Some(_)                           => (),
            None                              => return None,
        }

        self.evict(key, now);

        None
    }

    pub fn remove(&self, key: &K) {
        self.entries.write().remove(key);
    }

    /// Removes `key`, returning its value only if it had not expired.
    pub fn pop(&self, key: &K) -> Option<V> {
        let now   = Instant::now();
        let entry = self.entries.write().remove(key)?;
        match entry.expiry.expired(now) {
            false => Some(entry.value),
            true  => None,
        }
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn purge(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.expiry.expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn insert(&self, key: K, value: V, expiry: Expiry) {
        self.entries.write().insert(key, Entry { value, expiry });
    }

    fn evict(&self, key: &K, now: Instant) {
        if let Some(mut entries) = self.entries.try_write() {
            if entries.get(key).map_or(false, |e| e.expiry.expired(now)) {
                entries.remove(key);
            }
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Periodically purges expired entries until `cancel` fires.
    pub async fn sweep(self: Arc<Self>, cancel: CancellationToken) {
        let mut timer = interval(self.sweep);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick()       => {
                    let n = self.purge();
                    if n > 0 {
                        trace!("swept {} expired entries", n);
                    }
                }
            }
        }
    }
}

impl<K: Eq + Hash, V: Clone> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl Expiry {
    pub fn expired(&self, now: Instant) -> bool {
        match self {
            Expiry::Never  => false,
            Expiry::At(at) => *at <= now,
        }
    }
}
