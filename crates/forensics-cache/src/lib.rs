//! Process-local cache for the forensics engine.
//!
//! This is the only shared mutable state in the engine: a single bounded,
//! time-expiring key -> value store. Every `analyze_file` / `search_history`
//! call is otherwise stateless, so a guarded `HashMap` behind a `Mutex` is
//! sufficient — there is no cross-request invalidation protocol to build.
//!
//! Keys are structured as `"<namespace>:<path>[:<config-digest>]"`. The
//! config digest must never be a JSON-stringified config (field order is
//! unspecified there); use [`config_digest`] instead, which hashes an
//! explicitly ordered list of fields with BLAKE3.

#![forbid(unsafe_code)]

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

/// Maximum number of live entries before the least-recently-used one is evicted.
pub const MAX_ENTRIES: usize = 100;

/// Per-entry time-to-live.
pub const TTL: Duration = Duration::from_secs(5 * 60);

struct Slot {
    value: Arc<dyn Any + Send + Sync>,
    inserted_at: Instant,
    last_touch: u64,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    clock: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn is_live(&self, slot: &Slot) -> bool {
        slot.inserted_at.elapsed() < TTL
    }

    fn evict_expired(&mut self) {
        self.slots.retain(|_, slot| slot.inserted_at.elapsed() < TTL);
    }

    fn evict_lru_if_full(&mut self) {
        if self.slots.len() < MAX_ENTRIES {
            return;
        }
        if let Some(victim) = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_touch)
            .map(|(key, _)| key.clone())
        {
            debug!(key = %victim, "evicting least-recently-used cache entry");
            self.slots.remove(&victim);
        }
    }
}

/// A bounded, time-expiring, LRU-evicted store keyed by namespaced strings.
pub struct Cache {
    inner: Mutex<Inner>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns `true` when `key` holds an unexpired value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        match inner.slots.get(key) {
            Some(slot) if inner.is_live(slot) => true,
            Some(_) => {
                inner.slots.remove(key);
                false
            }
            None => false,
        }
    }

    /// Fetch and clone a cached value of type `T`, if present and unexpired.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let live = inner.slots.get(key).map(|s| inner.is_live(s)).unwrap_or(false);
        if !live {
            inner.slots.remove(key);
            return None;
        }
        let touch = inner.tick();
        let slot = inner.slots.get_mut(key)?;
        slot.last_touch = touch;
        slot.value.clone().downcast_ref::<T>().cloned()
    }

    /// Insert or replace a value, evicting expired and, if still full,
    /// least-recently-used entries first.
    pub fn set<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.evict_expired();
        if !inner.slots.contains_key(key) {
            inner.evict_lru_if_full();
        }
        let touch = inner.tick();
        inner.slots.insert(
            key.to_string(),
            Slot {
                value: Arc::new(value),
                inserted_at: Instant::now(),
                last_touch: touch,
            },
        );
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.slots.clear();
    }

    /// Number of live (unexpired) entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.evict_expired();
        inner.slots.len()
    }

    /// Whether the cache currently holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute a short, deterministic digest over an explicitly ordered list of
/// `(field, value)` pairs that affect a cached computation.
///
/// The caller chooses the order; the same order must be used for the same
/// logical field across calls. This sidesteps `serde_json`'s unspecified map
/// key ordering, which would otherwise make the cache key nondeterministic.
#[must_use]
pub fn config_digest(fields: &[(&str, &str)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (name, value) in fields {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    let hex = hasher.finalize().to_hex();
    hex[..16].to_string()
}
