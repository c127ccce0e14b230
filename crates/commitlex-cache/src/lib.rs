//! Keyed memoization for expensive analysis results.
//!
//! The analysis engine is pure and cache-agnostic; callers that want to
//! reuse per-corpus results across requests do it through this collaborator.
//! [`OnceCache`] guarantees at most one computation in flight per distinct
//! key: concurrent readers of the same key block on the in-progress
//! computation instead of duplicating it, while other keys proceed
//! independently. Failed computations are not cached, so a later request
//! may retry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// A thread-safe compute-once cache keyed by corpus identity and
/// operation parameters.
///
/// # Examples
///
/// ```
/// use commitlex_cache::OnceCache;
///
/// let cache: OnceCache<String, Vec<u32>> = OnceCache::new();
/// let table = cache.get_or_compute("acme/api:n=2".to_string(), || vec![1, 2, 3]);
/// let again = cache.get_or_compute("acme/api:n=2".to_string(), || unreachable!());
/// assert_eq!(*table, *again);
/// ```
pub struct OnceCache<K, V> {
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
}

struct Slot<V> {
    value: Mutex<Option<Arc<V>>>,
}

impl<K: Eq + Hash + Clone, V> OnceCache<K, V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, computing it if absent.
    ///
    /// The outer map lock is only held while locating the key's slot; the
    /// computation runs under the slot's own lock, so a slow computation
    /// for one key never blocks lookups of other keys.
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        match self.get_or_try_compute(key, || Ok::<V, std::convert::Infallible>(compute())) {
            Ok(value) => value,
            Err(infallible) => match infallible {},
        }
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but the computation
    /// may fail. Errors are returned to the caller and never cached.
    pub fn get_or_try_compute<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let slot = {
            let mut slots = self.slots.lock().expect("cache map poisoned");
            Arc::clone(slots.entry(key).or_insert_with(|| {
                Arc::new(Slot {
                    value: Mutex::new(None),
                })
            }))
        };

        let mut value = slot.value.lock().expect("cache slot poisoned");
        if let Some(cached) = value.as_ref() {
            debug!("cache hit");
            return Ok(Arc::clone(cached));
        }
        let computed = Arc::new(compute()?);
        *value = Some(Arc::clone(&computed));
        Ok(computed)
    }

    /// Drop the entry for `key`, if any. Returns whether one existed.
    pub fn invalidate(&self, key: &K) -> bool {
        self.slots
            .lock()
            .expect("cache map poisoned")
            .remove(key)
            .is_some()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.slots.lock().expect("cache map poisoned").clear();
    }

    /// Number of keys present (including any currently being computed).
    pub fn len(&self) -> usize {
        self.slots.lock().expect("cache map poisoned").len()
    }

    /// Whether the cache holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V> Default for OnceCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
