//! Bounded insertion-ordered cache.
//!
//! [`FifoCache`] evicts strictly by insertion order: reads never refresh an
//! entry's position, so a heavily used entry still leaves once `capacity`
//! newer keys have been inserted after it.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::CacheBucket;

/// Default number of entries kept by a [`FifoCache`].
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded [`CacheBucket`] with first-in-first-out eviction.
///
/// Re-inserting an existing key replaces the value in place and keeps the
/// key's original insertion position.
pub struct FifoCache<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

struct Inner<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is cached, without cloning its value.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Keep only the entries for which `keep` returns `true`.
    ///
    /// Returns the number of removed entries.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, value| keep(key, value));
        let Inner { entries, order } = &mut *inner;
        order.retain(|key| entries.contains_key(key));
        before - entries.len()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> CacheBucket<K, V> for FifoCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        self.lock().entries.get(key).cloned()
    }

    fn put(&self, key: K, value: V) {
        let mut inner = self.lock();
        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = value;
            return;
        }

        if inner.entries.len() >= self.capacity
            && let Some(oldest) = inner.order.pop_front()
        {
            inner.entries.remove(&oldest);
            tracing::trace!(capacity = self.capacity, "Evicted oldest cache entry");
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, value);
    }
}
