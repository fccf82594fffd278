//! Cache abstraction layer for the preview pipeline.
//!
//! Converting markdown is cheap per call but runs on every keystroke, so the
//! pipeline keeps the most recent conversions in memory. [`CacheBucket`] is the
//! interface consumers see; the backing store is chosen at startup.
//!
//! # Implementations
//!
//! - [`FifoCache`]: bounded store, evicts the oldest-inserted entry at capacity
//! - [`NullCache`]: no-op implementation (always misses), used when caching is
//!   disabled
//!
//! # Example
//!
//! ```
//! use lume_cache::{CacheBucket, FifoCache};
//!
//! let cache = FifoCache::new(2);
//! cache.put("a".to_owned(), 1);
//! cache.put("b".to_owned(), 2);
//! cache.put("c".to_owned(), 3);
//! assert_eq!(cache.get(&"a".to_owned()), None);
//! assert_eq!(cache.get(&"c".to_owned()), Some(3));
//! ```

mod fifo;
pub use fifo::{DEFAULT_CAPACITY, FifoCache};

/// Key-value store shared between render calls.
///
/// Values are returned by clone, so large values should be wrapped in
/// [`std::sync::Arc`].
pub trait CacheBucket<K, V>: Send + Sync {
    /// Retrieve a cached value, or `None` on miss.
    fn get(&self, key: &K) -> Option<V>;

    /// Store a value, replacing any existing entry for `key`.
    fn put(&self, key: K, value: V);
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
///
/// Every `get` returns `None`; every `put` is silently discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCache;

impl<K, V> CacheBucket<K, V> for NullCache {
    fn get(&self, _key: &K) -> Option<V> {
        None
    }

    fn put(&self, _key: K, _value: V) {}
}
