//! Rendered diagram cache.
//!
//! Provides [`DiagramKey`] for content-based hashes and [`DiagramCache`], a
//! bounded store of finished figures that remembers which theme each entry
//! was rendered for.

use lume_cache::{CacheBucket, FifoCache};
use sha2::{Digest, Sha256};

use crate::consts::DEFAULT_CACHE_CAPACITY;
use crate::theme::Theme;

/// Diagram parameters for cache key computation.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Literal diagram source.
    pub source: &'a str,
    /// Canonical language name.
    pub language: &'a str,
    pub theme: Theme,
}

impl DiagramKey<'_> {
    /// Compute a content hash for this diagram key.
    ///
    /// # Hash Format
    ///
    /// SHA-256 of `"{language}:{theme}:{source}"`, hex encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{}:{}:{}", self.language, self.theme, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Clone)]
struct CachedDiagram {
    theme: Theme,
    markup: String,
}

/// Bounded cache of rendered diagram figures.
///
/// Entries are evicted oldest-inserted first. One instance belongs to one
/// renderer, so separate previews never share entries.
pub struct DiagramCache {
    entries: FifoCache<String, CachedDiagram>,
}

impl DiagramCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FifoCache::new(capacity),
        }
    }

    /// Cached figure for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &DiagramKey<'_>) -> Option<String> {
        self.entries
            .get(&key.compute_hash())
            .map(|cached| cached.markup)
    }

    pub fn put(&self, key: &DiagramKey<'_>, markup: String) {
        self.entries.put(
            key.compute_hash(),
            CachedDiagram {
                theme: key.theme,
                markup,
            },
        );
    }

    /// Remove every entry rendered for a theme other than `active`.
    ///
    /// Returns the number of removed entries.
    pub fn invalidate_theme(&self, active: Theme) -> usize {
        let removed = self.entries.retain(|_, cached| cached.theme == active);
        tracing::debug!(theme = %active, removed, "Invalidated diagram cache");
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DiagramCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(source: &str, theme: Theme) -> DiagramKey<'_> {
        DiagramKey {
            source,
            language: "mermaid",
            theme,
        }
    }

    #[test]
    fn test_diagram_key_hash() {
        let key1 = key("graph TD\nA-->B", Theme::Light);
        let key2 = key("graph TD\nA-->B", Theme::Light);
        let key3 = key("graph TD\nC-->D", Theme::Light);

        assert_eq!(key1.compute_hash(), key2.compute_hash());
        assert_ne!(key1.compute_hash(), key3.compute_hash());
        assert_eq!(key1.compute_hash().len(), 64);
    }

    #[test]
    fn test_diagram_key_hash_theme_matters() {
        let light = key("graph TD", Theme::Light);
        let dark = DiagramKey {
            theme: Theme::Dark,
            ..light
        };
        assert_ne!(light.compute_hash(), dark.compute_hash());
    }

    #[test]
    fn test_diagram_key_hash_language_matters() {
        let mermaid = key("A->B", Theme::Light);
        let diagram = DiagramKey {
            language: "diagram",
            ..mermaid
        };
        assert_ne!(mermaid.compute_hash(), diagram.compute_hash());
    }

    #[test]
    fn test_get_put() {
        let cache = DiagramCache::default();
        let k = key("A->B", Theme::Light);
        assert_eq!(cache.get(&k), None);
        cache.put(&k, "<figure/>".to_owned());
        assert_eq!(cache.get(&k).as_deref(), Some("<figure/>"));
        assert_eq!(cache.get(&key("A->B", Theme::Dark)), None);
    }

    #[test]
    fn test_invalidate_theme_keeps_active() {
        let cache = DiagramCache::default();
        cache.put(&key("a", Theme::Light), "light-a".to_owned());
        cache.put(&key("b", Theme::Light), "light-b".to_owned());
        cache.put(&key("a", Theme::Dark), "dark-a".to_owned());

        assert_eq!(cache.invalidate_theme(Theme::Dark), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a", Theme::Dark)).as_deref(), Some("dark-a"));
        assert_eq!(cache.get(&key("a", Theme::Light)), None);
    }

    #[test]
    fn test_bounded() {
        let cache = DiagramCache::new(2);
        for source in ["a", "b", "c"] {
            cache.put(&key(source, Theme::Light), source.to_owned());
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key("a", Theme::Light)), None);
    }
}
