use autolink_model::SnapshotVersion;
use lru::LruCache;
use std::num::NonZeroUsize;

/// LRU cache of rendered documents, keyed by content id and the
/// snapshot version that produced them.
///
/// Invalidation is purely by key comparison: a new snapshot version
/// makes every older entry unreachable, and capacity eviction reclaims
/// them over time.
pub struct RenderCache {
    entries: LruCache<(u64, SnapshotVersion), String>,
}

impl RenderCache {
    /// Create a cache holding at most `capacity` rendered documents.
    /// A zero capacity is clamped to one; config validation rejects it
    /// earlier.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    #[must_use]
    pub fn get(&mut self, content_id: u64, version: SnapshotVersion) -> Option<&String> {
        self.entries.get(&(content_id, version))
    }

    pub fn put(&mut self, content_id: u64, version: SnapshotVersion, html: String) {
        self.entries.put((content_id, version), html);
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

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache")
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hit_requires_matching_version() {
        let mut cache = RenderCache::new(4);
        cache.put(1, SnapshotVersion(1), "<p>one</p>".to_string());

        assert_eq!(
            cache.get(1, SnapshotVersion(1)).map(String::as_str),
            Some("<p>one</p>")
        );
        assert!(cache.get(1, SnapshotVersion(2)).is_none());
        assert!(cache.get(2, SnapshotVersion(1)).is_none());
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let mut cache = RenderCache::new(2);
        cache.put(1, SnapshotVersion(1), "a".to_string());
        cache.put(2, SnapshotVersion(1), "b".to_string());
        cache.put(3, SnapshotVersion(1), "c".to_string());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(1, SnapshotVersion(1)).is_none());
        assert!(cache.get(3, SnapshotVersion(1)).is_some());
    }
}
