use crate::error::Result;
use crate::snapshot::RuleSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of rule-set snapshots. Implemented by the persistence
/// collaborator; the engine only ever reads one immutable snapshot.
pub trait RuleRepository {
    /// Capture the current rules, categories and templates atomically
    fn load_snapshot(&self) -> Result<RuleSnapshot>;
}

/// Resolves internal content ids to concrete destinations
pub trait ContentLookup {
    /// Resolve a single content id; `None` when the content is gone
    fn resolve(&self, content_id: u64) -> Option<ResolvedContent>;

    /// Resolve a batch of ids in one call. The default implementation
    /// loops over `resolve`; implementations backed by a database
    /// should override this with a single query.
    fn resolve_batch(&self, content_ids: &[u64]) -> HashMap<u64, ResolvedContent> {
        content_ids
            .iter()
            .filter_map(|id| self.resolve(*id).map(|c| (*id, c)))
            .collect()
    }
}

/// A resolved internal destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedContent {
    pub url: String,
    pub title: String,
    pub content_type: String,
}

/// In-memory content lookup for tests and previews
#[derive(Debug, Clone, Default)]
pub struct StaticContentLookup {
    entries: HashMap<u64, ResolvedContent>,
}

impl StaticContentLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolvable content id
    pub fn insert(
        &mut self,
        content_id: u64,
        url: impl Into<String>,
        title: impl Into<String>,
        content_type: impl Into<String>,
    ) {
        self.entries.insert(
            content_id,
            ResolvedContent {
                url: url.into(),
                title: title.into(),
                content_type: content_type.into(),
            },
        );
    }
}

impl ContentLookup for StaticContentLookup {
    fn resolve(&self, content_id: u64) -> Option<ResolvedContent> {
        self.entries.get(&content_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lookup_resolves() {
        let mut lookup = StaticContentLookup::new();
        lookup.insert(10, "https://example.com/guide", "Guide", "post");

        let resolved = lookup.resolve(10).unwrap();
        assert_eq!(resolved.url, "https://example.com/guide");
        assert!(lookup.resolve(11).is_none());
    }

    #[test]
    fn test_batch_skips_missing() {
        let mut lookup = StaticContentLookup::new();
        lookup.insert(1, "/a", "A", "post");
        lookup.insert(3, "/c", "C", "page");

        let batch = lookup.resolve_batch(&[1, 2, 3]);
        assert_eq!(batch.len(), 2);
        assert!(batch.contains_key(&1));
        assert!(!batch.contains_key(&2));
    }
}
