use serde::{Deserialize, Serialize};

/// Dry-run report: what a render would insert and what it rejected,
/// without touching the document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewReport {
    pub accepted: Vec<AcceptedLink>,
    pub rejected: Vec<RejectedMatch>,
}

impl PreviewReport {
    /// Total candidate matches the scan produced, accepted or not
    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// A match the engine would turn into a link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptedLink {
    pub rule_id: u64,
    pub block_id: usize,
    pub matched_text: String,
    /// Final href, tracking parameters included
    pub url: String,
}

/// A match the engine rejected, with a stable reason identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectedMatch {
    pub rule_id: u64,
    pub block_id: usize,
    pub matched_text: String,
    /// One of the allocator's reason identifiers, or
    /// `destination_unresolved`
    pub reason: String,
}
