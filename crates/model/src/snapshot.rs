use crate::types::{Category, HeadingPlacement, Rule, UtmTemplate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque version token identifying one immutable rule-set snapshot.
/// Cached renderings are keyed by it and invalidated purely by comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotVersion(pub u64);

impl std::fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An immutable copy of all rules, categories and templates, captured
/// atomically before a render starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSnapshot {
    pub rules: Vec<Rule>,
    pub categories: Vec<Category>,
    pub templates: Vec<UtmTemplate>,
    pub version: SnapshotVersion,
}

impl RuleSnapshot {
    /// Create a snapshot from parts
    pub fn new(
        rules: Vec<Rule>,
        categories: Vec<Category>,
        templates: Vec<UtmTemplate>,
        version: SnapshotVersion,
    ) -> Self {
        Self {
            rules,
            categories,
            templates,
            version,
        }
    }

    /// An empty snapshot at version 0, useful as a neutral default
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![], vec![], vec![], SnapshotVersion(0))
    }

    /// Look up a rule by id
    #[must_use]
    pub fn rule(&self, id: u64) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Look up a category by id
    #[must_use]
    pub fn category(&self, id: u64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Look up a UTM template by id
    #[must_use]
    pub fn template(&self, id: u64) -> Option<&UtmTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Validate all rules, reporting malformed configurations.
    ///
    /// Flagged rules must be excluded from the candidate set; this is
    /// reported once per snapshot load, not per render.
    #[must_use]
    pub fn validate(&self) -> Vec<SnapshotIssue> {
        let mut issues = Vec::new();

        for rule in &self.rules {
            if rule.keywords.is_empty() {
                issues.push(SnapshotIssue::new(rule.id, IssueKind::NoKeywords));
            }

            let mut seen: HashSet<&str> = HashSet::new();
            for keyword in &rule.keywords {
                if keyword.trim().is_empty() {
                    issues.push(SnapshotIssue::new(rule.id, IssueKind::EmptyKeyword));
                    break;
                }
                if !seen.insert(keyword.as_str()) {
                    issues.push(SnapshotIssue::new(rule.id, IssueKind::DuplicateKeyword));
                    break;
                }
            }

            if let HeadingPlacement::Selected(levels) = &rule.placement.headings {
                if levels.is_empty() {
                    issues.push(SnapshotIssue::new(rule.id, IssueKind::EmptyHeadingLevels));
                }
            }
        }

        for issue in &issues {
            log::warn!(
                "Snapshot {}: rule {} excluded ({})",
                self.version,
                issue.rule_id,
                issue.kind
            );
        }

        issues
    }
}

/// One malformed-rule finding from snapshot validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotIssue {
    pub rule_id: u64,
    pub kind: IssueKind,
}

impl SnapshotIssue {
    pub(crate) const fn new(rule_id: u64, kind: IssueKind) -> Self {
        Self { rule_id, kind }
    }
}

/// Why a rule was flagged as malformed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssueKind {
    /// The keyword list is empty
    NoKeywords,
    /// A keyword is empty or whitespace-only
    EmptyKeyword,
    /// The same keyword appears twice within one rule
    DuplicateKeyword,
    /// `Selected` heading placement with an empty level set
    EmptyHeadingLevels,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoKeywords => "no keywords",
            Self::EmptyKeyword => "empty keyword",
            Self::DuplicateKeyword => "duplicate keyword",
            Self::EmptyHeadingLevels => "selected heading placement with no levels",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Destination, PlacementPolicy};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn rule(id: u64, keywords: &[&str]) -> Rule {
        Rule::new(
            id,
            format!("rule {id}"),
            keywords.iter().map(|s| (*s).to_string()).collect(),
            Destination::ExternalUrl {
                url: "https://example.com".to_string(),
            },
        )
    }

    #[test]
    fn test_valid_snapshot_has_no_issues() {
        let snapshot = RuleSnapshot::new(
            vec![rule(1, &["seo"]), rule(2, &["audit", "review"])],
            vec![],
            vec![],
            SnapshotVersion(1),
        );
        assert!(snapshot.validate().is_empty());
    }

    #[test]
    fn test_empty_keyword_list_flagged() {
        let snapshot =
            RuleSnapshot::new(vec![rule(1, &[])], vec![], vec![], SnapshotVersion(1));
        let issues = snapshot.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id, 1);
        assert_eq!(issues[0].kind, IssueKind::NoKeywords);
    }

    #[test]
    fn test_duplicate_keyword_flagged() {
        let snapshot = RuleSnapshot::new(
            vec![rule(4, &["seo", "seo"])],
            vec![],
            vec![],
            SnapshotVersion(1),
        );
        let issues = snapshot.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateKeyword);
    }

    #[test]
    fn test_empty_selected_levels_flagged() {
        let mut bad = rule(9, &["seo"]);
        bad.placement = PlacementPolicy {
            headings: HeadingPlacement::Selected(BTreeSet::new()),
            ..PlacementPolicy::default()
        };
        let snapshot = RuleSnapshot::new(vec![bad], vec![], vec![], SnapshotVersion(2));
        let issues = snapshot.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::EmptyHeadingLevels);
    }

    #[test]
    fn test_lookup_accessors() {
        let snapshot = RuleSnapshot::new(
            vec![rule(1, &["seo"])],
            vec![Category::new(3, "Guides")],
            vec![],
            SnapshotVersion(5),
        );
        assert!(snapshot.rule(1).is_some());
        assert!(snapshot.rule(2).is_none());
        assert_eq!(snapshot.category(3).unwrap().name, "Guides");
        assert!(snapshot.template(1).is_none());
    }
}
