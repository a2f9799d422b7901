use autolink_model::{RenderContext, Rule, RuleSnapshot, SnapshotIssue};
use std::collections::HashSet;

/// Narrow the snapshot to the rules applicable to one render context.
///
/// Keeps snapshot order so later tie-breaking stays deterministic.
/// Rules flagged by snapshot validation are excluded here; they were
/// already reported when the snapshot was loaded.
#[must_use]
pub fn candidates<'s>(
    snapshot: &'s RuleSnapshot,
    issues: &[SnapshotIssue],
    ctx: &RenderContext,
) -> Vec<&'s Rule> {
    let flagged: HashSet<u64> = issues.iter().map(|i| i.rule_id).collect();

    snapshot
        .rules
        .iter()
        .filter(|rule| rule.is_active())
        .filter(|rule| !flagged.contains(&rule.id))
        .filter(|rule| {
            rule.scope.any_content_type() || rule.scope.content_types.contains(&ctx.content_type)
        })
        .filter(|rule| path_in_scope(rule, &ctx.page_path))
        .collect()
}

/// Whitelist is an exclusive allow: when non-empty, the blacklist is
/// redundant and ignored
fn path_in_scope(rule: &Rule, page_path: &str) -> bool {
    if !rule.scope.whitelist_paths.is_empty() {
        return rule
            .scope
            .whitelist_paths
            .iter()
            .any(|fragment| page_path.contains(fragment.as_str()));
    }
    !rule
        .scope
        .blacklist_paths
        .iter()
        .any(|fragment| page_path.contains(fragment.as_str()))
}
