use crate::scan::MatchCandidate;
use autolink_model::{Category, Rule};
use autolink_segmenter::{Block, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Why a candidate match was not turned into a link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RejectReason {
    /// The rule's `max_per_page` was already reached
    RulePageCap,
    /// The rule's `max_per_block` was already reached in this block
    RuleBlockCap,
    /// The rule's category hit its aggregate cap
    CategoryCap { category_id: u64 },
    /// The operator-configured default page cap was reached
    GlobalCap,
    /// The span collides with an accepted or protected span
    Overlap,
}

impl RejectReason {
    /// Stable identifier used in preview reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RulePageCap => "rule_page_cap_exhausted",
            Self::RuleBlockCap => "rule_block_cap_exhausted",
            Self::CategoryCap { .. } => "category_cap_exhausted",
            Self::GlobalCap => "global_cap_exhausted",
            Self::Overlap => "overlap",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected candidate with its reason, kept for preview diagnostics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectedCandidate {
    pub candidate: MatchCandidate,
    pub reason: RejectReason,
}

/// The allocator's verdict over one document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    /// Accepted matches in document order
    pub accepted: Vec<MatchCandidate>,
    /// Rejected matches with reasons, in acceptance-order encounter
    pub rejected: Vec<RejectedCandidate>,
}

/// Greedy, priority-ordered cap enforcement.
///
/// Candidates are visited in `(priority desc, document order asc)`
/// across the whole document, so higher-priority rules win contested
/// category and global slots deterministically. Expects candidates
/// that already went through overlap resolution.
pub struct Allocator<'r> {
    by_id: HashMap<u64, &'r Rule>,
    category_caps: HashMap<u64, u32>,
    default_page_cap: Option<u32>,
}

impl<'r> Allocator<'r> {
    #[must_use]
    pub fn new(
        rules: &[&'r Rule],
        categories: &[Category],
        default_page_cap: Option<u32>,
    ) -> Self {
        let by_id = rules.iter().map(|r| (r.id, *r)).collect();
        let category_caps = categories
            .iter()
            .filter_map(|c| c.category_cap.map(|cap| (c.id, cap)))
            .collect();
        Self {
            by_id,
            category_caps,
            default_page_cap,
        }
    }

    /// Allocate candidates against rule, category and document caps.
    /// `blocks` supplies the protected spans accepted links must not
    /// touch.
    #[must_use]
    pub fn allocate(&self, mut candidates: Vec<MatchCandidate>, blocks: &[Block]) -> Allocation {
        candidates.sort_by(|a, b| {
            self.priority_of(b.rule_id)
                .cmp(&self.priority_of(a.rule_id))
                .then_with(|| a.block_id.cmp(&b.block_id))
                .then_with(|| a.span.start.cmp(&b.span.start))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });

        let mut rule_totals: HashMap<u64, u32> = HashMap::new();
        let mut block_totals: HashMap<(u64, usize), u32> = HashMap::new();
        let mut category_totals: HashMap<u64, u32> = HashMap::new();
        let mut accepted_spans: HashMap<usize, Vec<Span>> = HashMap::new();
        let mut global_total: u32 = 0;

        let mut allocation = Allocation::default();

        for candidate in candidates {
            let Some(rule) = self.by_id.get(&candidate.rule_id) else {
                continue;
            };

            if let Some(reason) = self.check_candidate(
                &candidate,
                rule,
                &rule_totals,
                &block_totals,
                &category_totals,
                global_total,
                &accepted_spans,
                blocks,
            ) {
                allocation.rejected.push(RejectedCandidate { candidate, reason });
                continue;
            }

            *rule_totals.entry(candidate.rule_id).or_insert(0) += 1;
            *block_totals
                .entry((candidate.rule_id, candidate.block_id))
                .or_insert(0) += 1;
            if let Some(category_id) = self.capped_category(rule) {
                *category_totals.entry(category_id).or_insert(0) += 1;
            }
            global_total += 1;
            accepted_spans
                .entry(candidate.block_id)
                .or_default()
                .push(candidate.span);
            allocation.accepted.push(candidate);
        }

        // Byte order, not block order: a block nested inside a list
        // item interleaves byte-wise with its parent's runs, so block
        // ids do not follow document position
        allocation.accepted.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then_with(|| a.block_id.cmp(&b.block_id))
        });
        allocation
    }

    #[allow(clippy::too_many_arguments)]
    fn check_candidate(
        &self,
        candidate: &MatchCandidate,
        rule: &Rule,
        rule_totals: &HashMap<u64, u32>,
        block_totals: &HashMap<(u64, usize), u32>,
        category_totals: &HashMap<u64, u32>,
        global_total: u32,
        accepted_spans: &HashMap<usize, Vec<Span>>,
        blocks: &[Block],
    ) -> Option<RejectReason> {
        if let Some(cap) = rule.limits.max_per_page {
            if rule_totals.get(&candidate.rule_id).copied().unwrap_or(0) >= cap {
                return Some(RejectReason::RulePageCap);
            }
        }

        if let Some(cap) = rule.limits.max_per_block {
            let key = (candidate.rule_id, candidate.block_id);
            if block_totals.get(&key).copied().unwrap_or(0) >= cap {
                return Some(RejectReason::RuleBlockCap);
            }
        }

        if let Some(category_id) = self.capped_category(rule) {
            let cap = self.category_caps[&category_id];
            if category_totals.get(&category_id).copied().unwrap_or(0) >= cap {
                return Some(RejectReason::CategoryCap { category_id });
            }
        }

        // The default page cap only binds rules without their own cap
        if rule.limits.max_per_page.is_none() {
            if let Some(cap) = self.default_page_cap {
                if global_total >= cap {
                    return Some(RejectReason::GlobalCap);
                }
            }
        }

        let collides_accepted = accepted_spans
            .get(&candidate.block_id)
            .map(|spans| spans.iter().any(|s| s.overlaps(&candidate.span)))
            .unwrap_or(false);
        let collides_protected = blocks
            .get(candidate.block_id)
            .map(|b| b.protected.iter().any(|s| s.overlaps(&candidate.span)))
            .unwrap_or(false);
        if collides_accepted || collides_protected {
            return Some(RejectReason::Overlap);
        }

        None
    }

    fn capped_category(&self, rule: &Rule) -> Option<u64> {
        rule.category_id
            .filter(|id| self.category_caps.contains_key(id))
    }

    fn priority_of(&self, rule_id: u64) -> i32 {
        self.by_id.get(&rule_id).map(|r| r.priority).unwrap_or(0)
    }
}
