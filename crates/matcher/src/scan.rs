use crate::error::Result;
use crate::normalize::{FoldOptions, FoldedRun};
use crate::phrases::PhraseSet;
use autolink_model::{PlacementPolicy, Rule};
use autolink_segmenter::{Block, BlockKind, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Engine-wide scan settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Require matches to start and end on word boundaries
    pub word_boundaries: bool,

    /// Strip diacritics from corpus and patterns before matching
    pub fold_diacritics: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            word_boundaries: true,
            fold_diacritics: false,
        }
    }
}

/// One keyword occurrence: rule, block, byte span and the exact
/// original text it covers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchCandidate {
    pub rule_id: u64,
    pub block_id: usize,
    pub span: Span,
    pub matched_text: String,
}

/// Whether a rule's placement policy admits a block of the given kind
#[must_use]
pub fn placement_allows(policy: &PlacementPolicy, kind: BlockKind) -> bool {
    match kind {
        BlockKind::Paragraph => policy.paragraphs,
        BlockKind::Heading(level) => policy.allows_heading(level),
        BlockKind::ListItem => policy.lists,
        BlockKind::Caption => policy.captions,
        BlockKind::Widget => policy.widgets,
    }
}

/// Scans segmented blocks with one combined automaton over every
/// candidate rule's keywords.
///
/// A block is only scanned when at least one candidate's placement
/// policy admits it; per-rule placement is re-checked per match.
/// Protected spans never reach the scanner because the segmenter does
/// not emit runs for them.
pub struct Scanner<'r> {
    rules: Vec<&'r Rule>,
    by_id: HashMap<u64, &'r Rule>,
    phrases: PhraseSet,
    settings: ScanSettings,
}

impl<'r> Scanner<'r> {
    /// Build the combined automaton for the candidate rules.
    /// Candidate order is irrelevant here; precedence is decided by
    /// span length, priority and rule id.
    pub fn new(rules: Vec<&'r Rule>, settings: ScanSettings) -> Result<Self> {
        let phrases = PhraseSet::build(
            rules.iter().map(|r| (r.id, r.keywords.as_slice())),
            FoldOptions {
                fold_diacritics: settings.fold_diacritics,
            },
        )?;
        let by_id = rules.iter().map(|r| (r.id, *r)).collect();
        Ok(Self {
            rules,
            by_id,
            phrases,
            settings,
        })
    }

    /// Number of phrases in the combined automaton
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.phrases.pattern_count()
    }

    /// Scan blocks and return raw candidates without deduplication
    #[must_use]
    pub fn scan_blocks(&self, markup: &str, blocks: &[Block]) -> Vec<MatchCandidate> {
        if self.phrases.is_empty() {
            return Vec::new();
        }

        let fold_opts = FoldOptions {
            fold_diacritics: self.settings.fold_diacritics,
        };
        let mut candidates = Vec::new();

        for block in blocks {
            if !self
                .rules
                .iter()
                .any(|r| placement_allows(&r.placement, block.kind))
            {
                continue;
            }

            for run in &block.runs {
                if run.is_empty() {
                    continue;
                }
                let folded =
                    FoldedRun::fold(&markup[run.start..run.end], run.start, fold_opts);

                for (rule_id, start, end) in self.phrases.find_all(folded.text()) {
                    if self.settings.word_boundaries
                        && !(folded.is_word_bound(start) && folded.is_word_bound(end))
                    {
                        continue;
                    }
                    let Some(rule) = self.by_id.get(&rule_id) else {
                        continue;
                    };
                    if !placement_allows(&rule.placement, block.kind) {
                        continue;
                    }
                    let Some(span) = folded.original_span(start, end) else {
                        continue;
                    };
                    candidates.push(MatchCandidate {
                        rule_id,
                        block_id: block.id,
                        span,
                        matched_text: markup[span.start..span.end].to_string(),
                    });
                }
            }
        }

        candidates
    }

    /// Resolve overlapping candidates before allocation: within one
    /// block, the longer span wins outright; equal length falls back
    /// to higher priority, then lower rule id. Output is in document
    /// order with no remaining overlaps.
    #[must_use]
    pub fn resolve_overlaps(&self, mut candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
        candidates.sort_by(|a, b| {
            a.block_id
                .cmp(&b.block_id)
                .then_with(|| b.span.len().cmp(&a.span.len()))
                .then_with(|| self.priority_of(b.rule_id).cmp(&self.priority_of(a.rule_id)))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
                .then_with(|| a.span.start.cmp(&b.span.start))
        });

        let mut kept: Vec<MatchCandidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let collides = kept.iter().any(|k| {
                k.block_id == candidate.block_id && k.span.overlaps(&candidate.span)
            });
            if !collides {
                kept.push(candidate);
            }
        }

        kept.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then_with(|| a.block_id.cmp(&b.block_id))
        });
        kept
    }

    fn priority_of(&self, rule_id: u64) -> i32 {
        self.by_id.get(&rule_id).map(|r| r.priority).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolink_model::{Destination, HeadingPlacement};
    use autolink_segmenter::segment;
    use pretty_assertions::assert_eq;

    fn rule(id: u64, keywords: &[&str]) -> Rule {
        Rule::new(
            id,
            format!("rule {id}"),
            keywords.iter().map(|s| (*s).to_string()).collect(),
            Destination::ExternalUrl {
                url: format!("https://example.com/{id}"),
            },
        )
    }

    fn scan(markup: &str, rules: &[Rule], settings: ScanSettings) -> Vec<MatchCandidate> {
        let blocks = segment(markup).unwrap();
        let scanner = Scanner::new(rules.iter().collect(), settings).unwrap();
        scanner.scan_blocks(markup, &blocks)
    }

    #[test]
    fn test_basic_scan() {
        let rules = vec![rule(1, &["seo"])];
        let candidates = scan("<p>Learn seo today</p>", &rules, ScanSettings::default());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].rule_id, 1);
        assert_eq!(candidates[0].matched_text, "seo");
    }

    #[test]
    fn test_word_boundary_blocks_substring_hits() {
        let rules = vec![rule(1, &["seo"])];
        let hits = scan("<p>Visiting Seoul soon</p>", &rules, ScanSettings::default());
        assert!(hits.is_empty());

        let loose = scan(
            "<p>Visiting Seoul soon</p>",
            &rules,
            ScanSettings {
                word_boundaries: false,
                ..ScanSettings::default()
            },
        );
        assert_eq!(loose.len(), 1);
    }

    #[test]
    fn test_heading_not_scanned_without_heading_placement() {
        let rules = vec![rule(1, &["seo"])];
        let hits = scan(
            "<h2>seo</h2><p>seo</p>",
            &rules,
            ScanSettings::default(),
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].block_id, 1);
    }

    #[test]
    fn test_heading_scanned_when_level_selected() {
        let mut r = rule(1, &["seo"]);
        r.placement.headings = HeadingPlacement::Selected([2].into_iter().collect());
        let hits = scan("<h2>seo</h2><h3>seo</h3>", &[r], ScanSettings::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].block_id, 0);
    }

    #[test]
    fn test_no_dedup_at_scan_time() {
        let rules = vec![rule(1, &["seo"]), rule(2, &["seo audit"])];
        let hits = scan("<p>our seo audit guide</p>", &rules, ScanSettings::default());
        // Both the short and the long phrase are reported
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_resolve_overlaps_longest_wins() {
        let markup = "<p>our seo audit guide</p>";
        let rules = vec![rule(1, &["seo"]), rule(2, &["seo audit"])];
        let blocks = segment(markup).unwrap();
        let scanner = Scanner::new(rules.iter().collect(), ScanSettings::default()).unwrap();
        let resolved = scanner.resolve_overlaps(scanner.scan_blocks(markup, &blocks));

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].rule_id, 2);
        assert_eq!(resolved[0].matched_text, "seo audit");
    }

    #[test]
    fn test_resolve_overlaps_priority_breaks_length_ties() {
        let markup = "<p>link building matters</p>";
        let mut a = rule(1, &["link building"]);
        a.priority = 1;
        let mut b = rule(2, &["link building"]);
        b.priority = 9;
        let rules = vec![a, b];
        let blocks = segment(markup).unwrap();
        let scanner = Scanner::new(rules.iter().collect(), ScanSettings::default()).unwrap();
        let resolved = scanner.resolve_overlaps(scanner.scan_blocks(markup, &blocks));

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].rule_id, 2);
    }

    #[test]
    fn test_resolve_overlaps_rule_id_breaks_remaining_ties() {
        let markup = "<p>link building matters</p>";
        let rules = vec![rule(7, &["link building"]), rule(3, &["link building"])];
        let blocks = segment(markup).unwrap();
        let scanner = Scanner::new(rules.iter().collect(), ScanSettings::default()).unwrap();
        let resolved = scanner.resolve_overlaps(scanner.scan_blocks(markup, &blocks));

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].rule_id, 3);
    }

    #[test]
    fn test_non_overlapping_matches_all_kept() {
        let markup = "<p>seo here and seo there</p>";
        let rules = vec![rule(1, &["seo"])];
        let blocks = segment(markup).unwrap();
        let scanner = Scanner::new(rules.iter().collect(), ScanSettings::default()).unwrap();
        let resolved = scanner.resolve_overlaps(scanner.scan_blocks(markup, &blocks));
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_diacritic_folding_matches_accented_text() {
        let rules = vec![rule(1, &["cafe"])];
        let settings = ScanSettings {
            fold_diacritics: true,
            ..ScanSettings::default()
        };
        let hits = scan("<p>Nice caf\u{e9} nearby</p>", &rules, settings);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_text, "caf\u{e9}");
    }
}
