use crate::error::{MatchError, Result};
use crate::normalize::{fold_phrase, FoldOptions};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Metadata for each pattern in the combined automaton
#[derive(Debug, Clone)]
struct PatternMeta {
    rule_id: u64,
}

/// One multi-phrase automaton over the union of all candidate rules'
/// keywords.
///
/// Built once per render; scanning each block is then a single pass
/// over its text no matter how many rules are configured. The scan is
/// overlapping and unfiltered: both "seo" and "seo audit" are reported
/// at the same position, and precedence is decided later.
pub struct PhraseSet {
    automaton: Option<AhoCorasick>,
    meta: Vec<PatternMeta>,
}

impl PhraseSet {
    /// Build the automaton over `(rule_id, keywords)` pairs, folding
    /// every phrase with the engine-wide normalization options.
    pub fn build<'a, I>(rules: I, opts: FoldOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, &'a [String])>,
    {
        let mut patterns = Vec::new();
        let mut meta = Vec::new();

        for (rule_id, keywords) in rules {
            for keyword in keywords {
                let folded = fold_phrase(keyword, opts);
                if folded.trim().is_empty() {
                    log::warn!("Rule {rule_id}: skipping empty keyword phrase");
                    continue;
                }
                patterns.push(folded);
                meta.push(PatternMeta { rule_id });
            }
        }

        if patterns.is_empty() {
            return Ok(Self {
                automaton: None,
                meta,
            });
        }

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| MatchError::AutomatonBuild(e.to_string()))?;

        Ok(Self {
            automaton: Some(automaton),
            meta,
        })
    }

    /// Number of phrases in the automaton
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.meta.len()
    }

    /// Whether there is nothing to scan for
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// All overlapping phrase occurrences in folded text, as
    /// `(rule_id, start, end)` in folded-space bytes
    pub fn find_all(&self, folded_text: &str) -> Vec<(u64, usize, usize)> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };
        if folded_text.is_empty() {
            return Vec::new();
        }

        automaton
            .find_overlapping_iter(folded_text)
            .map(|m| {
                let meta = &self.meta[m.pattern().as_usize()];
                (meta.rule_id, m.start(), m.end())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_overlapping_phrases_all_reported() {
        let short = keywords(&["seo"]);
        let long = keywords(&["seo audit"]);
        let set = PhraseSet::build(
            vec![(1, short.as_slice()), (2, long.as_slice())],
            FoldOptions::default(),
        )
        .unwrap();

        let mut hits = set.find_all("our seo audit guide");
        hits.sort();
        assert_eq!(hits, vec![(1, 4, 7), (2, 4, 13)]);
    }

    #[test]
    fn test_case_insensitive_via_folding() {
        let kws = keywords(&["SEO Audit"]);
        let set =
            PhraseSet::build(vec![(1, kws.as_slice())], FoldOptions::default()).unwrap();
        let hits = set.find_all("run a seo audit now");
        assert_eq!(hits, vec![(1, 6, 15)]);
    }

    #[test]
    fn test_empty_rule_set_scans_nothing() {
        let set = PhraseSet::build(std::iter::empty(), FoldOptions::default()).unwrap();
        assert!(set.is_empty());
        assert!(set.find_all("anything").is_empty());
    }

    #[test]
    fn test_blank_keywords_skipped() {
        let kws = keywords(&["  ", "real"]);
        let set =
            PhraseSet::build(vec![(1, kws.as_slice())], FoldOptions::default()).unwrap();
        assert_eq!(set.pattern_count(), 1);
    }

    #[test]
    fn test_repeated_occurrences() {
        let kws = keywords(&["seo"]);
        let set =
            PhraseSet::build(vec![(1, kws.as_slice())], FoldOptions::default()).unwrap();
        let hits = set.find_all("seo and more seo");
        assert_eq!(hits.len(), 2);
    }
}
