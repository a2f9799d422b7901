use autolink_segmenter::Span;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Engine-wide normalization settings, applied identically to the
/// corpus and to every keyword phrase before scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldOptions {
    /// Strip diacritics so "café" matches "cafe"
    pub fold_diacritics: bool,
}

/// A case/diacritic-folded text run carrying a byte-offset map back
/// into the original markup.
///
/// Folding is not length-preserving (multi-byte accented characters
/// fold to single ASCII bytes), so every folded byte remembers which
/// original character produced it; match spans found in folded space
/// are translated back through that map.
#[derive(Debug, Clone)]
pub struct FoldedRun {
    text: String,
    /// For each folded byte: the original byte offset of the source
    /// character it came from
    offsets: Vec<usize>,
    /// One past the last original byte of the run
    source_end: usize,
    /// Word-boundary positions in folded space
    bounds: HashSet<usize>,
}

impl FoldedRun {
    /// Fold one text run. `source_start` is the run's absolute byte
    /// offset in the original markup.
    #[must_use]
    pub fn fold(source: &str, source_start: usize, opts: FoldOptions) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut offsets = Vec::with_capacity(source.len());

        for (i, ch) in source.char_indices() {
            if opts.fold_diacritics && is_combining_mark(ch) {
                continue;
            }
            for lower in ch.to_lowercase() {
                let folded = if opts.fold_diacritics {
                    strip_diacritic(lower)
                } else {
                    lower
                };
                let before = text.len();
                text.push(folded);
                for _ in before..text.len() {
                    offsets.push(source_start + i);
                }
            }
        }

        let mut bounds: HashSet<usize> =
            text.split_word_bound_indices().map(|(i, _)| i).collect();
        bounds.insert(text.len());

        Self {
            text,
            offsets,
            source_end: source_start + source.len(),
            bounds,
        }
    }

    /// The folded text to scan
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether folded position `i` sits on a word boundary
    #[must_use]
    pub fn is_word_bound(&self, i: usize) -> bool {
        self.bounds.contains(&i)
    }

    /// Translate a folded match span back to original markup bytes.
    ///
    /// Returns `None` when a span edge falls inside the fold expansion
    /// of a single source character (e.g. a pattern ending halfway
    /// through the "ss" that "ß" lowercases to).
    #[must_use]
    pub fn original_span(&self, start: usize, end: usize) -> Option<Span> {
        if start >= end || end > self.offsets.len() {
            return None;
        }
        if start > 0 && self.offsets[start] == self.offsets[start - 1] {
            return None;
        }
        let orig_start = self.offsets[start];
        let orig_end = if end == self.offsets.len() {
            self.source_end
        } else {
            if self.offsets[end] == self.offsets[end - 1] {
                return None;
            }
            self.offsets[end]
        };
        Some(Span::new(orig_start, orig_end))
    }
}

/// Fold a keyword phrase with the same rules as the corpus
#[must_use]
pub fn fold_phrase(phrase: &str, opts: FoldOptions) -> String {
    let mut out = String::with_capacity(phrase.len());
    for ch in phrase.chars() {
        if opts.fold_diacritics && is_combining_mark(ch) {
            continue;
        }
        for lower in ch.to_lowercase() {
            out.push(if opts.fold_diacritics {
                strip_diacritic(lower)
            } else {
                lower
            });
        }
    }
    out
}

const fn is_combining_mark(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{036f}')
}

/// Map common accented Latin lowercase letters to their base letter
fn strip_diacritic(ch: char) -> char {
    match ch {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => ch,
    }
}
