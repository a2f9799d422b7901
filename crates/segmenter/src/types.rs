use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the original markup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether two spans share at least one byte
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely within this span
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Structural type of a content block
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    /// Heading with its level (1..=6)
    Heading(u8),
    ListItem,
    Caption,
    /// A widget region, detected via a `widget` class token
    Widget,
}

impl BlockKind {
    /// Human-readable name, used in diagnostics and preview reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading(_) => "heading",
            Self::ListItem => "list-item",
            Self::Caption => "caption",
            Self::Widget => "widget",
        }
    }
}

/// One segmented block: a typed structural unit with ordered text runs
/// and protected (already-linked) spans, all as offsets into the
/// original markup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    /// Position of this block in the document's block sequence
    pub id: usize,

    pub kind: BlockKind,

    /// Matchable text ranges, in document order. Text inside anchors,
    /// code, or opaque elements never appears here.
    pub runs: Vec<Span>,

    /// Byte ranges covered by existing `<a>` content (pre-existing or
    /// carrying the engine marker); never matched or rewritten
    pub protected: Vec<Span>,
}

impl Block {
    #[must_use]
    pub fn new(id: usize, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            runs: Vec::new(),
            protected: Vec::new(),
        }
    }

    /// Whether the block carries any matchable text at all
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.runs.iter().any(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_overlap() {
        let a = Span::new(0, 5);
        let b = Span::new(4, 8);
        let c = Span::new(5, 8);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(2, 10);
        assert!(outer.contains(&Span::new(2, 10)));
        assert!(outer.contains(&Span::new(4, 6)));
        assert!(!outer.contains(&Span::new(1, 6)));
    }

    #[test]
    fn test_block_has_text() {
        let mut block = Block::new(0, BlockKind::Paragraph);
        assert!(!block.has_text());
        block.runs.push(Span::new(3, 3));
        assert!(!block.has_text());
        block.runs.push(Span::new(3, 9));
        assert!(block.has_text());
    }
}
