use crate::error::{Result, SegmentError};
use crate::tokenizer::{tokenize, Token, TokenKind};
use crate::types::{Block, BlockKind, Span};

/// Attribute marking an anchor as engine-inserted. Its presence is what
/// lets a second pass treat inserted links as protected spans, which is
/// the idempotence guarantee.
pub const ENGINE_MARKER_ATTR: &str = "data-autolink";

/// Elements that never take a matching end tag
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Inline elements whose text flows into the enclosing block
const INLINE_ELEMENTS: [&str; 25] = [
    "a", "abbr", "b", "bdi", "bdo", "cite", "data", "del", "dfn", "em", "i", "ins", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Elements whose entire content is opaque: present in the output
/// byte-for-byte but never matchable
const OPAQUE_ELEMENTS: [&str; 7] = ["code", "pre", "textarea", "svg", "math", "iframe", "noscript"];

/// Elements closed implicitly when a close tag for an ancestor arrives,
/// mirroring how browsers recover from omitted `</p>` / `</li>`
const IMPLICITLY_CLOSABLE: [&str; 4] = ["p", "li", "dd", "dt"];

/// Segment rendered markup into an ordered sequence of typed blocks.
///
/// Every text run and protected span is a byte range into `markup`;
/// nothing is copied or re-serialized. Any structural error aborts the
/// whole segmentation so the caller can fail closed.
pub fn segment(markup: &str) -> Result<Vec<Block>> {
    let tokens = tokenize(markup)?;
    Segmenter::default().run(&tokens)
}

struct OpenElement {
    name: String,
    opened_block: bool,
    opaque: bool,
    anchor: bool,
}

#[derive(Default)]
struct Segmenter {
    blocks: Vec<Block>,
    stack: Vec<OpenElement>,
    block_stack: Vec<usize>,
    opaque_depth: usize,
    anchor_depth: usize,
}

impl Segmenter {
    fn run(mut self, tokens: &[Token]) -> Result<Vec<Block>> {
        for token in tokens {
            match &token.kind {
                TokenKind::StartTag {
                    name, self_closing, ..
                } => {
                    if *self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                        continue;
                    }
                    self.open_element(name, token);
                }
                TokenKind::EndTag { name } => {
                    self.close_element(name, token.start)?;
                }
                TokenKind::Text => {
                    self.text(Span::new(token.start, token.end));
                }
                TokenKind::RawText | TokenKind::Comment | TokenKind::Declaration => {}
            }
        }

        while let Some(top) = self.stack.last() {
            if IMPLICITLY_CLOSABLE.contains(&top.name.as_str()) {
                self.pop_element();
            } else {
                return Err(SegmentError::UnclosedElement {
                    name: top.name.clone(),
                });
            }
        }

        Ok(self.blocks)
    }

    fn open_element(&mut self, name: &str, token: &Token) {
        let opaque = OPAQUE_ELEMENTS.contains(&name);
        let anchor = name == "a";

        let mut opened_block = false;
        if self.opaque_depth == 0 && !self.inside_widget() {
            if let Some(kind) = block_kind_for(name) {
                self.push_block(kind);
                opened_block = true;
            } else if self.block_stack.is_empty()
                && !INLINE_ELEMENTS.contains(&name)
                && token.has_class("widget")
            {
                self.push_block(BlockKind::Widget);
                opened_block = true;
            }
        }

        self.stack.push(OpenElement {
            name: name.to_string(),
            opened_block,
            opaque,
            anchor,
        });
        if opaque {
            self.opaque_depth += 1;
        }
        if anchor {
            self.anchor_depth += 1;
        }
    }

    fn close_element(&mut self, name: &str, at: usize) -> Result<()> {
        loop {
            let Some(top) = self.stack.last() else {
                return Err(SegmentError::StrayCloseTag {
                    found: name.to_string(),
                    at,
                });
            };
            if top.name == name {
                self.pop_element();
                return Ok(());
            }
            if IMPLICITLY_CLOSABLE.contains(&top.name.as_str()) {
                self.pop_element();
                continue;
            }
            return Err(SegmentError::MismatchedCloseTag {
                expected: top.name.clone(),
                found: name.to_string(),
                at,
            });
        }
    }

    fn pop_element(&mut self) {
        if let Some(top) = self.stack.pop() {
            if top.opaque {
                self.opaque_depth -= 1;
            }
            if top.anchor {
                self.anchor_depth -= 1;
            }
            if top.opened_block {
                self.block_stack.pop();
            }
        }
    }

    fn text(&mut self, span: Span) {
        if self.opaque_depth > 0 {
            return;
        }
        let Some(&block_index) = self.block_stack.last() else {
            return;
        };
        if self.anchor_depth > 0 {
            self.blocks[block_index].protected.push(span);
        } else {
            self.blocks[block_index].runs.push(span);
        }
    }

    fn push_block(&mut self, kind: BlockKind) {
        let id = self.blocks.len();
        self.blocks.push(Block::new(id, kind));
        self.block_stack.push(id);
    }

    fn inside_widget(&self) -> bool {
        self.block_stack
            .last()
            .map(|&i| self.blocks[i].kind == BlockKind::Widget)
            .unwrap_or(false)
    }
}

fn block_kind_for(name: &str) -> Option<BlockKind> {
    match name {
        "p" => Some(BlockKind::Paragraph),
        "h1" => Some(BlockKind::Heading(1)),
        "h2" => Some(BlockKind::Heading(2)),
        "h3" => Some(BlockKind::Heading(3)),
        "h4" => Some(BlockKind::Heading(4)),
        "h5" => Some(BlockKind::Heading(5)),
        "h6" => Some(BlockKind::Heading(6)),
        "li" => Some(BlockKind::ListItem),
        "figcaption" | "caption" => Some(BlockKind::Caption),
        _ => None,
    }
}
