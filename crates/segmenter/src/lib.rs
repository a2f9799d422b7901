//! HTML-structure-aware segmentation for the linking engine.
//!
//! Parses rendered markup into a flat, ordered sequence of typed blocks
//! with byte-offset text runs into the original document, so that the
//! rewriter can reproduce every untouched byte exactly. Text inside any
//! `<a>` element is recorded as a protected span, never as a matchable
//! run; malformed markup aborts segmentation instead of producing a
//! partial result.

mod error;
mod segmenter;
mod tokenizer;
mod types;

pub use error::{Result, SegmentError};
pub use segmenter::{segment, ENGINE_MARKER_ATTR};
pub use tokenizer::{tokenize, Attribute, Token, TokenKind};
pub use types::{Block, BlockKind, Span};
