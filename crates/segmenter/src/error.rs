use thiserror::Error;

/// Result type for segmentation operations
pub type Result<T> = std::result::Result<T, SegmentError>;

/// Errors raised by the tokenizer and segmenter.
///
/// Any of these means the document is returned unchanged by the caller;
/// partial rewriting of malformed markup is never attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// A tag was still open when the input ended
    #[error("Unterminated tag starting at byte {start}")]
    UnterminatedTag { start: usize },

    /// A comment was not closed before the input ended
    #[error("Unterminated comment starting at byte {start}")]
    UnterminatedComment { start: usize },

    /// A quoted attribute value was not closed
    #[error("Unterminated attribute value in tag starting at byte {start}")]
    UnterminatedAttribute { start: usize },

    /// Raw-text element content (script/style) never ended
    #[error("Unterminated <{name}> content starting at byte {start}")]
    UnterminatedRawText { name: String, start: usize },

    /// A close tag did not match any open element
    #[error("Close tag </{found}> at byte {at} does not match open <{expected}>")]
    MismatchedCloseTag {
        expected: String,
        found: String,
        at: usize,
    },

    /// A close tag appeared with nothing open
    #[error("Close tag </{found}> at byte {at} with no open element")]
    StrayCloseTag { found: String, at: usize },

    /// Elements were still open at the end of the document
    #[error("Unclosed <{name}> at end of document")]
    UnclosedElement { name: String },
}
