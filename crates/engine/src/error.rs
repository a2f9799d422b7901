use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can surface from the rendering pipeline.
///
/// All of these are recoverable from the caller's perspective: the
/// render façade reacts by returning the input document unchanged.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file failed to parse
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The document could not be segmented (malformed markup)
    #[error("Segmentation failed: {0}")]
    Segment(#[from] autolink_segmenter::SegmentError),

    /// The phrase automaton could not be built
    #[error("Matcher failed: {0}")]
    Match(#[from] autolink_matcher::MatchError),

    /// The rule repository failed
    #[error("Model error: {0}")]
    Model(#[from] autolink_model::ModelError),
}

impl EngineError {
    /// Create an invalid-config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
