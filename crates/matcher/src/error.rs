use thiserror::Error;

/// Result type for matcher operations
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors that can occur while building or running the matcher
#[derive(Error, Debug)]
pub enum MatchError {
    /// The combined phrase automaton could not be built
    #[error("Failed to build phrase automaton: {0}")]
    AutomatonBuild(String),
}
