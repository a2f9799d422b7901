use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while loading or validating rule data
#[derive(Error, Debug)]
pub enum ModelError {
    /// The rule repository could not produce a snapshot
    #[error("Repository error: {0}")]
    Repository(String),

    /// Snapshot data failed to deserialize
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl ModelError {
    /// Create a repository error
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
