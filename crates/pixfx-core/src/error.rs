//! Error types for filter operations.

use thiserror::Error;

/// Error type shared by every filter in the crate.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Levels parameters outside their valid domain.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A projective transform that cannot be inverted or evaluated.
    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),

    /// An external resource (pattern tile) is missing or unreadable.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The run was cancelled before completion.
    #[error("Operation cancelled")]
    Cancelled,

    /// The pixel buffer does not match its declared layout.
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    /// A settings or preset file could not be parsed.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// I/O error while reading or writing settings.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
