//! Error types for rendering and reading PPTX packages.

use slidegen_core::ValidationError;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering or reading a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// The outline breaks a schema invariant and cannot be rendered.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// The package is missing a part or is otherwise corrupted.
    #[error("Invalid or corrupted file: {0}")]
    Corrupted(String),
}

impl Error {
    /// The outline invariant that was broken, if this is a validation error.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Invalid(e) => Some(e),
            _ => None,
        }
    }
}
