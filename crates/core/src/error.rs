//! Error types for outline validation, outline parsing and request checks.

use thiserror::Error;

/// An outline that breaks one of the schema invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The outline has no slides at all.
    #[error("Outline contains no slides")]
    EmptyOutline,

    /// A slide has an empty or whitespace-only title.
    #[error("Slide {index} has no title")]
    MissingTitle {
        /// 0-based slide index.
        index: usize,
    },

    /// A content slide has no bullets to seed its body.
    #[error("Slide {index} has no content bullets")]
    EmptySlideContent {
        /// 0-based slide index.
        index: usize,
    },
}

/// Failure to turn outline-source text into a usable outline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text held no JSON object at all.
    #[error("No JSON object found in outline text")]
    NoJsonObject,

    /// The text looked like JSON but did not match the outline schema.
    #[error("Outline JSON is malformed: {0}")]
    Json(String),

    /// The JSON matched the schema but broke an outline invariant.
    #[error("Outline is not renderable: {0}")]
    Invalid(#[from] ValidationError),
}

/// A generation request that cannot be served as given.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The topic description is missing or blank.
    #[error("A presentation description is required")]
    BlankDescription,

    /// The requested slide count is outside the supported range.
    #[error("slide_count must be between 1 and {max}, got {requested}")]
    SlideCountOutOfRange {
        /// Count the caller asked for.
        requested: u32,
        /// Largest accepted count.
        max: u32,
    },
}
