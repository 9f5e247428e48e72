//! Core domain types for slide deck generation: the outline schema and its
//! invariants, the fallback outline policy, reference-text extraction,
//! chat-prompt parsing and the plain-text slide preview.

pub mod chat;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod preview;
pub mod types;

pub use chat::{ChatRequest, Conversation, Role, Turn};
pub use error::{ParseError, RequestError, ValidationError};
pub use extract::{html_to_text, TextExtractor, MAX_REFERENCE_CHARS};
pub use fallback::fallback_outline;
pub use preview::PreviewFormatter;
pub use types::{GenerateRequest, Outline, Slide, DEFAULT_SLIDE_COUNT, MAX_SLIDE_COUNT};
