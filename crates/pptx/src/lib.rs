//! PPTX (Office Open XML) backend for slide deck outlines.
//!
//! [`PptxRenderer`] turns an [`Outline`](slidegen_core::Outline) into a
//! `.pptx` package using a title layout for the first slide and a
//! title-and-content layout for the rest. [`PptxReader`] recovers the
//! visible text structure of a package.

pub mod deck;
pub mod document;
pub mod error;
pub mod reader;
mod template;
pub mod writer;

pub use deck::{DeckSlide, DeckText, SlideLayout};
pub use document::{RenderedDocument, PPTX_EXTENSION, PPTX_MIME_TYPE};
pub use error::{Error, Result};
pub use reader::PptxReader;
pub use writer::PptxRenderer;
