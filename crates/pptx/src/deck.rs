//! Visible text structure recovered from a presentation package.

use serde::{Deserialize, Serialize};
use slidegen_core::{Outline, Slide};

/// Which slide layout a slide was built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideLayout {
    /// Centered title with a subtitle block.
    Title,
    /// Title with a bulleted body.
    TitleAndContent,
}

/// Text of one slide, as a viewer would see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Layout detected from the placeholder types.
    pub layout: SlideLayout,

    /// Heading text.
    pub title: String,

    /// Body (or subtitle) paragraphs in order.
    pub paragraphs: Vec<String>,
}

impl DeckSlide {
    /// The subtitle block of a title slide: paragraphs joined by newlines.
    pub fn subtitle(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// Visible text of a whole presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckText {
    /// Slides in presentation order.
    pub slides: Vec<DeckSlide>,
}

impl DeckText {
    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Rebuild an outline from the visible text.
    ///
    /// Subtitle lines of a title slide come back as separate bullets, and an
    /// empty subtitle comes back as no bullets.
    pub fn to_outline(&self) -> Outline {
        let slides = self
            .slides
            .iter()
            .map(|slide| {
                let content: Vec<String> = match slide.layout {
                    SlideLayout::Title if slide.subtitle().is_empty() => Vec::new(),
                    SlideLayout::Title => slide
                        .subtitle()
                        .split('\n')
                        .map(str::to_string)
                        .collect(),
                    SlideLayout::TitleAndContent => slide.paragraphs.clone(),
                };
                Slide {
                    title: slide.title.clone(),
                    content,
                }
            })
            .collect();

        Outline { slides }
    }
}
