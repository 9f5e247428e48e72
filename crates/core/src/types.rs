//! Domain types for presentation outlines and generation requests.

use crate::error::{ParseError, RequestError, ValidationError};
use serde::{Deserialize, Serialize};

/// Slide count used when a request does not ask for one.
pub const DEFAULT_SLIDE_COUNT: u32 = 6;

/// Largest slide count a request may ask for.
pub const MAX_SLIDE_COUNT: u32 = 50;

/// A presentation outline: slides in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Outline {
    /// Create an outline from slides, checking the schema invariants.
    pub fn new(slides: Vec<Slide>) -> Result<Self, ValidationError> {
        let outline = Self { slides };
        outline.validate()?;
        Ok(outline)
    }

    /// Parse outline-source text into a validated outline.
    ///
    /// Accepts a bare JSON document, or one embedded in surrounding prose or
    /// a markdown code fence, in which case the span from the first `{` to
    /// the last `}` is tried.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let trimmed = text.trim();

        let outline: Outline = match serde_json::from_str(trimmed) {
            Ok(outline) => outline,
            Err(whole_err) => {
                let span = match (trimmed.find('{'), trimmed.rfind('}')) {
                    (Some(start), Some(end)) if start < end => &trimmed[start..=end],
                    _ => return Err(ParseError::NoJsonObject),
                };
                serde_json::from_str(span).map_err(|span_err| {
                    log::debug!("Whole-text parse failed: {}", whole_err);
                    ParseError::Json(span_err.to_string())
                })?
            }
        };

        outline.validate()?;
        Ok(outline)
    }

    /// Check the outline invariants.
    ///
    /// The first slide is the title slide and may have no content; every
    /// other slide needs at least one bullet. All titles must be non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.slides.is_empty() {
            return Err(ValidationError::EmptyOutline);
        }

        for (index, slide) in self.slides.iter().enumerate() {
            if slide.title.trim().is_empty() {
                return Err(ValidationError::MissingTitle { index });
            }
            if index > 0 && slide.content.is_empty() {
                return Err(ValidationError::EmptySlideContent { index });
            }
        }

        Ok(())
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the outline has no slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// The title slide, if any.
    pub fn title_slide(&self) -> Option<&Slide> {
        self.slides.first()
    }

    /// Serialize to the wire schema, pretty-printed.
    pub fn to_json_pretty(&self) -> String {
        // Plain strings and vectors always serialize.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// One titled slide with ordered bullets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// Slide heading.
    pub title: String,

    /// Bullets in display order.
    #[serde(default)]
    pub content: Vec<String>,
}

impl Slide {
    /// Create a slide from a title and bullets.
    pub fn new<T, I, S>(title: T, content: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            content: content.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this reads as a closing slide ("Thank you", "Questions?").
    pub fn is_closing(&self) -> bool {
        let title = self.title.to_lowercase();
        title.contains("thank") || title.contains("questions")
    }
}

/// A request to generate a deck about a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Topic description, used as the deck title.
    #[serde(default)]
    pub description: String,

    /// Reference pages to draw content from.
    #[serde(default)]
    pub urls: Vec<String>,

    /// Requested number of slides.
    #[serde(default = "default_slide_count")]
    pub slide_count: u32,
}

fn default_slide_count() -> u32 {
    DEFAULT_SLIDE_COUNT
}

impl GenerateRequest {
    /// Create a request for a topic with the default slide count.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            urls: Vec::new(),
            slide_count: DEFAULT_SLIDE_COUNT,
        }
    }

    /// Add reference URLs.
    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls.extend(urls.into_iter().map(Into::into));
        self
    }

    /// Set the requested slide count.
    pub fn with_slide_count(mut self, slide_count: u32) -> Self {
        self.slide_count = slide_count;
        self
    }

    /// Check that the request can be served.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.description.trim().is_empty() {
            return Err(RequestError::BlankDescription);
        }
        if self.slide_count == 0 || self.slide_count > MAX_SLIDE_COUNT {
            return Err(RequestError::SlideCountOutOfRange {
                requested: self.slide_count,
                max: MAX_SLIDE_COUNT,
            });
        }
        Ok(())
    }

    /// The topic with surrounding whitespace removed.
    pub fn topic(&self) -> &str {
        self.description.trim()
    }
}
