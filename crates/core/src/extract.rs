//! Plain-text extraction from fetched HTML pages.
//!
//! Strips scripts, styles, comments and tags, decodes the handful of
//! entities that show up in body text, collapses whitespace and caps the
//! result so reference text stays within the outline prompt budget.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Default cap on extracted characters per page.
pub const MAX_REFERENCE_CHARS: usize = 2000;

static SCRIPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script\s*>").unwrap());

static STYLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style\s*>").unwrap());

static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Regex to collapse any whitespace run, newlines included, into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Entities decoded after tag removal. `&amp;` goes last so that
/// `&amp;lt;` decodes to `&lt;` rather than `<`.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Extractor turning an HTML page into bounded plain text.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    /// Maximum number of characters kept.
    max_chars: usize,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self {
            max_chars: MAX_REFERENCE_CHARS,
        }
    }
}

impl TextExtractor {
    /// Create an extractor with the default character cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character cap.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Extract plain text from an HTML document.
    pub fn extract(&self, html: &str) -> String {
        let text = SCRIPT_REGEX.replace_all(html, " ");
        let text = STYLE_REGEX.replace_all(&text, " ");
        let text = COMMENT_REGEX.replace_all(&text, " ");
        let text = TAG_REGEX.replace_all(&text, " ");

        let mut text = text.into_owned();
        for (entity, replacement) in ENTITIES {
            if text.contains(entity) {
                text = text.replace(entity, replacement);
            }
        }

        let text: String = text.nfc().collect();
        let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&text, " ");
        let trimmed = collapsed.trim();

        // Cut on a char boundary, then drop any space the cut left behind.
        let truncated: String = trimmed.chars().take(self.max_chars).collect();
        truncated.trim_end().to_string()
    }
}

/// Extract plain text from HTML with the default character cap.
pub fn html_to_text(html: &str) -> String {
    TextExtractor::new().extract(html)
}
