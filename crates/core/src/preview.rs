//! Plain-text slide preview.
//!
//! Renders an outline as a numbered list of bold titles with bullets beneath,
//! the way the chat surface shows a deck before it is downloaded.

use crate::types::Outline;

/// Formatter for outline previews.
#[derive(Debug, Clone)]
pub struct PreviewFormatter {
    /// Marker placed before each bullet.
    bullet: String,
}

impl Default for PreviewFormatter {
    fn default() -> Self {
        Self {
            bullet: "•".to_string(),
        }
    }
}

impl PreviewFormatter {
    /// Create a formatter using `•` bullets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom bullet marker.
    pub fn with_bullet(mut self, bullet: impl Into<String>) -> Self {
        self.bullet = bullet.into();
        self
    }

    /// Format an outline, one block per slide, separated by blank lines.
    ///
    /// # Example output
    /// ```text
    /// **1. Amazon Bedrock**
    /// • Presentation Overview
    ///
    /// **2. Key Features**
    /// • Multiple AI models
    /// ```
    pub fn format(&self, outline: &Outline) -> String {
        outline
            .slides
            .iter()
            .enumerate()
            .map(|(i, slide)| {
                let mut block = format!("**{}. {}**", i + 1, slide.title);
                for bullet in &slide.content {
                    block.push('\n');
                    block.push_str(&self.bullet);
                    block.push(' ');
                    block.push_str(bullet);
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
