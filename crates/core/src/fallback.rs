//! Template outline used when the outline source fails.
//!
//! Built purely from the topic and requested slide count, so it never
//! depends on any external call and always satisfies the outline invariants.

use crate::types::{Outline, Slide};

/// Title used when the topic is blank.
const UNTITLED: &str = "Presentation";

const OPENING_BULLETS: [&str; 3] = [
    "Presentation Overview",
    "Key Topics Covered",
    "Main Objectives",
];

const CLOSING_TITLE: &str = "Thank You!";

const CLOSING_BULLETS: [&str; 3] = [
    "Questions?",
    "Contact Information",
    "Thank you for your attention",
];

/// Templated content slides, cycled when more are needed.
const BODY_TEMPLATES: &[(&str, [&str; 3])] = &[
    (
        "Key Features",
        ["Core capabilities", "What sets it apart", "How the pieces fit"],
    ),
    (
        "Use Cases",
        ["Common scenarios", "Who benefits", "Typical workflows"],
    ),
    (
        "Benefits",
        ["Time saved", "Lower operating cost", "Better outcomes"],
    ),
    (
        "Getting Started",
        ["Prerequisites", "First steps", "Where to learn more"],
    ),
    (
        "Best Practices",
        ["Start small", "Measure results", "Iterate with feedback"],
    ),
    (
        "Next Steps",
        ["Pilot a project", "Gather stakeholders", "Plan the rollout"],
    ),
];

/// Build the fallback outline for a topic.
///
/// The deck always has an opening slide titled with the topic, at least one
/// templated content slide and a closing thank-you slide, so counts below 3
/// are raised to 3.
pub fn fallback_outline(topic: &str, slide_count: u32) -> Outline {
    let topic = topic.trim();
    let title = if topic.is_empty() { UNTITLED } else { topic };

    let body_count = slide_count.max(3) as usize - 2;
    let mut slides = Vec::with_capacity(body_count + 2);

    slides.push(Slide::new(title, OPENING_BULLETS));

    for i in 0..body_count {
        let (name, bullets) = BODY_TEMPLATES[i % BODY_TEMPLATES.len()];
        let round = i / BODY_TEMPLATES.len();
        let slide_title = if round == 0 {
            name.to_string()
        } else {
            format!("{} ({})", name, round + 1)
        };
        slides.push(Slide::new(slide_title, bullets));
    }

    slides.push(Slide::new(CLOSING_TITLE, CLOSING_BULLETS));

    Outline { slides }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_count() {
        let outline = fallback_outline("Amazon Bedrock", 6);
        assert_eq!(outline.len(), 6);
        assert_eq!(outline.slides[0].title, "Amazon Bedrock");
        assert_eq!(outline.slides[1].title, "Key Features");
        assert_eq!(outline.slides[4].title, "Getting Started");
        assert!(outline.slides[5].is_closing());
        assert!(outline.validate().is_ok());
    }

    #[test]
    fn test_small_counts_raised_to_three() {
        for count in [0, 1, 2, 3] {
            let outline = fallback_outline("Topic", count);
            assert_eq!(outline.len(), 3, "count {}", count);
            assert!(outline.validate().is_ok());
        }
    }

    #[test]
    fn test_templates_cycle_with_numbering() {
        let outline = fallback_outline("Topic", 2 + BODY_TEMPLATES.len() as u32 + 1);
        let last_body = &outline.slides[outline.len() - 2];
        assert_eq!(last_body.title, "Key Features (2)");
        assert!(outline.validate().is_ok());
    }

    #[test]
    fn test_blank_topic() {
        let outline = fallback_outline("   ", 4);
        assert_eq!(outline.slides[0].title, UNTITLED);
    }

    #[test]
    fn test_topic_trimmed() {
        let outline = fallback_outline("  Rust  \n", 3);
        assert_eq!(outline.slides[0].title, "Rust");
    }
}
