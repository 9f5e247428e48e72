//! Chat-style front end over the generator.
//!
//! The caller owns the [`Conversation`]; each prompt appends a user turn and
//! an assistant turn, whether or not generation succeeds.

use crate::error::GenerateError;
use crate::pipeline::{Generated, Generator};
use slidegen_core::{ChatRequest, Conversation, PreviewFormatter};

/// Generate a deck from a free-text prompt and record the exchange.
pub async fn reply(
    generator: &Generator,
    conversation: &mut Conversation,
    prompt: &str,
) -> Result<Generated, GenerateError> {
    conversation.push_user(prompt);
    let request = ChatRequest::parse(prompt).into_request();

    match generator.generate(&request).await {
        Ok(generated) => {
            conversation.push_assistant(summary(&generated));
            Ok(generated)
        }
        Err(e) => {
            conversation.push_assistant(format!("Sorry, something went wrong. {}", e));
            Err(e)
        }
    }
}

/// Assistant message for a finished deck: headline, link and slide preview.
pub fn summary(generated: &Generated) -> String {
    let mut message = format!(
        "Created a {}-slide presentation ({}, {} bytes).",
        generated.slide_count,
        generated.delivery.filename(),
        generated.size_bytes
    );
    if let Some(url) = generated.delivery.url() {
        message.push_str(&format!("\nDownload: {}", url));
    }
    let failed = generated.pages.iter().filter(|page| !page.is_ok()).count();
    if failed > 0 {
        message.push_str(&format!("\n{} reference page(s) could not be read.", failed));
    }
    message.push_str("\n\n");
    message.push_str(&PreviewFormatter::new().format(&generated.outline));
    message
}
