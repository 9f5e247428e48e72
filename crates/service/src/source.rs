//! Outline generation through a text-completion endpoint, with the fallback
//! outline as the recovery path.

use crate::error::SourceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use slidegen_core::{fallback_outline, GenerateRequest, Outline};
use std::time::Duration;

pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const MAX_TOKENS: u32 = 2000;
pub const TEMPERATURE: f64 = 0.7;

/// What the outline source is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRequest {
    pub topic: String,
    pub reference_text: String,
    pub slide_count: u32,
}

impl OutlineRequest {
    pub fn new(request: &GenerateRequest, reference_text: impl Into<String>) -> Self {
        Self {
            topic: request.topic().to_string(),
            reference_text: reference_text.into(),
            slide_count: request.slide_count,
        }
    }
}

/// Produces raw outline text for a request. The text is untrusted.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait OutlineSource: Send + Sync {
    async fn generate(&self, request: &OutlineRequest) -> Result<String, SourceError>;
}

/// Build the completion prompt for a request.
pub fn build_prompt(request: &OutlineRequest) -> String {
    let content_slides = request.slide_count.saturating_sub(2);
    let reference = if request.reference_text.trim().is_empty() {
        "(no reference content provided)"
    } else {
        request.reference_text.as_str()
    };
    let example = json!({
        "slides": [
            {"title": request.topic, "content": ["Presentation Overview", "Key Topics Covered", "Main Objectives"]},
            {"title": "Content Slide", "content": ["Bullet point 1", "Bullet point 2", "Bullet point 3"]},
            {"title": "Thank You!", "content": ["Questions?", "Contact Information", "Thank you for your attention"]}
        ]
    });

    format!(
        "Create a {count}-slide PowerPoint presentation about: {topic}\n\n\
         Based on this content:\n{reference}\n\n\
         Return ONLY valid JSON in this exact format:\n{example}\n\n\
         First slide: Title slide with presentation overview\n\
         Middle {content_slides} slides: Content based on the provided information\n\
         Last slide: Thank you slide\n\
         Make sure each content slide has 3-4 bullet points.",
        count = request.slide_count,
        topic = request.topic,
    )
}

/// Anthropic-messages completion through a Bedrock-style `invoke` endpoint.
pub struct BedrockOutlineSource {
    client: reqwest::Client,
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
}

impl BedrockOutlineSource {
    pub fn new(
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model_id: model_id.into(),
            api_key,
        })
    }

    /// The `invoke` URL for the configured model.
    pub fn invoke_url(&self) -> String {
        format!(
            "{}/model/{}/invoke",
            self.endpoint.trim_end_matches('/'),
            self.model_id.replace(':', "%3A")
        )
    }
}

#[derive(Debug, Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl OutlineSource for BedrockOutlineSource {
    async fn generate(&self, request: &OutlineRequest) -> Result<String, SourceError> {
        let prompt = build_prompt(request);
        let body = InvokeBody {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: &prompt,
            }],
        };

        let url = self.invoke_url();
        log::debug!("Invoking outline model at {}", url);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: InvokeResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;
        extract_text(parsed)
    }
}

fn extract_text(response: InvokeResponse) -> Result<String, SourceError> {
    response
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| SourceError::MalformedResponse("no text in first content block".to_string()))
}

/// Source used when no endpoint is configured. Always falls back.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineOutlineSource;

#[async_trait]
impl OutlineSource for OfflineOutlineSource {
    async fn generate(&self, _request: &OutlineRequest) -> Result<String, SourceError> {
        Err(SourceError::NotConfigured)
    }
}

/// Where the outline that got rendered came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum OutlineOrigin {
    /// Parsed from the source's text.
    Generated,
    /// Built by the fallback policy.
    Fallback { reason: String },
}

impl OutlineOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            OutlineOrigin::Generated => "generated",
            OutlineOrigin::Fallback { .. } => "fallback",
        }
    }
}

/// A usable outline and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutline {
    pub outline: Outline,
    pub origin: OutlineOrigin,
}

/// Ask the source for an outline and recover with the fallback outline when
/// the call fails or its text is not a valid outline.
///
/// The returned outline always passes validation.
pub async fn resolve_outline(source: &dyn OutlineSource, request: &OutlineRequest) -> ResolvedOutline {
    let reason = match source.generate(request).await {
        Ok(text) => match Outline::parse(&text) {
            Ok(outline) => {
                log::debug!("Outline source returned {} slides", outline.len());
                return ResolvedOutline {
                    outline,
                    origin: OutlineOrigin::Generated,
                };
            }
            Err(e) => format!("unusable outline text: {}", e),
        },
        Err(e) => e.to_string(),
    };

    log::warn!("Using fallback outline for '{}': {}", request.topic, reason);
    ResolvedOutline {
        outline: fallback_outline(&request.topic, request.slide_count),
        origin: OutlineOrigin::Fallback { reason },
    }
}
