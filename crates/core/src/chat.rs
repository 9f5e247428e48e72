//! Chat-prompt parsing and the caller-held conversation log.

use crate::types::{GenerateRequest, DEFAULT_SLIDE_COUNT};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").unwrap());

static SLIDE_COUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*slides?").unwrap());

/// A generation request recovered from a free-form chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// First line of the message.
    pub topic: String,
    /// Reference URLs found in the message.
    pub urls: Vec<String>,
    /// Slide count mentioned as "N slides", or the default.
    pub slide_count: u32,
}

impl ChatRequest {
    /// Parse a chat message such as
    /// `"Create a 5 slide deck about AI trends\nhttps://example.com"`.
    ///
    /// URLs on their own lines after the first take precedence; when there
    /// are none, every URL anywhere in the message is used.
    pub fn parse(prompt: &str) -> Self {
        let mut lines = prompt.lines();
        let topic = lines.next().unwrap_or_default().trim().to_string();

        let mut urls: Vec<String> = lines
            .map(str::trim)
            .filter(|line| line.starts_with("http"))
            .map(str::to_string)
            .collect();

        if urls.is_empty() {
            urls = URL_REGEX
                .find_iter(prompt)
                .map(|m| m.as_str().to_string())
                .collect();
        }

        let slide_count = SLIDE_COUNT_REGEX
            .captures(prompt)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(DEFAULT_SLIDE_COUNT);

        Self {
            topic,
            urls,
            slide_count,
        }
    }

    /// Convert into a generation request.
    pub fn into_request(self) -> GenerateRequest {
        GenerateRequest {
            description: self.topic,
            urls: self.urls,
            slide_count: self.slide_count,
        }
    }
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered log of chat turns, owned by the caller and passed to handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    /// Append an assistant reply.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    /// Turns in the order they were added.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent user message.
    pub fn last_user_message(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
