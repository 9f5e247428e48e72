//! Error types for the service adapters and the generation pipeline.

use slidegen_core::RequestError;
use thiserror::Error;

/// Failure to fetch one reference page.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL is not an absolute http(s) URL.
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    /// The request could not be sent or the body could not be read.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned status {0}")]
    Status(u16),
}

/// Failure of the outline source call.
#[derive(Error, Debug)]
pub enum SourceError {
    /// No endpoint is configured; the caller should fall back.
    #[error("Outline source is not configured")]
    NotConfigured,

    /// The request could not be sent or the body could not be read.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Outline source returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The endpoint answered, but not with a text completion.
    #[error("Malformed outline source response: {0}")]
    MalformedResponse(String),
}

/// Failure to ship a rendered document.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Storage is requested but no object store is configured.
    #[error("No object store is configured")]
    NoStore,

    /// The object key is not a plain file name.
    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    /// An object already exists under the key.
    #[error("Object '{0}' already exists")]
    KeyExists(String),

    /// Writing the object failed.
    #[error("Failed to store object: {0}")]
    Io(#[from] std::io::Error),

    /// Creating the retrieval link failed.
    #[error("Failed to sign retrieval link: {0}")]
    Signing(String),
}

/// Failure of a whole generation request.
///
/// Outline source failures never appear here: they are recovered with the
/// fallback outline.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The request itself is unusable.
    #[error("Could not understand the request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// The outline could not be rendered.
    #[error("Could not render the presentation: {0}")]
    Render(#[from] slidegen_pptx::Error),

    /// The document rendered but could not be delivered.
    #[error("Could not deliver the file: {0}")]
    Delivery(#[from] DeliveryError),

    /// An adapter could not be constructed.
    #[error("Service setup failed: {0}")]
    Setup(String),
}

/// Invalid service configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting could not be parsed.
    #[error("{var} must be a whole number of seconds, got '{value}'")]
    InvalidNumber {
        /// Environment variable name.
        var: String,
        /// Offending value.
        value: String,
    },

    /// Storage is enabled without a signing key.
    #[error("A signing key is required when an object store directory is set")]
    MissingSigningKey,
}
