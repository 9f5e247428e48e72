//! Service configuration, read from the environment or set by the CLI.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";

/// Default lifetime of a retrieval link: one day.
pub const DEFAULT_LINK_TTL_SECS: u64 = 86_400;

/// Settings for the outline source, the content fetcher and delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the inference endpoint; without one the fallback outline is used.
    pub endpoint: Option<String>,
    /// Model identifier passed to the endpoint.
    pub model_id: String,
    /// Bearer API key for the endpoint.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-URL fetch timeout.
    pub fetch_timeout_secs: u64,
    /// Outline source timeout.
    pub source_timeout_secs: u64,
    /// Directory objects are stored in; without one documents are delivered inline.
    pub store_dir: Option<PathBuf>,
    /// Public base URL the store directory is served from.
    pub public_url: String,
    /// Key used to sign retrieval links.
    #[serde(skip_serializing)]
    pub signing_key: Option<String>,
    /// Lifetime of retrieval links.
    pub link_ttl_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_key: None,
            fetch_timeout_secs: 15,
            source_timeout_secs: 60,
            store_dir: None,
            public_url: "http://localhost:8080/files".to_string(),
            signing_key: None,
            link_ttl_secs: DEFAULT_LINK_TTL_SECS,
        }
    }
}

impl ServiceConfig {
    /// Read the `SLIDEGEN_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty("SLIDEGEN_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Some(model_id) = non_empty("SLIDEGEN_MODEL_ID") {
            config.model_id = model_id;
        }
        config.api_key = non_empty("SLIDEGEN_API_KEY");
        if let Some(value) = non_empty("SLIDEGEN_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout_secs = parse_secs("SLIDEGEN_FETCH_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = non_empty("SLIDEGEN_SOURCE_TIMEOUT_SECS") {
            config.source_timeout_secs = parse_secs("SLIDEGEN_SOURCE_TIMEOUT_SECS", &value)?;
        }
        config.store_dir = non_empty("SLIDEGEN_STORE_DIR").map(PathBuf::from);
        if let Some(public_url) = non_empty("SLIDEGEN_PUBLIC_URL") {
            config.public_url = public_url;
        }
        config.signing_key = non_empty("SLIDEGEN_SIGNING_KEY");
        if let Some(value) = non_empty("SLIDEGEN_LINK_TTL_SECS") {
            config.link_ttl_secs = parse_secs("SLIDEGEN_LINK_TTL_SECS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings that depend on each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_key = self
            .signing_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if self.store_dir.is_some() && !has_key {
            return Err(ConfigError::MissingSigningKey);
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn link_ttl(&self) -> Duration {
        Duration::from_secs(self.link_ttl_secs)
    }

    /// Log the loaded settings, secrets excluded.
    pub fn log_loaded(&self) {
        log::info!(
            "Loaded config: endpoint={}, model={}, store={}",
            self.endpoint.as_deref().unwrap_or("<none, fallback only>"),
            self.model_id,
            self.store_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "<none, inline delivery>".to_string()),
        );
        log::debug!("Config loaded (full): {:?}", self.redacted());
    }

    fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "***".to_string()),
            signing_key: self.signing_key.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}

fn parse_secs(var: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var: var.to_string(),
        value: value.to_string(),
    })
}
