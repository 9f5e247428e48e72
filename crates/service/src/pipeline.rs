//! The generation pipeline: fetch references, resolve an outline, render,
//! deliver.

use crate::config::ServiceConfig;
use crate::delivery::{deliver, Delivery, DeliveryPolicy, FsObjectStore, ObjectStore};
use crate::error::{ConfigError, GenerateError, SourceError};
use crate::fetch::{fetch_all, reference_text, ContentFetcher, FetchedPage, HttpContentFetcher};
use crate::source::{
    resolve_outline, BedrockOutlineSource, OfflineOutlineSource, OutlineOrigin, OutlineRequest, OutlineSource,
};
use slidegen_core::{GenerateRequest, Outline};
use slidegen_pptx::PptxRenderer;
use std::sync::Arc;

/// Result of a successful generation.
#[derive(Debug, Clone)]
pub struct Generated {
    pub outline: Outline,
    pub origin: OutlineOrigin,
    pub pages: Vec<FetchedPage>,
    pub slide_count: usize,
    pub size_bytes: usize,
    pub delivery: Delivery,
}

/// Runs generation requests against a set of adapters.
///
/// Holds no per-request state; one instance serves any number of concurrent
/// requests.
#[derive(Clone)]
pub struct Generator {
    fetcher: Arc<dyn ContentFetcher>,
    source: Arc<dyn OutlineSource>,
    store: Option<Arc<dyn ObjectStore>>,
    policy: DeliveryPolicy,
    renderer: PptxRenderer,
}

impl Generator {
    /// A generator that delivers inline.
    pub fn new(fetcher: Arc<dyn ContentFetcher>, source: Arc<dyn OutlineSource>) -> Self {
        Self {
            fetcher,
            source,
            store: None,
            policy: DeliveryPolicy::inline(),
            renderer: PptxRenderer::new(),
        }
    }

    /// Store documents in `store` and return links under `policy`.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>, policy: DeliveryPolicy) -> Self {
        self.store = Some(store);
        self.policy = policy;
        self
    }

    /// Wire the HTTP adapters described by `config`.
    ///
    /// Without an endpoint every request uses the fallback outline; without a
    /// store directory documents are delivered inline.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, GenerateError> {
        config
            .validate()
            .map_err(|e| GenerateError::Setup(e.to_string()))?;

        let fetcher = HttpContentFetcher::new(config.fetch_timeout())
            .map_err(|e| GenerateError::Setup(e.to_string()))?;

        let source: Arc<dyn OutlineSource> = match &config.endpoint {
            Some(endpoint) => Arc::new(
                BedrockOutlineSource::new(
                    endpoint.clone(),
                    config.model_id.clone(),
                    config.api_key.clone(),
                    config.source_timeout(),
                )
                .map_err(|e: SourceError| GenerateError::Setup(e.to_string()))?,
            ),
            None => Arc::new(OfflineOutlineSource),
        };

        let mut generator = Self::new(Arc::new(fetcher), source);
        if let Some(dir) = &config.store_dir {
            let key = config
                .signing_key
                .as_deref()
                .ok_or_else(|| GenerateError::Setup(ConfigError::MissingSigningKey.to_string()))?;
            let store = FsObjectStore::new(dir.clone(), config.public_url.clone(), key);
            generator = generator.with_store(Arc::new(store), DeliveryPolicy::stored(config.link_ttl()));
        }
        Ok(generator)
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Serve one request.
    ///
    /// Fetch failures are recorded per URL and outline source failures fall
    /// back; only invalid requests, render failures and delivery failures
    /// are errors.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Generated, GenerateError> {
        request.validate()?;
        log::debug!(
            "Generating '{}' ({} slides requested, {} urls)",
            request.topic(),
            request.slide_count,
            request.urls.len()
        );

        let pages = fetch_all(self.fetcher.as_ref(), &request.urls).await;
        let outline_request = OutlineRequest::new(request, reference_text(&pages));
        let resolved = resolve_outline(self.source.as_ref(), &outline_request).await;

        let document = self.renderer.render(&resolved.outline)?;
        let slide_count = document.slide_count();
        let size_bytes = document.size();

        let delivery = deliver(document, &self.policy, self.store.as_deref()).await?;
        log::info!(
            "Generated {} ({} slides, {} bytes, {} outline)",
            delivery.filename(),
            slide_count,
            size_bytes,
            resolved.origin.label()
        );

        Ok(Generated {
            outline: resolved.outline,
            origin: resolved.origin,
            pages,
            slide_count,
            size_bytes,
            delivery,
        })
    }
}
