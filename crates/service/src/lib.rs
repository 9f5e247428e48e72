//! Deck generation service: reference fetching, outline generation with a
//! fallback, PPTX rendering, delivery and the `POST /generate-ppt` handler.

pub mod chat;
pub mod config;
pub mod delivery;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod pipeline;
pub mod source;

pub use config::ServiceConfig;
pub use delivery::{
    deliver, generate_key, Delivery, DeliveryMode, DeliveryPolicy, FsObjectStore, ObjectStore, SignedUrl,
};
pub use error::{ConfigError, DeliveryError, FetchError, GenerateError, SourceError};
pub use fetch::{fetch_all, reference_text, ContentFetcher, FetchedPage, HttpContentFetcher};
pub use handler::{handle, HandlerResponse, GENERATE_PATH};
pub use pipeline::{Generated, Generator};
pub use source::{
    build_prompt, resolve_outline, BedrockOutlineSource, OfflineOutlineSource, OutlineOrigin, OutlineRequest,
    OutlineSource, ResolvedOutline,
};

#[cfg(any(test, feature = "test-export-mocks"))]
pub use delivery::MockObjectStore;
#[cfg(any(test, feature = "test-export-mocks"))]
pub use fetch::MockContentFetcher;
#[cfg(any(test, feature = "test-export-mocks"))]
pub use source::MockOutlineSource;
