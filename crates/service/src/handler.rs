//! The `POST /generate-ppt` request handler.
//!
//! Transport-agnostic: a host (function runtime, HTTP server, CLI) passes the
//! method, path and raw body and writes back the status, headers and JSON.

use crate::delivery::Delivery;
use crate::error::GenerateError;
use crate::pipeline::{Generated, Generator};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use slidegen_core::GenerateRequest;
use slidegen_pptx::PPTX_EXTENSION;

pub const GENERATE_PATH: &str = "/generate-ppt";

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Status, headers and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// `Value::Null` for bodiless responses.
    pub body: Value,
}

impl HandlerResponse {
    fn new(status: u16, body: Value) -> Self {
        let mut headers: Vec<(String, String)> = CORS_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if !body.is_null() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        Self { status, headers, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": message.into() }))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handle one request.
pub async fn handle(generator: &Generator, method: &str, path: &str, body: &str) -> HandlerResponse {
    if route(path) != GENERATE_PATH {
        return HandlerResponse::error(404, format!("No route for {}", path));
    }

    match method.to_ascii_uppercase().as_str() {
        "OPTIONS" => HandlerResponse::new(204, Value::Null),
        "POST" => generate(generator, body).await,
        other => HandlerResponse::error(405, format!("Method {} not allowed", other)),
    }
}

async fn generate(generator: &Generator, body: &str) -> HandlerResponse {
    let request: GenerateRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("Rejecting malformed request body: {}", e);
            return HandlerResponse::error(400, format!("Could not understand the request: {}", e));
        }
    };

    match generator.generate(&request).await {
        Ok(generated) => HandlerResponse::new(200, success_body(&generated)),
        Err(e) => error_response(&e),
    }
}

fn success_body(generated: &Generated) -> Value {
    let slides = json!({ "slides": generated.outline.slides });
    let mut pptx_info = json!({
        "filename": generated.delivery.filename(),
        "size_bytes": generated.size_bytes,
        "slide_count": generated.slide_count,
        "format": PPTX_EXTENSION,
    });

    let mut body = match &generated.delivery {
        Delivery::Stored { url, expires_at, .. } => {
            pptx_info["expires_at"] = json!(expires_at);
            json!({
                "message": "PowerPoint created and uploaded successfully",
                "download_url": url,
            })
        }
        Delivery::Inline { bytes, content_type, .. } => {
            pptx_info["content_type"] = json!(content_type);
            pptx_info["encoding"] = json!("base64");
            json!({
                "message": "PowerPoint created successfully",
                "file": BASE64_STANDARD.encode(bytes),
            })
        }
    };

    body["slides"] = slides;
    body["pptx_info"] = pptx_info;
    body["outline_origin"] = json!(generated.origin.label());
    body["sources"] = json!(generated.pages);
    body
}

fn error_response(error: &GenerateError) -> HandlerResponse {
    match error {
        GenerateError::InvalidRequest(_) => HandlerResponse::error(400, error.to_string()),
        GenerateError::Render(_) => {
            log::error!("{}", error);
            HandlerResponse::new(500, json!({ "error": error.to_string(), "kind": "render" }))
        }
        GenerateError::Setup(_) => {
            log::error!("{}", error);
            HandlerResponse::new(500, json!({ "error": error.to_string(), "kind": "setup" }))
        }
        GenerateError::Delivery(_) => {
            log::error!("{}", error);
            HandlerResponse::new(502, json!({ "error": error.to_string(), "kind": "delivery" }))
        }
    }
}

/// Path without query string or trailing slash.
fn route(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{DeliveryPolicy, FsObjectStore};
    use crate::error::SourceError;
    use crate::fetch::MockContentFetcher;
    use crate::source::{MockOutlineSource, OfflineOutlineSource};
    use std::sync::Arc;
    use std::time::Duration;

    fn offline_generator() -> Generator {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_fetch().returning(|_| Ok("text".to_string()));
        Generator::new(Arc::new(fetcher), Arc::new(OfflineOutlineSource))
    }

    #[test]
    fn test_route() {
        assert_eq!(route("/generate-ppt"), GENERATE_PATH);
        assert_eq!(route("/generate-ppt/"), GENERATE_PATH);
        assert_eq!(route("/generate-ppt?x=1"), GENERATE_PATH);
        assert_eq!(route("/"), "/");
        assert_eq!(route(""), "/");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = handle(&offline_generator(), "POST", "/other", "{}").await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let response = handle(&offline_generator(), "GET", GENERATE_PATH, "").await;
        assert_eq!(response.status, 405);
    }

    #[tokio::test]
    async fn test_preflight() {
        let response = handle(&offline_generator(), "options", GENERATE_PATH, "").await;
        assert_eq!(response.status, 204);
        assert_eq!(response.body, Value::Null);
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(response.header("Content-Type"), None);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let response = handle(&offline_generator(), "POST", GENERATE_PATH, "{not json").await;
        assert_eq!(response.status, 400);
        assert!(response.body["error"].as_str().unwrap().starts_with("Could not understand"));
    }

    #[tokio::test]
    async fn test_blank_description() {
        let response = handle(&offline_generator(), "POST", GENERATE_PATH, r#"{"urls": []}"#).await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_slide_count_out_of_range() {
        for count in [0, 51] {
            let body = json!({ "description": "Topic", "slide_count": count }).to_string();
            let response = handle(&offline_generator(), "POST", GENERATE_PATH, &body).await;
            assert_eq!(response.status, 400, "slide_count {}", count);
        }
    }

    #[tokio::test]
    async fn test_inline_success_body() {
        let mut source = MockOutlineSource::new();
        source.expect_generate().returning(|_| {
            Ok(r#"{"slides":[{"title":"Rust","content":["Fast"]},{"title":"Why","content":["Safe"]}]}"#.to_string())
        });
        let generator = Generator::new(Arc::new(MockContentFetcher::new()), Arc::new(source));

        let response = handle(&generator, "POST", GENERATE_PATH, r#"{"description": "Rust"}"#).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("application/json"));

        let body = &response.body;
        assert!(body.get("download_url").is_none());
        assert_eq!(body["outline_origin"], "generated");
        assert_eq!(body["slides"]["slides"][0]["title"], "Rust");
        assert_eq!(body["pptx_info"]["slide_count"], 2);
        assert_eq!(body["pptx_info"]["format"], "pptx");
        assert!(body["pptx_info"]["size_bytes"].as_u64().unwrap() > 0);
        assert!(body["pptx_info"]["filename"].as_str().unwrap().starts_with("presentation_"));
        assert_eq!(body["pptx_info"]["encoding"], "base64");

        let bytes = BASE64_STANDARD
            .decode(body["file"].as_str().unwrap())
            .unwrap();
        assert_eq!(bytes.len() as u64, body["pptx_info"]["size_bytes"].as_u64().unwrap());
        let deck = slidegen_pptx::PptxReader::new().read_bytes(&bytes).unwrap();
        assert_eq!(deck.slides[0].title, "Rust");
        assert_eq!(deck.slides[1].paragraphs, vec!["Safe"]);
    }

    #[tokio::test]
    async fn test_stored_success_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "https://files.example.com", "secret");
        let generator = offline_generator().with_store(Arc::new(store), DeliveryPolicy::stored(Duration::from_secs(600)));

        let response = handle(
            &generator,
            "POST",
            GENERATE_PATH,
            r#"{"description": "Amazon Bedrock", "urls": ["https://aws.amazon.com/bedrock/"], "slide_count": 4}"#,
        )
        .await;
        assert_eq!(response.status, 200);

        let body = &response.body;
        let filename = body["pptx_info"]["filename"].as_str().unwrap();
        assert!(body["download_url"]
            .as_str()
            .unwrap()
            .starts_with(&format!("https://files.example.com/{}?expires=", filename)));
        assert!(dir.path().join(filename).exists());
        assert_eq!(body["outline_origin"], "fallback");
        assert_eq!(body["slides"]["slides"].as_array().unwrap().len(), 4);
        assert_eq!(body["sources"][0]["url"], "https://aws.amazon.com/bedrock/");
        assert!(body.get("file").is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_status() {
        let generator = offline_generator().with_store(
            Arc::new(FsObjectStore::new("/dev/null/not-a-dir", "https://x", "k")),
            DeliveryPolicy::stored(Duration::from_secs(600)),
        );
        let response = handle(&generator, "POST", GENERATE_PATH, r#"{"description": "T"}"#).await;
        assert_eq!(response.status, 502);
        assert_eq!(response.body["kind"], "delivery");
    }

    #[tokio::test]
    async fn test_source_failure_still_succeeds() {
        let mut source = MockOutlineSource::new();
        source.expect_generate().returning(|_| {
            Err(SourceError::Status {
                status: 503,
                body: "throttled".to_string(),
            })
        });
        let generator = Generator::new(Arc::new(MockContentFetcher::new()), Arc::new(source));

        let response = handle(&generator, "POST", GENERATE_PATH, r#"{"description": "T", "slide_count": 3}"#).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["outline_origin"], "fallback");
        assert_eq!(response.body["pptx_info"]["slide_count"], 3);
    }

    #[test]
    fn test_render_error_maps_to_500() {
        let err = GenerateError::Render(slidegen_pptx::Error::Corrupted("bad".to_string()));
        let response = error_response(&err);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["kind"], "render");
    }

    #[test]
    fn test_setup_error_maps_to_setup_kind() {
        let err = GenerateError::Setup("client could not be built".to_string());
        let response = error_response(&err);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["kind"], "setup");
        assert!(response.body["error"].as_str().unwrap().contains("client could not be built"));
    }
}
