use slidegen_core::{GenerateRequest, Outline};
use slidegen_pptx::{PptxReader, SlideLayout};
use slidegen_service::{
    handle, Delivery, DeliveryPolicy, FetchError, FsObjectStore, Generator, MockContentFetcher,
    MockOutlineSource, OfflineOutlineSource, OutlineOrigin, GENERATE_PATH,
};
use std::sync::Arc;
use std::time::Duration;

const BEDROCK_URL: &str = "https://aws.amazon.com/bedrock/";

fn bedrock_fetcher() -> MockContentFetcher {
    let mut fetcher = MockContentFetcher::new();
    fetcher.expect_fetch().returning(|url| {
        if url == BEDROCK_URL {
            Ok("Amazon Bedrock is a fully managed service that offers foundation models.".to_string())
        } else {
            Err(FetchError::Status(404))
        }
    });
    fetcher
}

fn inline_bytes(delivery: &Delivery) -> &[u8] {
    match delivery {
        Delivery::Inline { bytes, .. } => bytes.as_slice(),
        other => panic!("expected inline delivery, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bedrock_scenario_with_fallback() {
    let generator = Generator::new(Arc::new(bedrock_fetcher()), Arc::new(OfflineOutlineSource));
    let request = GenerateRequest::new("Amazon Bedrock").with_urls([BEDROCK_URL]);

    let generated = generator.generate(&request).await.unwrap();

    assert!(generated.slide_count >= 3);
    assert_eq!(generated.outline.slides[0].title, "Amazon Bedrock");
    assert!(generated.outline.slides.last().unwrap().is_closing());
    assert!(generated.pages[0].is_ok());

    let deck = PptxReader::new()
        .read_bytes(inline_bytes(&generated.delivery))
        .unwrap();
    assert_eq!(deck.len(), generated.slide_count);
    assert_eq!(deck.slides[0].layout, SlideLayout::Title);
    assert_eq!(deck.slides[0].title, "Amazon Bedrock");
    assert_eq!(deck.to_outline(), generated.outline);
}

#[tokio::test]
async fn test_bedrock_scenario_with_generated_outline() {
    let mut source = MockOutlineSource::new();
    source.expect_generate().times(1).returning(|request| {
        assert!(request.reference_text.contains("fully managed service"));
        Ok(r#"```json
{"slides": [
  {"title": "Amazon Bedrock", "content": ["Presentation Overview", "Key Topics Covered", "Main Objectives"]},
  {"title": "Foundation Models", "content": ["Claude", "Titan", "Llama"]},
  {"title": "Thank You!", "content": ["Questions?"]}
]}
```"#
            .to_string())
    });

    let generator = Generator::new(Arc::new(bedrock_fetcher()), Arc::new(source));
    let request = GenerateRequest::new("Amazon Bedrock")
        .with_urls([BEDROCK_URL])
        .with_slide_count(3);
    let generated = generator.generate(&request).await.unwrap();

    assert_eq!(generated.origin, OutlineOrigin::Generated);
    let deck = PptxReader::new()
        .read_bytes(inline_bytes(&generated.delivery))
        .unwrap();
    assert_eq!(deck.slides[1].paragraphs, vec!["Claude", "Titan", "Llama"]);
    assert_eq!(deck.slides[2].title, "Thank You!");
}

#[tokio::test]
async fn test_unparseable_source_text_renders_fallback() {
    let mut source = MockOutlineSource::new();
    source
        .expect_generate()
        .returning(|_| Ok("{\"slides\": [ this is not json".to_string()));

    let generator = Generator::new(Arc::new(bedrock_fetcher()), Arc::new(source));
    let generated = generator
        .generate(&GenerateRequest::new("Amazon Bedrock").with_slide_count(5))
        .await
        .unwrap();

    assert!(matches!(generated.origin, OutlineOrigin::Fallback { .. }));
    assert_eq!(generated.outline, slidegen_core::fallback_outline("Amazon Bedrock", 5));

    let deck = PptxReader::new()
        .read_bytes(inline_bytes(&generated.delivery))
        .unwrap();
    let rendered: Outline = deck.to_outline();
    assert_eq!(rendered, generated.outline);
}

#[tokio::test]
async fn test_handler_stores_and_signs() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsObjectStore::new(dir.path(), "https://decks.example.com", "signing-key"));
    let generator = Generator::new(Arc::new(bedrock_fetcher()), Arc::new(OfflineOutlineSource))
        .with_store(store.clone(), DeliveryPolicy::stored(Duration::from_secs(86_400)));

    let body = serde_json::json!({
        "description": "Amazon Bedrock",
        "urls": [BEDROCK_URL, "https://missing.example.com"],
    })
    .to_string();
    let response = handle(&generator, "POST", GENERATE_PATH, &body).await;
    assert_eq!(response.status, 200);

    let filename = response.body["pptx_info"]["filename"].as_str().unwrap().to_string();
    let url = response.body["download_url"].as_str().unwrap().to_string();
    let query = url.split_once('?').unwrap().1;
    let mut expires = 0i64;
    let mut signature = String::new();
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("expires", v)) => expires = v.parse().unwrap(),
            Some(("signature", v)) => signature = v.to_string(),
            _ => {}
        }
    }
    assert!(store.verify(&filename, expires, &signature, chrono::Utc::now()));

    let stored = std::fs::read(dir.path().join(&filename)).unwrap();
    assert_eq!(stored.len() as u64, response.body["pptx_info"]["size_bytes"].as_u64().unwrap());
    let deck = PptxReader::new().read_bytes(&stored).unwrap();
    assert_eq!(deck.slides[0].title, "Amazon Bedrock");

    assert!(response.body["sources"][1]["error"].is_string());
}
