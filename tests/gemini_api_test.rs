use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use vizzu_studio::{
    Angle, GeminiClient, GeminiConfig, ImageGenerator, Orchestrator, OrchestratorConfig, Part,
    PromptBuilder, GenerationRequest, Sleeper, StudioError,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/models/gemini-test:generateContent";
const PNG_B64: &str = "iVBORw0KGgo=";

#[derive(Default)]
struct RecordingSleeper(Mutex<Vec<Duration>>);

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.0.lock().unwrap().push(duration);
    }
}

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(
        GeminiConfig::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
            .with_model("gemini-test"),
    )
    .unwrap()
}

fn image_body() -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here is the photo." },
                    { "inlineData": { "mimeType": "image/png", "data": PNG_B64 } }
                ]
            }
        }]
    })
}

#[tokio::test]
async fn gemini_returns_first_inline_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "a red dress" }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body()))
        .expect(1)
        .mount(&server)
        .await;

    let image = client(&server)
        .generate(&[Part::text("a red dress")])
        .await
        .unwrap()
        .expect("image payload");

    assert_eq!(image.mime_type, "image/png");
    assert_eq!(&image.bytes[..4], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn gemini_without_image_is_empty_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot draw that." }] } }]
        })))
        .mount(&server)
        .await;

    let result = client(&server).generate(&[Part::text("x")]).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn gemini_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad prompt"))
        .mount(&server)
        .await;

    let gemini = client(&server);
    let throttled = gemini.generate(&[Part::text("x")]).await.unwrap_err();
    assert!(throttled.is_transient());

    let rejected = gemini.generate(&[Part::text("x")]).await.unwrap_err();
    assert!(matches!(rejected, StudioError::Response(ref m) if m.contains("400")));
    assert!(!rejected.is_transient());
}

#[tokio::test]
async fn orchestrator_retries_service_unavailable_with_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body()))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::with_sleeper(
        client(&server),
        RecordingSleeper::default(),
        OrchestratorConfig::default(),
    );
    let prompt = PromptBuilder::new().build(&GenerationRequest::default());
    let image = orchestrator
        .generate_angle(&prompt, Angle::Front, None, true)
        .await
        .unwrap();

    assert_eq!(image.angle, Angle::Front);
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(
        *orchestrator.sleeper().0.lock().unwrap(),
        vec![Duration::from_millis(5000), Duration::from_millis(10000)]
    );
}
