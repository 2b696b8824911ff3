use bytes::Bytes;
use futures::StreamExt;
use guardian_core::{
    AnalysisResult, ContentPart, GuardianError, MessageRole, Model, ModelConfig, ModelProvider,
    ModelRequest, RequestMessage, StopReason, StreamChunk,
};
use guardian_llm::provider::google::decode_stream;
use guardian_llm::provider::GoogleProvider;
use std::collections::HashMap;

fn test_config(model: &str) -> ModelConfig {
    ModelConfig {
        model: model.to_string(),
        provider: ModelProvider::Google,
        api_key: Some("test-api-key".to_string()),
        endpoint: None,
        temperature: 0.7,
        max_tokens: Some(4096),
        timeout_secs: 60,
        headers: HashMap::new(),
        extra: HashMap::new(),
    }
}

/// Frame a sequence of Gemini responses the way the SSE endpoint does
fn sse_body(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .map(|e| format!("data: {}\r\n\r\n", e))
        .collect()
}

fn text_event(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}

fn final_event(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 20, "candidatesTokenCount": 9}
    })
}

async fn collect_text(body: Vec<Result<Bytes, String>>) -> (String, Vec<StreamChunk>, Option<GuardianError>) {
    let mut stream = decode_stream(futures::stream::iter(body));
    let mut text = String::new();
    let mut chunks = Vec::new();
    let mut error = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                if let StreamChunk::ContentDelta { delta } = &chunk {
                    text.push_str(delta);
                }
                chunks.push(chunk);
            }
            Err(e) => error = Some(e),
        }
    }
    (text, chunks, error)
}

// === Unit Tests (no API calls) ===

#[test]
fn test_google_provider_creation_with_api_key() {
    let result = GoogleProvider::create(test_config("gemini-2.5-flash"));
    assert!(result.is_ok(), "Provider creation should succeed with API key");
}

#[test]
fn test_google_provider_creation_without_api_key() {
    // Clear env vars if set
    std::env::remove_var("GOOGLE_API_KEY");
    std::env::remove_var("GEMINI_API_KEY");

    let mut config = test_config("gemini-2.5-flash");
    config.api_key = None;

    let result = GoogleProvider::create(config);
    assert!(
        matches!(result, Err(GuardianError::Config(_))),
        "Provider creation should fail without API key"
    );
}

#[test]
fn test_google_provider_config() {
    let mut config = test_config("gemini-2.5-flash");
    config.temperature = 0.3;
    config.max_tokens = Some(2048);
    config.timeout_secs = 120;

    let provider = GoogleProvider::create(config).unwrap();
    let returned_config = provider.config();

    assert_eq!(returned_config.model, "gemini-2.5-flash");
    assert_eq!(returned_config.temperature, 0.3);
    assert_eq!(returned_config.max_tokens, Some(2048));
    assert_eq!(returned_config.timeout_secs, 120);
    assert_eq!(provider.provider(), ModelProvider::Google);
}

#[test]
fn test_google_token_counting() {
    let provider = GoogleProvider::create(test_config("gemini-2.5-flash")).unwrap();

    let tokens = provider.count_tokens("Hello, world!");
    assert!(tokens > 0, "Should count tokens");
    assert!(tokens < 10, "Should be approximate");

    let long_text = "This is a longer text that should have more tokens than the short one.";
    assert!(provider.count_tokens(long_text) > tokens);

    assert_eq!(provider.count_tokens(""), 0, "Empty text should have 0 tokens");
}

#[test]
fn test_google_custom_endpoint() {
    let mut config = test_config("gemini-2.5-flash");
    config.endpoint = Some("https://custom.googleapis.com/v1beta/".to_string());

    let provider = GoogleProvider::create(config).unwrap();
    assert_eq!(provider.base_url(), "https://custom.googleapis.com/v1beta");
}

#[test]
fn test_google_invalid_header_rejected() {
    let mut config = test_config("gemini-2.5-flash");
    config
        .headers
        .insert("bad header".to_string(), "value".to_string());

    assert!(GoogleProvider::create(config).is_err());
}

#[test]
fn test_request_body_roles_and_system_instruction() {
    let provider = GoogleProvider::create(test_config("gemini-2.5-flash")).unwrap();
    let request = ModelRequest::new(vec![
        RequestMessage::user("Is Roblox okay for an 8 year old?"),
        RequestMessage::assistant("With parental controls, often yes."),
        RequestMessage::user("Which controls?"),
    ])
    .with_system("You are GuardianAI.");

    let body = provider.request_body(&request);

    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are GuardianAI.");
    assert_eq!(body["generationConfig"]["temperature"].as_f64().unwrap() as f32, 0.7);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
    assert!(body["generationConfig"].get("responseSchema").is_none());
}

#[test]
fn test_request_body_overrides() {
    let provider = GoogleProvider::create(test_config("gemini-2.5-flash")).unwrap();
    let mut request = ModelRequest::new(vec![RequestMessage::user("Test")]);
    request.temperature = Some(0.0);
    request.max_tokens = Some(256);

    let body = provider.request_body(&request);
    assert_eq!(body["generationConfig"]["temperature"], 0.0);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
}

#[test]
fn test_request_body_inline_image_and_schema() {
    let provider = GoogleProvider::create(test_config("gemini-2.5-flash")).unwrap();
    let request = ModelRequest::new(vec![RequestMessage {
        role: MessageRole::User,
        parts: vec![
            ContentPart::InlineData {
                mime_type: "image/png".to_string(),
                data: Bytes::from_static(b"hello"),
            },
            ContentPart::text("caption"),
        ],
    }])
    .with_response_schema(AnalysisResult::output_schema());

    let body = provider.request_body(&request);
    let parts = body["contents"][0]["parts"].as_array().unwrap();

    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], "aGVsbG8=");
    assert_eq!(parts[1]["text"], "caption");

    let generation = &body["generationConfig"];
    assert_eq!(generation["responseMimeType"], "application/json");
    assert_eq!(generation["responseSchema"]["type"], "OBJECT");
    assert_eq!(
        generation["responseSchema"]["properties"]["riskLevel"]["enum"],
        serde_json::json!(["SAFE", "LOW_RISK", "MODERATE_RISK", "HIGH_RISK"])
    );
    assert_eq!(
        generation["responseSchema"]["required"].as_array().unwrap().len(),
        5
    );
}

#[test]
fn test_request_body_merges_config_extras() {
    let mut config = test_config("gemini-2.5-flash");
    config.extra.insert("topP".to_string(), serde_json::json!(0.9));
    config.extra.insert("temperature".to_string(), serde_json::json!(1.5));
    let provider = GoogleProvider::create(config).unwrap();

    let body = provider.request_body(&ModelRequest::new(vec![RequestMessage::user("Test")]));
    let generation = &body["generationConfig"];

    assert_eq!(generation["topP"], 0.9);
    assert_eq!(generation["temperature"].as_f64().unwrap() as f32, 0.7);
}

#[test]
fn test_google_different_models() {
    for model in ["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"] {
        let provider = GoogleProvider::create(test_config(model)).unwrap();
        assert_eq!(provider.config().model, model);
    }
}

// === Stream Decoding ===

#[tokio::test]
async fn test_stream_yields_deltas_then_done() {
    let body = sse_body(&[
        text_event("Try a "),
        text_event("family media "),
        final_event("plan."),
    ]);

    let (text, chunks, error) = collect_text(vec![Ok(Bytes::from(body))]).await;

    assert!(error.is_none());
    assert_eq!(text, "Try a family media plan.");
    assert_eq!(chunks.len(), 4);
    assert!(matches!(
        chunks.last(),
        Some(StreamChunk::Done { stop_reason: StopReason::EndTurn, usage: Some(_) })
    ));
}

#[tokio::test]
async fn test_stream_independent_of_byte_boundaries() {
    let body = sse_body(&[text_event("Screen time "), final_event("works best with routines.")]);
    let bytes = body.as_bytes();

    for chunk_size in [1, 3, 7, 64, bytes.len()] {
        let pieces: Vec<Result<Bytes, String>> = bytes
            .chunks(chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        let (text, _, error) = collect_text(pieces).await;
        assert!(error.is_none(), "chunk size {}", chunk_size);
        assert_eq!(text, "Screen time works best with routines.");
    }
}

#[tokio::test]
async fn test_stream_transport_error_mid_flight() {
    let first = sse_body(&[text_event("Partial")]);
    let body = vec![Ok(Bytes::from(first)), Err("connection reset".to_string())];

    let (text, chunks, error) = collect_text(body).await;

    assert_eq!(text, "Partial");
    assert!(!chunks.iter().any(|c| matches!(c, StreamChunk::Done { .. })));
    assert!(matches!(error, Some(GuardianError::Stream(_))));
}

#[tokio::test]
async fn test_stream_truncated_without_finish_reason() {
    let body = sse_body(&[text_event("Cut off")]);
    let (_, _, error) = collect_text(vec![Ok(Bytes::from(body))]).await;
    assert!(matches!(error, Some(GuardianError::Stream(_))));
}

#[tokio::test]
async fn test_stream_error_event() {
    let body = "data: {\"error\": {\"code\": 500, \"message\": \"internal\"}}\n\n";
    let (_, _, error) = collect_text(vec![Ok(Bytes::from(body))]).await;

    let error = error.expect("error event should surface");
    assert!(error.to_string().contains("internal"));
}

// === Integration Tests (require API key) ===

#[cfg(feature = "integration_tests")]
mod integration {
    use super::*;

    fn live_config() -> ModelConfig {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .expect("GOOGLE_API_KEY must be set for integration tests");
        let mut config = test_config("gemini-2.5-flash");
        config.api_key = Some(api_key);
        config.max_tokens = Some(256);
        config
    }

    #[tokio::test]
    async fn test_google_generate_simple() {
        let provider = GoogleProvider::create(live_config()).unwrap();
        let mut request = ModelRequest::new(vec![RequestMessage::user(
            "Say 'hello' and nothing else.",
        )]);
        request.temperature = Some(0.0);

        let response = provider.generate(&request).await;
        assert!(response.is_ok(), "Generate should succeed: {:?}", response.err());
        assert!(response.unwrap().content.to_lowercase().contains("hello"));
    }

    #[tokio::test]
    async fn test_google_generate_structured() {
        let provider = GoogleProvider::create(live_config()).unwrap();
        let request = ModelRequest::new(vec![RequestMessage::user(
            "Assess this message for a child: 'Want to come to my birthday party on Saturday?'",
        )])
        .with_response_schema(AnalysisResult::output_schema());

        let response = provider.generate(&request).await.unwrap();
        let result = AnalysisResult::from_model_json(&response.content);
        assert!(result.is_ok(), "Structured response should parse: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_google_stream() {
        let provider = GoogleProvider::create(live_config()).unwrap();
        let request = ModelRequest::new(vec![RequestMessage::user("Count from 1 to 5.")]);

        let mut stream = provider.generate_stream(&request).await.unwrap();
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            if let StreamChunk::ContentDelta { delta } = chunk.unwrap() {
                text.push_str(&delta);
            }
        }
        assert!(text.contains('5'));
    }
}
