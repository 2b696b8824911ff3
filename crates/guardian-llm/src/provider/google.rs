//! Google Gemini provider
//!
//! Talks to the Generative Language REST API:
//! - `models/{model}:generateContent` for complete responses
//! - `models/{model}:streamGenerateContent?alt=sse` for streaming
//!
//! A request's [`OutputSchema`] becomes `responseMimeType: application/json`
//! plus a `responseSchema` in Gemini's OpenAPI subset.

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use guardian_core::{
    ContentPart, GuardianError, GuardianResult, MessageRole, Model, ModelConfig, ModelProvider,
    ModelRequest, ModelResponse, ModelStream, OutputSchema, StopReason, StreamChunk, Usage,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

use super::sse::SseDecoder;

/// Default API base URL
pub const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for an API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Gemini model provider
pub struct GoogleProvider {
    config: ModelConfig,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    /// Create a provider; fails when no API key is configured or in the environment
    pub fn create(config: ModelConfig) -> GuardianResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            })
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                GuardianError::config("Google API key not set (GOOGLE_API_KEY or GEMINI_API_KEY)")
            })?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| GOOGLE_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GuardianError::config(format!("Invalid header name {}: {}", name, e)))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| GuardianError::config(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| GuardianError::config(format!("Failed to create HTTP client: {}", e)))?;

        debug!(model = %config.model, endpoint = %base_url, "Google provider created");

        Ok(Self {
            config,
            api_key,
            base_url,
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.config.model, method)
    }

    /// Build the JSON body for a request
    pub fn request_body(&self, request: &ModelRequest) -> Value {
        let contents: Vec<Value> = request
            .messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                let parts: Vec<Value> = msg.parts.iter().map(part_to_json).collect();
                json!({ "role": role, "parts": parts })
            })
            .collect();

        // Configured extras first; explicit fields below take precedence
        let mut generation: Map<String, Value> = self
            .config
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        generation.insert(
            "temperature".to_string(),
            json!(request.temperature.unwrap_or(self.config.temperature)),
        );
        if let Some(max) = request.max_tokens.or(self.config.max_tokens) {
            generation.insert("maxOutputTokens".to_string(), json!(max));
        }
        if let Some(schema) = &request.response_schema {
            generation.insert("responseMimeType".to_string(), json!("application/json"));
            generation.insert("responseSchema".to_string(), to_gemini_schema(schema));
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": Value::Object(generation),
        });
        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }

    async fn post(&self, url: &str, request: &ModelRequest) -> GuardianResult<reqwest::Response> {
        let body = self.request_body(request);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GuardianError::service(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gemini API returned an error");
            return Err(GuardianError::service(format!(
                "Gemini API error {}: {}",
                status, text
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl Model for GoogleProvider {
    async fn generate(&self, request: &ModelRequest) -> GuardianResult<ModelResponse> {
        debug!(model = %self.config.model, messages = request.messages.len(), "Gemini generate");

        let response = self.post(&self.url("generateContent"), request).await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GuardianError::service(format!("Gemini response parse failed: {}", e)))?;

        parse_response(parsed)
    }

    async fn generate_stream(&self, request: &ModelRequest) -> GuardianResult<ModelStream> {
        debug!(model = %self.config.model, messages = request.messages.len(), "Gemini stream");

        let url = format!("{}?alt=sse", self.url("streamGenerateContent"));
        let response = self.post(&url, request).await?;
        Ok(decode_stream(response.bytes_stream()))
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn provider(&self) -> ModelProvider {
        ModelProvider::Google
    }
}

fn part_to_json(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text(text) => json!({ "text": text }),
        ContentPart::InlineData { mime_type, data } => json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": base64::engine::general_purpose::STANDARD.encode(data),
            }
        }),
    }
}

/// Convert a JSON Schema subset into Gemini's `responseSchema` form
///
/// Type names are upper-cased; keywords Gemini does not accept are dropped
/// (local validation still enforces them).
pub fn to_gemini_schema(schema: &OutputSchema) -> Value {
    convert_schema_node(&schema.schema)
}

fn convert_schema_node(node: &Value) -> Value {
    let Some(obj) = node.as_object() else {
        return node.clone();
    };

    let mut out = Map::new();
    for (key, value) in obj {
        match key.as_str() {
            "type" => {
                if let Some(t) = value.as_str() {
                    out.insert(key.clone(), json!(t.to_uppercase()));
                }
            }
            "description" | "enum" | "required" | "nullable" | "format" => {
                out.insert(key.clone(), value.clone());
            }
            "items" => {
                out.insert(key.clone(), convert_schema_node(value));
            }
            "properties" => {
                if let Some(props) = value.as_object() {
                    let converted: Map<String, Value> = props
                        .iter()
                        .map(|(name, prop)| (name.clone(), convert_schema_node(prop)))
                        .collect();
                    out.insert(key.clone(), Value::Object(converted));
                }
            }
            _ => {}
        }
    }
    Value::Object(out)
}

// Gemini wire types

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some()
        {
            return Some(StopReason::Safety);
        }
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .map(map_finish_reason)
    }

    fn usage(&self) -> Option<Usage> {
        self.usage_metadata.as_ref().map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
    }
}

fn map_finish_reason(reason: &str) -> StopReason {
    match reason {
        "STOP" => StopReason::EndTurn,
        "MAX_TOKENS" => StopReason::MaxTokens,
        "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" | "RECITATION" => {
            StopReason::Safety
        }
        _ => StopReason::Other,
    }
}

/// Turn a decoded Gemini response into a [`ModelResponse`]
pub fn parse_response(response: GenerateContentResponse) -> GuardianResult<ModelResponse> {
    let stop_reason = response.stop_reason().unwrap_or(StopReason::Other);
    if stop_reason == StopReason::Safety {
        warn!("Gemini blocked the request or response");
    }
    Ok(ModelResponse {
        content: response.text(),
        stop_reason,
        usage: response.usage().unwrap_or_default(),
    })
}

struct StreamState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<GuardianResult<StreamChunk>>,
    stop_reason: Option<StopReason>,
    usage: Option<Usage>,
    finished: bool,
}

impl<S> StreamState<S> {
    fn handle_event(&mut self, data: &str) {
        let value: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                self.fail(format!("Malformed stream event: {}", e));
                return;
            }
        };
        if let Some(err) = value.get("error") {
            self.fail(format!("Gemini stream error: {}", err));
            return;
        }
        let event: GenerateContentResponse = match serde_json::from_value(value) {
            Ok(e) => e,
            Err(e) => {
                self.fail(format!("Unexpected stream event shape: {}", e));
                return;
            }
        };

        let delta = event.text();
        if !delta.is_empty() {
            self.pending.push_back(Ok(StreamChunk::ContentDelta { delta }));
        }
        if let Some(reason) = event.stop_reason() {
            self.stop_reason = Some(reason);
        }
        if let Some(usage) = event.usage() {
            self.usage = Some(usage);
        }
    }

    fn fail(&mut self, msg: String) {
        warn!(error = %msg, "Gemini stream failed");
        self.pending.push_back(Err(GuardianError::stream(msg)));
        self.finished = true;
    }

    fn complete(&mut self) {
        if let Some(event) = self.decoder.finish() {
            self.handle_event(&event);
        }
        if self.finished {
            return;
        }
        match self.stop_reason {
            Some(stop_reason) => self.pending.push_back(Ok(StreamChunk::Done {
                stop_reason,
                usage: self.usage,
            })),
            None => self.fail("Stream ended before the model finished".to_string()),
        }
        self.finished = true;
    }
}

/// Decode an SSE byte stream of Gemini responses into stream chunks
///
/// Text increments are yielded in arrival order and followed by a single
/// `Done`. A transport error, a malformed event, or a stream that ends
/// without a finish reason yields one `Stream` error and then ends.
pub fn decode_stream<S, E>(bytes: S) -> ModelStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        stop_reason: None,
        usage: None,
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in st.decoder.push(&chunk) {
                        st.handle_event(&event);
                        if st.finished {
                            break;
                        }
                    }
                }
                Some(Err(e)) => st.fail(format!("Connection lost mid-stream: {}", e)),
                None => st.complete(),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason("STOP"), StopReason::EndTurn);
        assert_eq!(map_finish_reason("MAX_TOKENS"), StopReason::MaxTokens);
        assert_eq!(map_finish_reason("SAFETY"), StopReason::Safety);
        assert_eq!(map_finish_reason("OTHER"), StopReason::Other);
    }

    #[test]
    fn test_parse_response_concatenates_parts() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello"}, {"text": ", parent"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let response = parse_response(parsed).unwrap();

        assert_eq!(response.content, "Hello, parent");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 12);
    }

    #[test]
    fn test_blocked_prompt_has_no_content() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let response = parse_response(parsed).unwrap();

        assert!(response.content.is_empty());
        assert_eq!(response.stop_reason, StopReason::Safety);
    }

    #[test]
    fn test_schema_conversion() {
        let schema = OutputSchema::from_json_schema(json!({
            "type": "object",
            "properties": {
                "score": {"type": "number", "minimum": 0, "maximum": 100},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["score"]
        }));
        let converted = to_gemini_schema(&schema);

        assert_eq!(converted["type"], "OBJECT");
        assert_eq!(converted["properties"]["score"]["type"], "NUMBER");
        assert!(converted["properties"]["score"].get("minimum").is_none());
        assert_eq!(converted["properties"]["tags"]["items"]["type"], "STRING");
        assert_eq!(converted["required"], json!(["score"]));
    }
}
