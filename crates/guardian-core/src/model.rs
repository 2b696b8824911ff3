//! Model abstraction
//!
//! The hosted generative model is an opaque capability behind the [`Model`]
//! trait. Providers translate a [`ModelRequest`] into their wire format;
//! tests substitute canned implementations.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;

use crate::schema::OutputSchema;
use crate::GuardianResult;

/// Model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Google Gemini (Generative Language API)
    Google,
    /// Caller-supplied implementation
    Custom,
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gemini" => Ok(Self::Google),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown model provider: {}", s)),
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name, e.g. `gemini-2.5-flash`
    pub model: String,
    pub provider: ModelProvider,
    /// API key; providers fall back to environment variables when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra HTTP headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Extra generation settings passed through to the provider, e.g. `topP`
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

impl ModelConfig {
    /// Configuration for a Google model with defaults for everything else
    pub fn google(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: ModelProvider::Google,
            api_key: None,
            endpoint: None,
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            headers: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Role of a request message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One part of a request message
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Raw bytes sent inline, e.g. an image
    InlineData { mime_type: String, data: Bytes },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::InlineData { .. } => None,
        }
    }
}

/// Message sent to the model
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    pub role: MessageRole,
    /// Ordered parts
    pub parts: Vec<ContentPart>,
}

impl RequestMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            parts: vec![ContentPart::text(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            parts: vec![ContentPart::text(text)],
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(|p| p.as_text()).collect()
    }
}

/// Request sent to a model
#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    pub messages: Vec<RequestMessage>,
    /// System instruction
    pub system: Option<String>,
    /// Structured-response constraint; the reply must be JSON of this shape
    pub response_schema: Option<OutputSchema>,
    /// Overrides the configured temperature
    pub temperature: Option<f32>,
    /// Overrides the configured output limit
    pub max_tokens: Option<u32>,
}

impl ModelRequest {
    pub fn new(messages: Vec<RequestMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_response_schema(mut self, schema: OutputSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    /// Blocked by the provider's own safety filters
    Safety,
    Other,
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Complete (non-streaming) model response
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    /// Generated text; empty when the model produced none
    pub content: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Increment of a streaming response
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Next piece of text, in arrival order
    ContentDelta { delta: String },
    /// End of stream
    Done {
        stop_reason: StopReason,
        usage: Option<Usage>,
    },
}

/// Lazy sequence of stream increments
pub type ModelStream = Pin<Box<dyn Stream<Item = GuardianResult<StreamChunk>> + Send>>;

/// Model trait - abstraction over a hosted generative model
#[async_trait]
pub trait Model: Send + Sync {
    /// Generate a complete response
    async fn generate(&self, request: &ModelRequest) -> GuardianResult<ModelResponse>;

    /// Generate a response as a stream of increments
    async fn generate_stream(&self, request: &ModelRequest) -> GuardianResult<ModelStream>;

    /// Configuration this model was built from
    fn config(&self) -> &ModelConfig;

    fn provider(&self) -> ModelProvider;

    /// Rough token estimate (about four characters per token)
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
