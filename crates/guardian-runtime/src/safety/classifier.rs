//! Content classification
//!
//! Sends text and/or an image to the model under a structured-response
//! constraint and validates what comes back against the [`AnalysisResult`]
//! schema before handing it to the caller.

use base64::Engine;
use bytes::Bytes;
use guardian_core::{
    AnalysisResult, ContentPart, GuardianConfig, GuardianError, GuardianResult, MessageRole,
    Model, ModelRequest, RequestMessage,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::prompts::{ANALYSIS_PROMPT, CLASSIFIER_SYSTEM};

/// Classifier behaviour knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassifierConfig {
    /// Extra attempts when a response fails schema validation.
    /// Transport errors are never retried.
    pub schema_retries: u32,
}

impl From<&GuardianConfig> for ClassifierConfig {
    fn from(config: &GuardianConfig) -> Self {
        Self {
            schema_retries: config.schema_retries,
        }
    }
}

/// Image to classify: raw bytes plus media type
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub data: Bytes,
    /// Media type, e.g. `image/png`
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Decode a `data:image/...;base64,...` URL as produced by browser file readers
    pub fn from_data_url(url: &str) -> GuardianResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| GuardianError::invalid_input("Not a data URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| GuardianError::invalid_input("Data URL has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| GuardianError::invalid_input("Data URL is not base64 encoded"))?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| GuardianError::invalid_input(format!("Invalid base64 image data: {}", e)))?;

        let image = Self::new(data, mime_type);
        image.validate()?;
        Ok(image)
    }

    fn validate(&self) -> GuardianResult<()> {
        let is_image = self
            .mime_type
            .split_once('/')
            .map(|(kind, sub)| kind.eq_ignore_ascii_case("image") && !sub.is_empty())
            .unwrap_or(false);
        if !is_image {
            return Err(GuardianError::invalid_input(format!(
                "Unsupported media type '{}', expected image/*",
                self.mime_type
            )));
        }
        if self.data.is_empty() {
            return Err(GuardianError::invalid_input("Image data is empty"));
        }
        Ok(())
    }
}

/// Facade over a model for every parent-facing AI capability
pub struct SafetyClassifier {
    pub(super) model: Arc<dyn Model>,
    config: ClassifierConfig,
}

impl SafetyClassifier {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self::with_config(model, ClassifierConfig::default())
    }

    pub fn with_config(model: Arc<dyn Model>, config: ClassifierConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> ClassifierConfig {
        self.config
    }

    /// Assess text and/or an image for risks to a child
    ///
    /// Whitespace-only text counts as absent. At least one input is required.
    pub async fn classify(
        &self,
        text: Option<&str>,
        image: Option<ImageInput>,
    ) -> GuardianResult<AnalysisResult> {
        let text = text.filter(|t| !t.trim().is_empty());
        if text.is_none() && image.is_none() {
            return Err(GuardianError::invalid_input(
                "No content provided for analysis",
            ));
        }
        if let Some(image) = &image {
            image.validate()?;
        }

        let request = classification_request(text, image);
        let attempts = self.config.schema_retries.saturating_add(1);
        debug!(
            has_text = text.is_some(),
            attempts, "Classifying content"
        );

        let mut last_error = None;
        for attempt in 1..=attempts {
            let response = self.model.generate(&request).await.map_err(|e| {
                warn!(error = %e, "Classification request failed");
                into_service_error(e)
            })?;

            if response.content.trim().is_empty() {
                warn!(attempt, "Empty response from model");
                last_error = Some(GuardianError::validation("Empty response from model"));
                continue;
            }

            match AnalysisResult::from_model_json(&response.content) {
                Ok(result) => {
                    info!(
                        risk_level = %result.risk_level,
                        safety_score = result.safety_score,
                        "Content classified"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Malformed classification response");
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(GuardianError::service(format!(
            "Classification response rejected: {}",
            reason
        )))
    }
}

/// One user message: image, then text, then the instruction prompt
fn classification_request(text: Option<&str>, image: Option<ImageInput>) -> ModelRequest {
    let mut parts = Vec::with_capacity(3);
    if let Some(image) = image {
        parts.push(ContentPart::InlineData {
            mime_type: image.mime_type,
            data: image.data,
        });
    }
    if let Some(text) = text {
        parts.push(ContentPart::text(text));
    }
    parts.push(ContentPart::text(ANALYSIS_PROMPT));

    ModelRequest::new(vec![RequestMessage {
        role: MessageRole::User,
        parts,
    }])
    .with_system(CLASSIFIER_SYSTEM)
    .with_response_schema(AnalysisResult::output_schema())
}

/// Failures reaching the model surface to callers as service errors
pub(super) fn into_service_error(err: GuardianError) -> GuardianError {
    match err {
        GuardianError::Service(_) => err,
        other => GuardianError::service(other.to_string()),
    }
}
