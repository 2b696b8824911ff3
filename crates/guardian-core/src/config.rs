//! Guardian configuration
//!
//! Loaded from YAML, then overridden from the environment:
//!
//! ```yaml
//! model: gemini-2.5-flash
//! timeout_secs: 60
//! schema_retries: 0
//! ```
//!
//! Environment overrides: `GUARDIAN_MODEL`, `GUARDIAN_ENDPOINT`, and the API
//! key from `GOOGLE_API_KEY` or `GEMINI_API_KEY` when the file sets none.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::model::{ModelConfig, ModelProvider};
use crate::{GuardianError, GuardianResult};

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub model: String,
    pub provider: ModelProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Extra attempts after a response fails schema validation
    pub schema_retries: u32,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider: ModelProvider::Google,
            api_key: None,
            endpoint: None,
            temperature: 0.7,
            timeout_secs: 60,
            schema_retries: 0,
        }
    }
}

impl GuardianConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> GuardianResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| GuardianError::config(format!("Failed to parse YAML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> GuardianResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardianError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_yaml_str(&content)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = non_empty("GUARDIAN_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = non_empty("GUARDIAN_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if self.api_key.is_none() {
            self.api_key = non_empty("GOOGLE_API_KEY").or_else(|| non_empty("GEMINI_API_KEY"));
        }
        self
    }

    fn validate(&self) -> GuardianResult<()> {
        if self.model.trim().is_empty() {
            return Err(GuardianError::config("model must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(GuardianError::config("timeout_secs must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GuardianError::config(format!(
                "temperature {} is outside [0, 2]",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Model configuration derived from this config
    pub fn model_config(&self) -> ModelConfig {
        let mut config = ModelConfig::google(self.model.clone());
        config.provider = self.provider;
        config.api_key = self.api_key.clone();
        config.endpoint = self.endpoint.clone();
        config.temperature = self.temperature;
        config.timeout_secs = self.timeout_secs;
        config
    }
}
