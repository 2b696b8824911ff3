//! Guardian LLM - hosted model providers
//!
//! Implements the `guardian_core::Model` trait for hosted generative models.
//! Only Google Gemini is supported; callers with their own backend implement
//! `Model` directly and pass it to the safety facade.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use guardian_core::GuardianConfig;
//! use guardian_llm::create_model;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GuardianConfig::default().with_env_overrides();
//! let model = create_model(config.model_config()).await?;
//! # Ok(())
//! # }
//! ```

pub mod provider;

use guardian_core::{GuardianError, GuardianResult, Model, ModelConfig, ModelProvider};
use std::sync::Arc;
use tracing::info;

/// Create a model from configuration
pub async fn create_model(config: ModelConfig) -> GuardianResult<Arc<dyn Model>> {
    info!(provider = %config.provider, model = %config.model, "Creating model");

    match config.provider {
        ModelProvider::Google => Ok(Arc::new(provider::GoogleProvider::create(config)?)),
        ModelProvider::Custom => Err(GuardianError::config(
            "Custom models are constructed by the caller, not by create_model",
        )),
    }
}
