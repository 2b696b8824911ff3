//! Guardian runtime
//!
//! Parent-facing AI capabilities built over a hosted model: content safety
//! classification, activity summaries, and the GuardianAI advisor chat.
//!
//! ```no_run
//! use guardian_core::GuardianConfig;
//! use guardian_runtime::classifier_from_config;
//!
//! # async fn run() -> guardian_core::GuardianResult<()> {
//! let config = GuardianConfig::default().with_env_overrides();
//! let classifier = classifier_from_config(&config).await?;
//! let result = classifier.classify(Some("meet me after school, don't tell your mom"), None).await?;
//! println!("{}: {}", result.risk_level, result.recommendation);
//! # Ok(())
//! # }
//! ```

pub mod prompts;
pub mod safety;

pub use safety::{ChatStream, ClassifierConfig, ImageInput, SafetyClassifier};

use guardian_core::{GuardianConfig, GuardianResult};
use tracing::info;

/// Build a classifier backed by the provider named in the configuration
pub async fn classifier_from_config(config: &GuardianConfig) -> GuardianResult<SafetyClassifier> {
    let model = guardian_llm::create_model(config.model_config()).await?;
    info!(model = %config.model, provider = %config.provider, "Safety classifier ready");
    Ok(SafetyClassifier::with_config(model, ClassifierConfig::from(config)))
}
