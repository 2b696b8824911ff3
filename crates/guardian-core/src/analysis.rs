//! Content-safety verdicts
//!
//! An [`AnalysisResult`] is produced once per analysis request and never
//! mutated. Its wire shape is fixed by [`AnalysisResult::output_schema`],
//! which is also sent to the model as the response constraint.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::schema::OutputSchema;
use crate::{GuardianError, GuardianResult};

/// Risk tier, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Safe,
    LowRisk,
    ModerateRisk,
    HighRisk,
}

impl RiskLevel {
    /// All tiers from least to most severe
    pub const ALL: [RiskLevel; 4] = [
        Self::Safe,
        Self::LowRisk,
        Self::ModerateRisk,
        Self::HighRisk,
    ];

    /// Wire name, e.g. `MODERATE_RISK`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::LowRisk => "LOW_RISK",
            Self::ModerateRisk => "MODERATE_RISK",
            Self::HighRisk => "HIGH_RISK",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::LowRisk => "Low risk",
            Self::ModerateRisk => "Moderate risk",
            Self::HighRisk => "High risk",
        }
    }

    /// Severity from 0 (safe) to 3 (high risk)
    pub fn severity(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::LowRisk => 1,
            Self::ModerateRisk => 2,
            Self::HighRisk => 3,
        }
    }

    /// Whether a parent should look at this content
    pub fn needs_attention(&self) -> bool {
        *self >= Self::ModerateRisk
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SAFE" => Ok(Self::Safe),
            "LOW_RISK" => Ok(Self::LowRisk),
            "MODERATE_RISK" => Ok(Self::ModerateRisk),
            "HIGH_RISK" => Ok(Self::HighRisk),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Structured verdict for a piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalysisResult {
    /// 0 (extremely dangerous) to 100 (perfectly safe)
    pub safety_score: f64,
    /// Risk tier
    pub risk_level: RiskLevel,
    /// Detected issue labels, e.g. "Cyberbullying", "Phishing"
    pub categories: Vec<String>,
    /// Why the score was given
    pub reasoning: String,
    /// Actionable advice for the parent
    pub recommendation: String,
}

impl AnalysisResult {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 100.0;

    /// Response constraint sent with every classification request
    pub fn output_schema() -> OutputSchema {
        let tiers: Vec<&str> = RiskLevel::ALL.iter().map(|r| r.as_str()).collect();
        OutputSchema::from_json_schema(json!({
            "type": "object",
            "properties": {
                "safetyScore": {
                    "type": "number",
                    "description": "A score from 0 to 100, where 100 is perfectly safe and 0 is extremely dangerous.",
                    "minimum": Self::MIN_SCORE,
                    "maximum": Self::MAX_SCORE
                },
                "riskLevel": {
                    "type": "string",
                    "enum": tiers
                },
                "categories": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of potential issues found, e.g., 'Cyberbullying', 'Explicit Content', 'Violence', 'Phishing'."
                },
                "reasoning": {
                    "type": "string",
                    "description": "Detailed explanation of why this score was given."
                },
                "recommendation": {
                    "type": "string",
                    "description": "Actionable advice for the parent."
                }
            },
            "required": ["safetyScore", "riskLevel", "categories", "reasoning", "recommendation"]
        }))
        .with_description("Structured content-safety assessment")
    }

    /// Parse a model response, rejecting anything that does not conform
    ///
    /// The raw text is checked against [`Self::output_schema`] first, then
    /// deserialized. Deserialization errors name the offending field.
    pub fn from_model_json(raw: &str) -> GuardianResult<Self> {
        let value = Self::output_schema().parse_and_validate(raw)?;
        let result: Self = serde_path_to_error::deserialize(value).map_err(|e| {
            GuardianError::validation(format!(
                "Response field '{}' is malformed: {}",
                e.path(),
                e.inner()
            ))
        })?;
        result.check_score()?;
        Ok(result)
    }

    fn check_score(&self) -> GuardianResult<()> {
        if !self.safety_score.is_finite()
            || self.safety_score < Self::MIN_SCORE
            || self.safety_score > Self::MAX_SCORE
        {
            return Err(GuardianError::validation(format!(
                "safetyScore {} is outside [0, 100]",
                self.safety_score
            )));
        }
        Ok(())
    }
}
