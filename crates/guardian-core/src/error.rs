//! Error types for Guardian
//!
//! Three error classes reach callers of the safety facade:
//! - `InvalidInput`: nothing analyzable was supplied
//! - `Service`: the remote model failed or returned an unparsable structure
//! - `Stream`: a chat stream broke mid-flight
//!
//! The remaining variants cover configuration and local validation.

use thiserror::Error;

/// Result alias used across the Guardian crates
pub type GuardianResult<T> = Result<T, GuardianError>;

/// Guardian error taxonomy
#[derive(Debug, Error)]
pub enum GuardianError {
    /// Caller supplied no analyzable content, or content in an unsupported form
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote call failed or returned content that does not match the expected shape
    #[error("Service error: {0}")]
    Service(String),

    /// Streaming response broke before end-of-stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value failed a schema or range check
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON/YAML (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GuardianError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Whether this error came from the caller rather than the remote side
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Fixed message suitable for showing inline to the parent
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Please provide text or an image to analyze.",
            Self::Stream(_) => {
                "I'm sorry, I'm having trouble connecting right now. Please try again later."
            }
            _ => "Failed to analyze content. Please try again.",
        }
    }
}

impl From<serde_json::Error> for GuardianError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for GuardianError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
