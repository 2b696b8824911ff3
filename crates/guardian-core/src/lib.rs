// Guardian Core - Foundation types for the Guardian parental-control toolkit
//
// Age-based policy derivation, the content-safety verdict shape, activity
// and chat records, and the model abstraction the safety facade talks to.

pub mod activity;
pub mod analysis;
pub mod chat;
pub mod config;
pub mod error;
pub mod model;
pub mod policy;
pub mod profile;
pub mod schema;

// Re-export core types
pub use activity::{ActivityCategory, ActivityItem, ActivityLog};
pub use analysis::{AnalysisResult, RiskLevel};
pub use chat::{ChatMessage, ChatRole, Conversation, ADVISOR_APOLOGY, ADVISOR_GREETING};
pub use config::{GuardianConfig, DEFAULT_MODEL};
pub use error::{GuardianError, GuardianResult};
pub use model::{
    ContentPart, MessageRole, Model, ModelConfig, ModelProvider, ModelRequest, ModelResponse,
    ModelStream, RequestMessage, StopReason, StreamChunk, Usage,
};
pub use policy::{age_from_dob, AgeBracket, PolicyAdvisor, PolicyRecommendation};
pub use profile::{CategorySet, ChildProfile, ContentCategory, ProfileRoster};
pub use schema::OutputSchema;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
