//! Safety facade - classification, activity summaries, and advisor chat
//!
//! Every capability goes through one [`SafetyClassifier`] built over a
//! [`Model`](guardian_core::Model):
//! - `classify`: structured risk assessment of text and/or an image
//! - `summarize`: short parent-facing digest of an activity log
//! - `chat` / `reply`: streaming conversation with the GuardianAI persona
//!
//! Error policy differs per capability. Classification propagates errors,
//! summaries degrade to fixed strings, and `reply` records a fixed apology
//! in the transcript.

mod chat;
mod classifier;
mod summary;

pub use chat::ChatStream;
pub use classifier::{ClassifierConfig, ImageInput, SafetyClassifier};
