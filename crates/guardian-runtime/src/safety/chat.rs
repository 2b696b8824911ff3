//! Parenting advisor chat
//!
//! The caller owns the [`Conversation`]; each turn sends the persona plus the
//! in-session transcript and streams the reply back as text increments.

use futures::{Stream, StreamExt};
use guardian_core::{
    ChatMessage, ChatRole, Conversation, GuardianError, GuardianResult, ModelRequest,
    RequestMessage, StreamChunk,
};
use std::pin::Pin;
use tracing::{debug, warn};

use super::classifier::into_service_error;
use super::SafetyClassifier;
use crate::prompts::ADVISOR_SYSTEM;

/// Lazy sequence of reply text increments, in arrival order
pub type ChatStream = Pin<Box<dyn Stream<Item = GuardianResult<String>> + Send>>;

impl SafetyClassifier {
    /// Stream the advisor's reply to the conversation's latest user message
    ///
    /// The greeting and failed turns are not sent, since the model never
    /// produced them in-session.
    /// Fails with `InvalidInput` unless the transcript ends with a user message.
    pub async fn chat(&self, conversation: &Conversation) -> GuardianResult<ChatStream> {
        let request = advisor_request(conversation)?;
        debug!(
            conversation = %conversation.id,
            turns = request.messages.len(),
            "Advisor chat"
        );

        let stream = self
            .model
            .generate_stream(&request)
            .await
            .map_err(into_service_error)?;

        let text = stream.filter_map(|item| async move {
            match item {
                Ok(StreamChunk::ContentDelta { delta }) => Some(Ok(delta)),
                Ok(StreamChunk::Done { .. }) => None,
                Err(GuardianError::Stream(msg)) => Some(Err(GuardianError::Stream(msg))),
                Err(e) => Some(Err(GuardianError::stream(e.to_string()))),
            }
        });
        Ok(Box::pin(text))
    }

    /// Run one full advisor turn against the conversation
    ///
    /// Appends the user message, applies streamed text to the reply as it
    /// arrives, and returns the final assistant message. Never fails: on any
    /// error the transcript ends with the fixed apology instead.
    pub async fn reply(
        &self,
        conversation: &mut Conversation,
        user_text: impl Into<String>,
    ) -> ChatMessage {
        conversation.push_user(user_text);

        match self.drive_reply(conversation).await {
            Ok(()) => {
                if let Some(reply) = conversation.finish_reply() {
                    return reply.clone();
                }
                warn!(conversation = %conversation.id, "Advisor returned no text");
            }
            Err(e) => {
                warn!(conversation = %conversation.id, error = %e, "Advisor reply failed");
            }
        }
        conversation.push_error_reply().clone()
    }

    async fn drive_reply(&self, conversation: &mut Conversation) -> GuardianResult<()> {
        let mut stream = self.chat(conversation).await?;
        while let Some(chunk) = stream.next().await {
            conversation.apply_chunk(&chunk?);
        }
        Ok(())
    }
}

fn advisor_request(conversation: &Conversation) -> GuardianResult<ModelRequest> {
    let history = conversation.history();
    match history.last() {
        Some(last) if last.role == ChatRole::User => {}
        _ => {
            return Err(GuardianError::invalid_input(
                "Conversation must end with a user message",
            ))
        }
    }

    let messages = conversation
        .completed_history()
        .filter(|m| !m.text.is_empty())
        .map(|m| match m.role {
            ChatRole::User => RequestMessage::user(m.text.clone()),
            ChatRole::Assistant => RequestMessage::assistant(m.text.clone()),
        })
        .collect();

    Ok(ModelRequest::new(messages).with_system(ADVISOR_SYSTEM))
}
