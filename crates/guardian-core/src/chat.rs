//! Advisor conversations
//!
//! A [`Conversation`] is plain caller-owned state: an id and an append-only
//! transcript. Nothing else holds a reference to it, and dropping it ends the
//! conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting every conversation opens with
pub const ADVISOR_GREETING: &str = "Hello! I'm GuardianAI, your parenting assistant. How can I help you keep your family safe online today?";

/// Reply appended when the advisor cannot be reached
pub const ADVISOR_APOLOGY: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again later.";

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A message in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Part of a turn the advisor could not complete
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            failed: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }
}

/// Conversation state owned by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier
    pub id: String,
    /// Ordered transcript, greeting first
    messages: Vec<ChatMessage>,
    /// Index of the assistant reply currently being streamed
    #[serde(skip)]
    open_reply: Option<usize>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Start a conversation seeded with the advisor greeting
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: vec![ChatMessage::assistant(ADVISOR_GREETING)],
            open_reply: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Messages exchanged in-session, i.e. everything after the greeting
    pub fn history(&self) -> &[ChatMessage] {
        let skip = usize::from(
            self.messages
                .first()
                .map(|m| m.role == ChatRole::Assistant && m.text == ADVISOR_GREETING)
                .unwrap_or(false),
        );
        &self.messages[skip..]
    }

    /// In-session messages the model actually took part in
    ///
    /// Failed turns are left out: the user message that started them, any
    /// partial reply, and the apology.
    pub fn completed_history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history().iter().filter(|m| !m.failed)
    }

    /// Whether an assistant reply is currently open for streaming
    pub fn is_replying(&self) -> bool {
        self.open_reply.is_some()
    }

    /// Append a user message and return a reference to it
    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.close_reply();
        self.messages.push(ChatMessage::user(text));
        &self.messages[self.messages.len() - 1]
    }

    /// Open an empty assistant message that stream chunks will fill
    pub fn begin_reply(&mut self) -> &ChatMessage {
        self.messages.push(ChatMessage::assistant(String::new()));
        let idx = self.messages.len() - 1;
        self.open_reply = Some(idx);
        &self.messages[idx]
    }

    /// Append one streamed increment to the open reply
    ///
    /// Opens a reply first if none is open, so callers can apply chunks
    /// without a separate `begin_reply`.
    pub fn apply_chunk(&mut self, chunk: &str) {
        let idx = match self.open_reply {
            Some(idx) => idx,
            None => {
                self.begin_reply();
                self.messages.len() - 1
            }
        };
        self.messages[idx].text.push_str(chunk);
    }

    /// Close the open reply and return it
    pub fn finish_reply(&mut self) -> Option<&ChatMessage> {
        let idx = self.open_reply.take()?;
        self.messages.get(idx)
    }

    /// Record that the advisor could not answer
    ///
    /// An open reply that received no text is dropped so the apology takes
    /// its place; partial text is kept. The whole turn is marked failed.
    pub fn push_error_reply(&mut self) -> &ChatMessage {
        if let Some(idx) = self.open_reply.take() {
            if self.messages[idx].text.is_empty() {
                self.messages.remove(idx);
            } else {
                self.messages[idx].failed = true;
            }
        }
        if let Some(user) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == ChatRole::User)
        {
            user.failed = true;
        }

        let mut apology = ChatMessage::assistant(ADVISOR_APOLOGY);
        apology.failed = true;
        self.messages.push(apology);
        &self.messages[self.messages.len() - 1]
    }

    fn close_reply(&mut self) {
        self.open_reply = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_has_greeting() {
        let convo = Conversation::new();
        assert_eq!(convo.len(), 1);
        assert_eq!(convo.messages()[0].text, ADVISOR_GREETING);
        assert!(convo.history().is_empty());
    }

    #[test]
    fn test_chunks_accumulate_in_order() {
        let mut convo = Conversation::new();
        convo.push_user("How much screen time is okay for a 7 year old?");
        convo.begin_reply();
        for chunk in ["Around ", "two hours", " a day."] {
            convo.apply_chunk(chunk);
        }
        let reply = convo.finish_reply().unwrap();

        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.text, "Around two hours a day.");
        assert_eq!(convo.history().len(), 2);
        assert!(!convo.is_replying());
    }

    #[test]
    fn test_partition_invariance() {
        let text = "Set device-free zones at dinner and bedtime.";
        let partitions: Vec<Vec<&str>> = vec![
            vec![text],
            text.split_inclusive(' ').collect(),
            vec![&text[..1], &text[1..20], &text[20..]],
        ];

        for parts in partitions {
            let mut convo = Conversation::new();
            convo.push_user("tips?");
            for part in parts {
                convo.apply_chunk(part);
            }
            assert_eq!(convo.last().unwrap().text, text);
        }
    }

    #[test]
    fn test_error_reply_replaces_empty_reply() {
        let mut convo = Conversation::new();
        convo.push_user("hello");
        convo.begin_reply();
        convo.push_error_reply();

        assert_eq!(convo.len(), 3);
        assert_eq!(convo.last().unwrap().text, ADVISOR_APOLOGY);
    }

    #[test]
    fn test_error_reply_keeps_partial_text() {
        let mut convo = Conversation::new();
        convo.push_user("hello");
        convo.apply_chunk("Partial");
        convo.push_error_reply();

        assert_eq!(convo.len(), 4);
        assert_eq!(convo.messages()[2].text, "Partial");
    }

    #[test]
    fn test_failed_turn_left_out_of_completed_history() {
        let mut convo = Conversation::new();
        convo.push_user("first");
        convo.apply_chunk("answer");
        convo.finish_reply();
        convo.push_user("second");
        convo.apply_chunk("half an ans");
        convo.push_error_reply();
        convo.push_user("third");

        let texts: Vec<&str> = convo.completed_history().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "answer", "third"]);
        assert_eq!(convo.history().len(), 6);
        assert!(convo.messages()[4].failed);
    }

    #[test]
    fn test_failed_flag_only_serialized_when_set() {
        let ok = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert!(ok.get("failed").is_none());

        let mut convo = Conversation::new();
        convo.push_user("hi");
        let apology = serde_json::to_value(convo.push_error_reply()).unwrap();
        assert_eq!(apology["failed"], true);
    }

    #[test]
    fn test_serde_roundtrip_keeps_transcript() {
        let mut convo = Conversation::new();
        convo.push_user("hi");
        let json = serde_json::to_string(&convo).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, convo.id);
        assert_eq!(back.messages(), convo.messages());
    }
}
