//! Conversation types
//!
//! The message log is append-only: messages are never edited or removed once
//! pushed, and each message's id is its position in the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm_types::{Message, Role};

/// Sequence id of a message within one session's log
pub type MessageId = usize;

/// Placeholder in prompt and speech templates replaced by the learner's name
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Who produced a message in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// One entry in the message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// View this entry as a completion-API message
    pub fn to_llm_message(&self) -> Message {
        Message::new(self.role.into(), self.content.clone())
    }
}

/// Ordered, append-only message log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id
    pub fn push(&mut self, role: TurnRole, content: impl Into<String>) -> MessageId {
        let id = self.messages.len();
        self.messages.push(ChatMessage {
            id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        id
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.get(id)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages sent by the user
    pub fn user_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == TurnRole::User)
            .count()
    }

    /// Whole log as completion-API messages, in order
    pub fn to_llm_messages(&self) -> Vec<Message> {
        self.messages.iter().map(ChatMessage::to_llm_message).collect()
    }
}

/// What the tutor knows about the learner
///
/// Each field is written at most once; later writes are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    name: Option<String>,
    proficiency: Option<String>,
}

impl UserInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn proficiency(&self) -> Option<&str> {
        self.proficiency.as_deref()
    }

    /// Store the name; returns false if one was already stored
    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        if self.name.is_some() {
            return false;
        }
        self.name = Some(name.into());
        true
    }

    /// Store the proficiency, lower-cased; returns false if already stored
    pub fn set_proficiency(&mut self, level: &str) -> bool {
        if self.proficiency.is_some() {
            return false;
        }
        self.proficiency = Some(level.to_lowercase());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_ids_follow_position() {
        let mut log = MessageLog::new();
        assert_eq!(log.push(TurnRole::Assistant, "欢迎光临！"), 0);
        assert_eq!(log.push(TurnRole::User, "Alex"), 1);
        assert_eq!(log.push(TurnRole::Assistant, "你好，Alex！"), 2);

        assert_eq!(log.len(), 3);
        assert_eq!(log.get(1).map(|m| m.content.as_str()), Some("Alex"));
        assert_eq!(log.last().map(|m| m.id), Some(2));
        assert_eq!(log.user_turns(), 1);
    }

    #[test]
    fn test_log_to_llm_messages() {
        let mut log = MessageLog::new();
        log.push(TurnRole::Assistant, "hello");
        log.push(TurnRole::User, "hi");

        let messages = log.to_llm_messages();
        assert_eq!(messages[0], Message::assistant("hello"));
        assert_eq!(messages[1], Message::user("hi"));
    }

    #[test]
    fn test_user_info_set_once() {
        let mut info = UserInfo::new();
        assert!(info.set_name("Alex"));
        assert!(!info.set_name("Bob"));
        assert_eq!(info.name(), Some("Alex"));

        assert!(info.set_proficiency("Basic"));
        assert!(!info.set_proficiency("fluent"));
        assert_eq!(info.proficiency(), Some("basic"));
    }
}
