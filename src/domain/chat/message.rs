//! Chat message entity and its wire view.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{MessageId, RoomId, Timestamp, UserId, ValidationError};

/// Lifecycle of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Active,
    Deleted,
}

impl MessageStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Active => "active",
            MessageStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MessageStatus::Active),
            "deleted" => Ok(MessageStatus::Deleted),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown message status '{}'", other),
            )),
        }
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub group_id: RoomId,
    pub sender_id: UserId,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: Timestamp,
}

/// A message about to be persisted.
///
/// Construction validates the content; the sender always comes from the
/// verified identity of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub group_id: RoomId,
    pub sender_id: UserId,
    pub content: String,
}

impl NewMessage {
    /// Validates and builds a new message.
    ///
    /// Content must contain at least one non-whitespace character and be at
    /// most `max_length` characters long.
    pub fn new(
        group_id: RoomId,
        sender_id: UserId,
        content: impl Into<String>,
        max_length: usize,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        let length = content.chars().count();
        if length > max_length {
            return Err(ValidationError::too_long("content", max_length, length));
        }
        Ok(Self {
            group_id,
            sender_id,
            content,
        })
    }
}

/// Wire representation of a message, sent in `CHAT_CREATE_MESSAGE` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub group_id: RoomId,
    pub sender_id: UserId,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: Timestamp,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            group_id: message.group_id,
            sender_id: message.sender_id.clone(),
            content: message.content.clone(),
            status: message.status,
            created_at: message.created_at,
        }
    }
}
