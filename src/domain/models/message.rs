use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Upper bound for `content`, counted in characters.
pub const MAX_CONTENT_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
    Cancelled,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
            MessageStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MessageStatus::Pending)
    }

    /// Only `pending` may move, and only into a terminal state.
    pub fn can_transition_to(&self, next: MessageStatus) -> bool {
        matches!(self, MessageStatus::Pending) && next.is_terminal()
    }
}

impl FromStr for MessageStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            "cancelled" => Ok(MessageStatus::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown message status {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub destination: String,
    pub content: String,
    pub status: MessageStatus,
    pub delivery_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == MessageStatus::Pending && self.scheduled_at <= now
    }
}

/// A message as submitted by a caller, before the repository assigns an id.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub destination: String,
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.destination.trim().is_empty() {
            return Err(DomainError::Validation(
                "destination must not be empty".to_string(),
            ));
        }
        validate_content(&self.content)
    }
}

pub fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.is_empty() {
        return Err(DomainError::Validation(
            "content must not be empty".to_string(),
        ));
    }
    let length = content.chars().count();
    if length > MAX_CONTENT_LENGTH {
        return Err(DomainError::Validation(format!(
            "content is {length} characters long, maximum is {MAX_CONTENT_LENGTH}"
        )));
    }
    Ok(())
}
