//! Canonical message types.
//!
//! A `ChatMessage` is the record the chat widget renders. Client-originated
//! messages carry a locally generated id until the server echo replaces them
//! with the authoritative one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use crate::fields;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// A human participant (the console user or a human responder).
    User,
    /// The automated responder.
    Agent,
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

impl std::str::FromStr for SenderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "me" | "human" => Ok(Self::User),
            "agent" | "assistant" | "bot" | "ai" | "other" => Ok(Self::Agent),
            _ => Err(format!("Unknown sender kind: {}", s)),
        }
    }
}

/// A chat message as rendered by the widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Globally unique within one panel session. Locally generated for
    /// client-originated messages until reconciled with the server echo.
    pub id: String,
    /// Conversation scope this message belongs to.
    pub thread_id: String,
    /// Who sent it.
    pub sender_kind: SenderKind,
    /// Message body.
    pub text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// True while the message is an optimistic placeholder awaiting its echo.
    pub pending: bool,
    /// True when the send request failed or the echo never arrived; the
    /// message stays visible so the user does not lose drafted content.
    #[serde(default)]
    pub failed: bool,
}

/// A user-submitted message on its way to the send endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub thread_id: String,
    pub sender_kind: SenderKind,
    pub text: String,
}

impl OutgoingMessage {
    /// Build the send payload.
    ///
    /// The backend model's key names differ between service builds, so the
    /// payload duplicates each field under every accepted alias.
    pub fn to_wire(&self) -> Value {
        json!({
            "threadId": self.thread_id,
            "conversationId": self.thread_id,
            "senderKind": self.sender_kind,
            "sender": self.sender_kind,
            "text": self.text,
            "body": self.text,
            "message": self.text,
            "content": self.text,
        })
    }
}

/// Acknowledgement returned by the send endpoint.
///
/// The payload carries no guaranteed correlation to the eventual stream echo;
/// the id, when present, is only useful for display.
#[derive(Debug, Clone, Default)]
pub struct SendAck {
    pub id: Option<String>,
}

impl SendAck {
    /// Parse a send response body, tolerating the usual id aliases.
    pub fn from_value(raw: &Value) -> Self {
        Self {
            id: fields::get_string(raw, fields::ID_FIELDS),
        }
    }
}

/// A normalized mailbox entry (inbox or outbox listing).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxMessage {
    pub id: Option<String>,
    pub subject: String,
    pub body: String,
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub create_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
    /// Original payload, kept for fields the canonical shape drops.
    pub raw: Value,
}

impl MailboxMessage {
    /// Normalize a raw mailbox record.
    pub fn from_value(raw: Value) -> Self {
        let id = fields::get_string(&raw, fields::ID_FIELDS);
        let subject = fields::get_string(&raw, fields::SUBJECT_FIELDS)
            .unwrap_or_else(|| "(no subject)".to_string());
        let body = fields::get_string(&raw, fields::TEXT_FIELDS).unwrap_or_default();
        let from_email = fields::get_string(&raw, fields::FROM_EMAIL_FIELDS);
        let to_email = fields::get_string(&raw, fields::TO_EMAIL_FIELDS);
        let create_date = fields::get_timestamp(&raw, fields::CREATED_FIELDS);
        let update_date = fields::get_timestamp(&raw, fields::UPDATED_FIELDS);

        Self {
            id,
            subject,
            body,
            from_email,
            to_email,
            create_date,
            update_date,
            raw,
        }
    }

    /// An inbox entry with no update timestamp has not been read yet; an
    /// outbox entry with none has not been delivered yet.
    pub fn is_unread(&self) -> bool {
        self.update_date.is_none()
    }
}
