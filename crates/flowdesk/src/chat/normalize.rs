//! Event normalization.
//!
//! Incoming frames arrive in whatever key casing the producing service build
//! uses. Normalization resolves each logical field through its alias table
//! (see `flowdesk_protocol::fields`) into one candidate record; admission is
//! decided downstream by the scope filter.

use chrono::{DateTime, Utc};
use serde_json::Value;

use flowdesk_protocol::{ChatMessage, SenderKind, fields};

/// A normalized event candidate.
///
/// `id` and `thread_id` stay optional here: their absence is an admission
/// outcome (`NoId` / `WrongScope`), not a parse failure.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Option<String>,
    pub thread_id: Option<String>,
    pub sender_kind: SenderKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Map a raw decoded frame onto a candidate record.
pub fn normalize(raw: &Value) -> Candidate {
    let sender_kind = fields::get_string(raw, fields::SENDER_FIELDS)
        .and_then(|s| s.parse().ok())
        // Unknown sender labels belong to the responder side; only explicit
        // user markers may match optimistic placeholders.
        .unwrap_or(SenderKind::Agent);

    Candidate {
        id: fields::get_string(raw, fields::ID_FIELDS),
        thread_id: fields::get_string(raw, fields::THREAD_FIELDS),
        sender_kind,
        text: fields::get_string(raw, fields::TEXT_FIELDS).unwrap_or_default(),
        created_at: fields::get_timestamp(raw, fields::CREATED_FIELDS).unwrap_or_else(Utc::now),
    }
}

impl Candidate {
    /// Finish the candidate into a log-ready message.
    ///
    /// Returns `None` when the id or thread is unresolved; admitted
    /// candidates always have both.
    pub fn into_message(self) -> Option<ChatMessage> {
        let id = self.id?;
        let thread_id = self.thread_id?;
        Some(ChatMessage {
            id,
            thread_id,
            sender_kind: self.sender_kind,
            text: self.text,
            created_at: self.created_at,
            pending: false,
            failed: false,
        })
    }
}
