//! Alias tables for permissive payload fields.
//!
//! Each logical field has a fixed priority list of key names; the first key
//! that is present with a non-null, non-empty value wins. Adding a new alias
//! is a data change here, not a code change at the call sites.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Message identifier.
pub const ID_FIELDS: &[&str] = &["id", "messageId", "inboxId", "outboxId"];

/// Conversation / thread identifier.
pub const THREAD_FIELDS: &[&str] = &["threadId", "conversationId", "chatId", "topicId"];

/// Who sent the message.
pub const SENDER_FIELDS: &[&str] = &["senderKind", "sender", "role", "from"];

/// Message body text.
pub const TEXT_FIELDS: &[&str] = &["text", "body", "message", "content"];

/// Creation timestamp.
pub const CREATED_FIELDS: &[&str] = &["createDate", "createdAt", "createTime", "createdOn"];

/// Update timestamp (mailbox read marker).
pub const UPDATED_FIELDS: &[&str] = &["updateDate", "updatedAt", "updateTime", "updatedOn"];

/// Mail subject line.
pub const SUBJECT_FIELDS: &[&str] = &["subject", "title", "topic"];

/// Sender email address.
pub const FROM_EMAIL_FIELDS: &[&str] = &["fromEmail", "senderEmail", "emailFrom", "from"];

/// Recipient email address.
pub const TO_EMAIL_FIELDS: &[&str] = &["toEmail", "receiverEmail", "emailTo", "to"];

/// Resolve a field against its alias list.
///
/// Returns the first value that is present, non-null, and (for strings)
/// non-empty.
pub fn get_field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::Null) => continue,
            Some(Value::String(s)) if s.is_empty() => continue,
            Some(v) => return Some(v),
            None => continue,
        }
    }
    None
}

/// Resolve a field to an owned string.
///
/// Numeric identifiers are accepted and rendered in decimal, matching the
/// backend's habit of returning integer ids.
pub fn get_string(obj: &Value, keys: &[&str]) -> Option<String> {
    match get_field(obj, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Resolve a timestamp field, tolerating RFC 3339 strings and unix epoch
/// values in seconds or milliseconds.
pub fn get_timestamp(obj: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    match get_field(obj, keys)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let n = n.as_i64()?;
            // Heuristic: epoch seconds fit well under 1e12, millis do not.
            if n >= 1_000_000_000_000 {
                DateTime::<Utc>::from_timestamp_millis(n)
            } else {
                DateTime::<Utc>::from_timestamp(n, 0)
            }
        }
        _ => None,
    }
}
