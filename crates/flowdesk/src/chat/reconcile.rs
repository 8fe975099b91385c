//! Optimistic send reconciliation.
//!
//! A submitted message is rendered immediately as a pending placeholder and
//! later replaced in place by its authoritative echo from the stream. The
//! send request and the echo are independent operations with no ordering
//! guarantee between them; this module makes the two paths converge on one
//! visible message.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

use super::log::MessageLog;
use flowdesk_protocol::{ChatMessage, SenderKind};

/// Generate a local message id: millisecond timestamp plus a random hex
/// suffix, distinct from any server-assigned id until reconciled.
pub fn generate_local_id() -> String {
    format!("{}-{:x}", Utc::now().timestamp_millis(), rand::random::<u64>())
}

/// An in-flight user submission awaiting its echo.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub local_id: String,
    pub thread_id: String,
    /// Trimmed submission text; echoes match on this.
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

/// Tracks unresolved placeholders in submission order.
#[derive(Debug, Default)]
pub struct Reconciler {
    pending: VecDeque<PendingSend>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, send: PendingSend) {
        self.pending.push_back(send);
    }

    pub fn unresolved(&self) -> usize {
        self.pending.len()
    }

    /// Merge an accepted stream event into its placeholder, if it is an echo.
    ///
    /// An echo is a `User` event in the placeholder's thread whose trimmed
    /// text equals the submission text. When several placeholders share the
    /// same text the oldest unresolved one is matched; two rapid identical
    /// submissions can therefore swap confirmations, which the send contract
    /// gives no way to disambiguate.
    ///
    /// Returns true when the event replaced a placeholder (the log length is
    /// unchanged); false means the caller should append it as a new message.
    pub fn reconcile(&mut self, message: &ChatMessage, log: &mut MessageLog) -> bool {
        if message.sender_kind != SenderKind::User {
            return false;
        }
        let text = message.text.trim();
        let Some(position) = self
            .pending
            .iter()
            .position(|p| p.thread_id == message.thread_id && p.text == text)
        else {
            return false;
        };
        let Some(send) = self.pending.remove(position) else {
            return false;
        };

        match log.find_index_by_id(&send.local_id) {
            Some(index) => log.replace_at(index, message.clone()),
            // Placeholder no longer in the log; keep the authoritative copy.
            None => {
                log.push(message.clone());
                true
            }
        }
    }

    /// Stop tracking a placeholder whose send request failed and flag it in
    /// the log. The server never saw the message, so no echo can arrive.
    pub fn fail(&mut self, local_id: &str, log: &mut MessageLog) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.local_id != local_id);
        let removed = self.pending.len() != before;
        log.mark_failed(local_id) || removed
    }

    /// Flag placeholders that have waited longer than `timeout` for an echo.
    ///
    /// Flagging only: the placeholder stays tracked, so a late echo still
    /// reconciles it. Returns how many placeholders were newly flagged.
    pub fn sweep_stalled(
        &mut self,
        now: DateTime<Utc>,
        timeout: Duration,
        log: &mut MessageLog,
    ) -> usize {
        let mut flagged = 0;
        for send in &self.pending {
            let age = (now - send.submitted_at).to_std().unwrap_or_default();
            if age < timeout {
                continue;
            }
            let already_flagged = log
                .find_index_by_id(&send.local_id)
                .and_then(|i| log.get(i))
                .is_some_and(|m| m.failed);
            if !already_flagged && log.mark_failed(&send.local_id) {
                flagged += 1;
            }
        }
        flagged
    }
}
