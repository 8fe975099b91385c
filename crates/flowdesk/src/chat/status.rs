//! Derived typing/status indicator.
//!
//! Purely derived from the event flow; holds no authority over message data.

use serde::Serialize;

use super::types::StreamStatus;
use flowdesk_protocol::SenderKind;

/// The widget's status badge state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSignal {
    /// True while the responder is expected to be composing a reply: set on
    /// a successful submit acknowledgement, cleared by the first accepted
    /// non-user event or by a send failure.
    pub responder_composing: bool,
    /// Connection health for the badge.
    pub connected: bool,
}

impl StatusSignal {
    pub fn on_submit_acked(&mut self) {
        self.responder_composing = true;
    }

    pub fn on_send_failed(&mut self) {
        self.responder_composing = false;
    }

    pub fn on_accepted(&mut self, sender: SenderKind) {
        if sender != SenderKind::User {
            self.responder_composing = false;
        }
    }

    pub fn on_stream(&mut self, status: &StreamStatus) {
        self.connected = matches!(status, StreamStatus::Connected);
    }
}
