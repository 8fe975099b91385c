//! Realtime chat client.
//!
//! The chat widget's core: a push connection that survives drops with a
//! bounded backoff schedule, frame normalization and dedup, and optimistic
//! sends reconciled against their server echoes. All mutable state (message
//! log, seen-id registry, pending sends) is owned by a single consumer task;
//! the transport task only forwards frames over a channel, so arrival order
//! is preserved without locking.

mod error;
mod filter;
mod log;
mod normalize;
mod panel;
mod reconcile;
mod status;
mod stream;
mod types;

pub use error::{ChatError, ChatResult};
pub use filter::{Admission, FilterStats, ScopeFilter};
pub use self::log::MessageLog;
pub use normalize::{Candidate, normalize};
pub use panel::{ChatPanel, PanelHandle, PanelSnapshot};
pub use reconcile::{PendingSend, Reconciler, generate_local_id};
pub use status::StatusSignal;
pub use stream::{
    ConnectionManager, SseTransport, StreamTransport, TransportError, TransportEvent,
    TransportStream, reconnect_delay,
};
pub use types::{ConnectionState, StreamSignal, StreamStatus};

use std::time::Duration;

/// Chat panel configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Conversation scope: only events for this thread are admitted.
    pub thread_id: String,
    /// How long an optimistic message may stay unconfirmed before it is
    /// flagged failed.
    pub pending_timeout: Duration,
    /// How often stalled placeholders are swept.
    pub sweep_interval: Duration,
}

impl ChatConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            pending_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(5),
        }
    }
}
