//! Messages service client module.
//!
//! Wraps the console's messages REST endpoints: send, inbox/outbox listing,
//! and mark-read.

mod client;
mod error;

use async_trait::async_trait;

pub use client::MessagesClient;
pub use error::{MessagesError, MessagesResult};

use flowdesk_protocol::{OutgoingMessage, SendAck};

/// Minimal send abstraction so the chat panel can be tested without HTTP.
#[async_trait]
pub trait SendApi: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> MessagesResult<SendAck>;
}

#[async_trait]
impl SendApi for MessagesClient {
    async fn send(&self, message: &OutgoingMessage) -> MessagesResult<SendAck> {
        self.send(message).await
    }
}
