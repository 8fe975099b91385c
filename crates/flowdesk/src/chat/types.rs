//! Chat connection state and channel signal types.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Push connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Panel hidden; no connection, no timers.
    Closed,
    /// First connection attempt of an open panel.
    Connecting,
    /// Live push connection.
    Open,
    /// Connection lost; a retry is scheduled or in flight.
    Reconnecting,
}

/// Status transitions emitted by the stream task.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus {
    /// Push connection established.
    Connected,
    /// Connection lost or failed to open.
    Disconnected { reason: String },
    /// Retry scheduled after a backoff delay.
    Reconnecting { attempt: u32, delay: Duration },
}

/// What the stream task delivers to the consumer task, in arrival order.
#[derive(Debug)]
pub enum StreamSignal {
    /// One decoded server event.
    Frame(Value),
    /// Connection-health transition.
    Status(StreamStatus),
}
