//! Stream connection manager.
//!
//! Owns the push-connection lifecycle: one transport task per open panel,
//! reconnecting after failures on a fixed delay schedule. Frames and status
//! transitions travel over one channel to the consumer task, preserving
//! arrival order.

use futures::{Stream, StreamExt};
use log::{debug, warn};
use reqwest_eventsource::{Event, EventSource};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::types::{StreamSignal, StreamStatus};
use crate::auth::SharedTokenSource;

/// Fixed reconnect delay schedule; the last entry repeats.
const RECONNECT_SCHEDULE: [Duration; 4] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
];

/// Delay before reconnect attempt `attempt` (1-based).
pub fn reconnect_delay(attempt: u32) -> Duration {
    let index = (attempt.saturating_sub(1) as usize).min(RECONNECT_SCHEDULE.len() - 1);
    RECONNECT_SCHEDULE[index]
}

/// Transport-level errors. Always recoverable: the manager retries per the
/// schedule for as long as the panel stays open.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// An established stream failed.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Events produced by one connection attempt.
#[derive(Debug)]
pub enum TransportEvent {
    /// Connection established; frames follow.
    Opened,
    /// One raw server event payload.
    Frame(String),
}

pub type TransportStream =
    Pin<Box<dyn Stream<Item = Result<TransportEvent, TransportError>> + Send>>;

/// Seam between the reconnect policy and the wire.
///
/// `connect` begins one connection attempt; the returned stream yields
/// `Opened` once established, then one `Frame` per server event. Dropping
/// the stream terminates the connection.
pub trait StreamTransport: Send + Sync + 'static {
    fn connect(&self) -> TransportStream;
}

/// Server-sent-events transport against the messages service.
pub struct SseTransport {
    client: reqwest::Client,
    base_url: String,
    thread_id: String,
    token_source: SharedTokenSource,
}

impl SseTransport {
    pub fn new(
        base_url: impl Into<String>,
        thread_id: impl Into<String>,
        token_source: SharedTokenSource,
    ) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            thread_id: thread_id.into(),
            token_source,
        }
    }
}

impl StreamTransport for SseTransport {
    fn connect(&self) -> TransportStream {
        let url = format!("{}/api/Messages/stream", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("threadId", self.thread_id.as_str())])
            .header("Accept", "text/event-stream");
        // Read-only observation works without a credential.
        if let Some(token) = self.token_source.token() {
            request = request.bearer_auth(token);
        }

        debug!("Connecting to message stream at {}", url);

        match EventSource::new(request) {
            Ok(source) => Box::pin(source.map(|event| match event {
                Ok(Event::Open) => Ok(TransportEvent::Opened),
                Ok(Event::Message(msg)) => Ok(TransportEvent::Frame(msg.data)),
                Err(err) => Err(TransportError::Stream(err.to_string())),
            })),
            Err(err) => Box::pin(futures::stream::once(async move {
                Err(TransportError::Connect(err.to_string()))
            })),
        }
    }
}

/// Guarded owner of the stream task.
///
/// At most one live connection or one pending reconnect sleep exists at any
/// time: `open` while a task is running is a no-op, and `close` aborts the
/// task, cancelling whichever of the two is in flight.
#[derive(Default)]
pub struct ConnectionManager {
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the stream task, delivering signals into `tx`.
    pub fn open(&mut self, transport: Arc<dyn StreamTransport>, tx: mpsc::Sender<StreamSignal>) {
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("Stream already open; ignoring open()");
            return;
        }
        self.task = Some(tokio::spawn(run_stream(transport, tx)));
    }

    /// Terminate the connection and cancel any scheduled reconnect.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}

enum StreamOutcome {
    /// Connection failed or ended; retry per schedule.
    Failed(String),
    /// Consumer is gone; stop retrying.
    ConsumerGone,
}

/// Connect-and-retry loop. Runs until the consumer side of `tx` is dropped
/// or the task is aborted; reconnection is only automatic while the panel
/// holds the receiving end open.
async fn run_stream(transport: Arc<dyn StreamTransport>, tx: mpsc::Sender<StreamSignal>) {
    let mut attempt: u32 = 0;

    loop {
        if attempt > 0 {
            let delay = reconnect_delay(attempt);
            let signal = StreamSignal::Status(StreamStatus::Reconnecting { attempt, delay });
            if tx.send(signal).await.is_err() {
                return;
            }
            tokio::time::sleep(delay).await;
        }

        match stream_once(transport.as_ref(), &tx, &mut attempt).await {
            StreamOutcome::ConsumerGone => return,
            StreamOutcome::Failed(reason) => {
                attempt += 1;
                warn!(
                    "Message stream connection lost (attempt {}): {}",
                    attempt, reason
                );
                let signal = StreamSignal::Status(StreamStatus::Disconnected { reason });
                if tx.send(signal).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Drive one connection until it fails or ends. Resets the attempt counter
/// once the connection reports open.
async fn stream_once(
    transport: &dyn StreamTransport,
    tx: &mpsc::Sender<StreamSignal>,
    attempt: &mut u32,
) -> StreamOutcome {
    let mut frames = transport.connect();

    while let Some(item) = frames.next().await {
        match item {
            Ok(TransportEvent::Opened) => {
                *attempt = 0;
                let signal = StreamSignal::Status(StreamStatus::Connected);
                if tx.send(signal).await.is_err() {
                    return StreamOutcome::ConsumerGone;
                }
            }
            Ok(TransportEvent::Frame(data)) => match serde_json::from_str::<Value>(&data) {
                Ok(value) => {
                    if tx.send(StreamSignal::Frame(value)).await.is_err() {
                        return StreamOutcome::ConsumerGone;
                    }
                }
                // Malformed frames are dropped without touching the
                // connection.
                Err(err) => warn!("Dropping malformed frame: {}", err),
            },
            Err(err) => return StreamOutcome::Failed(err.to_string()),
        }
    }

    StreamOutcome::Failed("stream ended".to_string())
}
