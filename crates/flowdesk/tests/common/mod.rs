//! Test utilities: scripted stream transport and a fake send endpoint.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use flowdesk::chat::{PanelHandle, PanelSnapshot, StreamTransport, TransportError, TransportEvent, TransportStream};
use flowdesk::messages::{MessagesError, MessagesResult, SendApi};
use flowdesk_protocol::{OutgoingMessage, SendAck};

type FeedItem = Result<TransportEvent, TransportError>;

/// Hand-driven side of one scripted connection.
pub struct StreamFeed {
    tx: mpsc::UnboundedSender<FeedItem>,
}

impl StreamFeed {
    /// Report the connection as established.
    pub fn open(&self) {
        let _ = self.tx.send(Ok(TransportEvent::Opened));
    }

    /// Deliver one JSON event.
    pub fn frame(&self, value: Value) {
        let _ = self.tx.send(Ok(TransportEvent::Frame(value.to_string())));
    }

    /// Deliver one raw (possibly malformed) event payload.
    pub fn raw_frame(&self, data: &str) {
        let _ = self.tx.send(Ok(TransportEvent::Frame(data.to_string())));
    }

    /// Fail the connection.
    pub fn error(&self, reason: &str) {
        let _ = self
            .tx
            .send(Err(TransportError::Stream(reason.to_string())));
    }
}

/// Transport whose connections are driven by the test through channels.
///
/// Each `connect` call consumes the next scripted connection; once the
/// script is exhausted, further connections just hang.
pub struct ChannelTransport {
    connections: Mutex<VecDeque<mpsc::UnboundedReceiver<FeedItem>>>,
    connects: AtomicUsize,
}

impl ChannelTransport {
    pub fn with_connections(count: usize) -> (Arc<Self>, Vec<StreamFeed>) {
        let mut feeds = Vec::new();
        let mut connections = VecDeque::new();
        for _ in 0..count {
            let (tx, rx) = mpsc::unbounded_channel();
            feeds.push(StreamFeed { tx });
            connections.push_back(rx);
        }
        (
            Arc::new(Self {
                connections: Mutex::new(connections),
                connects: AtomicUsize::new(0),
            }),
            feeds,
        )
    }

    pub fn single() -> (Arc<Self>, StreamFeed) {
        let (transport, mut feeds) = Self::with_connections(1);
        (transport, feeds.remove(0))
    }

    /// How many connection attempts the manager has made.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl StreamTransport for ChannelTransport {
    fn connect(&self) -> TransportStream {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.connections.lock().unwrap().pop_front() {
            Some(rx) => Box::pin(UnboundedReceiverStream::new(rx)),
            None => Box::pin(futures::stream::pending()),
        }
    }
}

/// Send endpoint double with a switchable failure mode.
#[derive(Default)]
pub struct FakeSender {
    fail: AtomicBool,
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl FakeSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sender = Self::default();
        sender.fail.store(true, Ordering::SeqCst);
        Arc::new(sender)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SendApi for FakeSender {
    async fn send(&self, message: &OutgoingMessage) -> MessagesResult<SendAck> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail.load(Ordering::SeqCst) {
            Err(MessagesError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
        } else {
            Ok(SendAck {
                id: Some("ack-1".to_string()),
            })
        }
    }
}

/// Wait until the panel publishes a snapshot satisfying `predicate`.
pub async fn wait_for<F>(handle: &PanelHandle, mut predicate: F) -> PanelSnapshot
where
    F: FnMut(&PanelSnapshot) -> bool,
{
    let mut rx = handle.watch();
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if predicate(&snapshot) {
                return snapshot;
            }
            rx.changed().await.expect("panel task ended");
        }
    })
    .await
    .expect("condition not reached in time")
}
