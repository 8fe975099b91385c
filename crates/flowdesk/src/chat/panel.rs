//! Panel lifecycle and the consumer task.
//!
//! `ChatPanel::start` wires the stream task, the send path, and all mutable
//! chat state into one consumer task; `PanelHandle::stop` tears everything
//! down. A fresh start gets a fresh seen-id registry, log, and attempt
//! counter: dedup memory survives reconnects within one open session, never
//! a hide/show cycle.

use chrono::Utc;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::error::{ChatError, ChatResult};
use super::filter::{Admission, FilterStats, ScopeFilter};
use super::log::MessageLog;
use super::normalize;
use super::reconcile::{PendingSend, Reconciler, generate_local_id};
use super::status::StatusSignal;
use super::stream::{ConnectionManager, StreamTransport};
use super::types::{ConnectionState, StreamSignal, StreamStatus};
use super::ChatConfig;
use crate::messages::{MessagesResult, SendApi};
use flowdesk_protocol::{ChatMessage, OutgoingMessage, SendAck, SenderKind};

/// Buffer for stream frames and status transitions.
const SIGNAL_BUFFER_SIZE: usize = 256;

/// Buffer for handle commands and send completions.
const COMMAND_BUFFER_SIZE: usize = 64;

/// Rendered view state, published after every change.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    pub messages: Vec<ChatMessage>,
    pub status: StatusSignal,
    pub connection: ConnectionState,
    pub reconnect_attempt: u32,
    pub stats: FilterStats,
}

impl PanelSnapshot {
    fn initial() -> Self {
        Self {
            messages: Vec::new(),
            status: StatusSignal::default(),
            connection: ConnectionState::Connecting,
            reconnect_attempt: 0,
            stats: FilterStats::default(),
        }
    }
}

enum PanelCommand {
    Submit {
        text: String,
        ack: oneshot::Sender<ChatResult<SendAck>>,
    },
    Stop,
}

struct SendOutcome {
    local_id: String,
    result: MessagesResult<SendAck>,
    ack: oneshot::Sender<ChatResult<SendAck>>,
}

/// The chat widget core.
pub struct ChatPanel;

impl ChatPanel {
    /// Open the panel: spawn the consumer task and the stream task.
    pub fn start(
        config: ChatConfig,
        transport: Arc<dyn StreamTransport>,
        sender: Arc<dyn SendApi>,
    ) -> PanelHandle {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_BUFFER_SIZE);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (outcome_tx, outcome_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (snapshot_tx, snapshot_rx) = watch::channel(PanelSnapshot::initial());

        let mut manager = ConnectionManager::new();
        manager.open(transport, signal_tx);

        let filter = ScopeFilter::new(config.thread_id.clone());
        let consumer = Consumer {
            config,
            manager,
            filter,
            log: MessageLog::new(),
            reconciler: Reconciler::new(),
            status: StatusSignal::default(),
            connection: ConnectionState::Connecting,
            reconnect_attempt: 0,
            sender,
            outcome_tx,
            snapshot_tx,
        };
        let task = tokio::spawn(consumer.run(signal_rx, cmd_rx, outcome_rx));

        PanelHandle {
            cmd_tx,
            snapshot_rx,
            task: Some(task),
        }
    }
}

/// Handle to an open panel. Dropping it tears the panel down.
pub struct PanelHandle {
    cmd_tx: mpsc::Sender<PanelCommand>,
    snapshot_rx: watch::Receiver<PanelSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl PanelHandle {
    /// Submit a message.
    ///
    /// The placeholder appears in the log immediately; the returned future
    /// resolves when the send request itself completes. A send failure
    /// leaves the placeholder visible, flagged failed.
    pub async fn submit(&self, text: &str) -> ChatResult<SendAck> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let command = PanelCommand::Submit {
            text: text.to_string(),
            ack: ack_tx,
        };
        if self.cmd_tx.send(command).await.is_err() {
            return Err(ChatError::PanelClosed);
        }
        ack_rx.await.unwrap_or(Err(ChatError::PanelClosed))
    }

    /// Current view state.
    pub fn snapshot(&self) -> PanelSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to view-state changes.
    pub fn watch(&self) -> watch::Receiver<PanelSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Close the panel: terminate the connection, cancel timers, drop state.
    ///
    /// Safe to call more than once; operations on a stopped handle fail with
    /// `ChatError::PanelClosed`.
    pub async fn stop(&mut self) {
        let _ = self.cmd_tx.send(PanelCommand::Stop).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PanelHandle {
    fn drop(&mut self) {
        // Abnormal teardown: kill the consumer; the stream task exits on its
        // closed channel, and late send resolutions are discarded.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Consumer {
    config: ChatConfig,
    manager: ConnectionManager,
    filter: ScopeFilter,
    log: MessageLog,
    reconciler: Reconciler,
    status: StatusSignal,
    connection: ConnectionState,
    reconnect_attempt: u32,
    sender: Arc<dyn SendApi>,
    outcome_tx: mpsc::Sender<SendOutcome>,
    snapshot_tx: watch::Sender<PanelSnapshot>,
}

impl Consumer {
    async fn run(
        mut self,
        mut signal_rx: mpsc::Receiver<StreamSignal>,
        mut cmd_rx: mpsc::Receiver<PanelCommand>,
        mut outcome_rx: mpsc::Receiver<SendOutcome>,
    ) {
        let mut sweep = tokio::time::interval(self.config.sweep_interval);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = cmd_rx.recv() => match command {
                    Some(PanelCommand::Submit { text, ack }) => self.handle_submit(text, ack),
                    Some(PanelCommand::Stop) | None => break,
                },
                signal = signal_rx.recv() => match signal {
                    Some(signal) => self.handle_signal(signal),
                    // Stream task gone; nothing more will arrive.
                    None => break,
                },
                Some(outcome) = outcome_rx.recv() => self.handle_outcome(outcome),
                _ = sweep.tick() => self.handle_sweep(),
            }
        }

        self.manager.close();
        self.connection = ConnectionState::Closed;
    }

    fn handle_submit(&mut self, text: String, ack: oneshot::Sender<ChatResult<SendAck>>) {
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            let _ = ack.send(Err(ChatError::EmptyMessage));
            return;
        }

        let local_id = generate_local_id();
        let now = Utc::now();
        // Seen immediately: if the server happens to reuse this id, the
        // frame is a duplicate, not a second append.
        self.filter.mark_seen(&local_id);
        self.log.push(ChatMessage {
            id: local_id.clone(),
            thread_id: self.config.thread_id.clone(),
            sender_kind: SenderKind::User,
            text: trimmed.clone(),
            created_at: now,
            pending: true,
            failed: false,
        });
        self.reconciler.track(PendingSend {
            local_id: local_id.clone(),
            thread_id: self.config.thread_id.clone(),
            text: trimmed.clone(),
            submitted_at: now,
        });
        self.publish();

        let outgoing = OutgoingMessage {
            thread_id: self.config.thread_id.clone(),
            sender_kind: SenderKind::User,
            text: trimmed,
        };
        let sender = Arc::clone(&self.sender);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = sender.send(&outgoing).await;
            // After panel teardown the channel is closed and the result is
            // dropped on the floor.
            let _ = outcome_tx
                .send(SendOutcome {
                    local_id,
                    result,
                    ack,
                })
                .await;
        });
    }

    fn handle_outcome(&mut self, outcome: SendOutcome) {
        match outcome.result {
            Ok(send_ack) => {
                self.status.on_submit_acked();
                let _ = outcome.ack.send(Ok(send_ack));
            }
            Err(err) => {
                self.reconciler.fail(&outcome.local_id, &mut self.log);
                self.status.on_send_failed();
                let _ = outcome.ack.send(Err(ChatError::Send(err)));
            }
        }
        self.publish();
    }

    fn handle_signal(&mut self, signal: StreamSignal) {
        match signal {
            StreamSignal::Frame(value) => self.handle_frame(&value),
            StreamSignal::Status(status) => {
                match &status {
                    StreamStatus::Connected => {
                        self.connection = ConnectionState::Open;
                        self.reconnect_attempt = 0;
                    }
                    StreamStatus::Disconnected { .. } => {
                        self.connection = ConnectionState::Reconnecting;
                    }
                    StreamStatus::Reconnecting { attempt, .. } => {
                        self.connection = ConnectionState::Reconnecting;
                        self.reconnect_attempt = *attempt;
                    }
                }
                self.status.on_stream(&status);
                self.publish();
            }
        }
    }

    fn handle_frame(&mut self, raw: &serde_json::Value) {
        let candidate = normalize::normalize(raw);
        match self.filter.admit(&candidate) {
            Admission::Accepted => {
                let Some(message) = candidate.into_message() else {
                    // Admitted candidates always carry id and thread.
                    return;
                };
                self.status.on_accepted(message.sender_kind);
                if !self.reconciler.reconcile(&message, &mut self.log) {
                    self.log.push(message);
                }
            }
            outcome => debug!("Frame ignored: {:?}", outcome),
        }
        self.publish();
    }

    fn handle_sweep(&mut self) {
        let flagged =
            self.reconciler
                .sweep_stalled(Utc::now(), self.config.pending_timeout, &mut self.log);
        if flagged > 0 {
            self.publish();
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(PanelSnapshot {
            messages: self.log.snapshot(),
            status: self.status,
            connection: self.connection,
            reconnect_attempt: self.reconnect_attempt,
            stats: self.filter.stats(),
        });
    }
}
