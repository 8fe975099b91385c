//! End-to-end chat client tests against a scripted transport.

use serde_json::json;
use std::time::Duration;

use flowdesk::chat::{ChatConfig, ChatError, ChatPanel, ConnectionState};
use flowdesk_protocol::SenderKind;

mod common;
use common::{ChannelTransport, FakeSender, wait_for};

const THREAD: &str = "t-1";

fn config() -> ChatConfig {
    ChatConfig::new(THREAD)
}

fn frame(id: &str, sender: &str, text: &str) -> serde_json::Value {
    json!({
        "id": id,
        "threadId": THREAD,
        "senderKind": sender,
        "text": text,
        "createdAt": "2025-12-15T10:00:00Z"
    })
}

#[tokio::test(start_paused = true)]
async fn test_submit_then_echo_reconciles_in_place() {
    let (transport, feed) = ChannelTransport::single();
    let sender = FakeSender::new();
    let mut handle = ChatPanel::start(config(), transport, sender.clone());

    feed.open();
    wait_for(&handle, |s| s.connection == ConnectionState::Open).await;
    let before = handle.snapshot().messages.len();

    handle.submit("Approve leave request #42").await.unwrap();
    let snapshot = wait_for(&handle, |s| s.messages.len() == before + 1).await;
    assert!(snapshot.messages[0].pending);
    assert_eq!(snapshot.messages[0].sender_kind, SenderKind::User);

    // The authoritative echo arrives on the stream.
    feed.frame(frame("m-echo-1", "user", "Approve leave request #42"));
    let snapshot = wait_for(&handle, |s| !s.messages[0].pending).await;

    // Replaced in place: the log grew by exactly one over the whole exchange.
    assert_eq!(snapshot.messages.len(), before + 1);
    assert_eq!(snapshot.messages[0].id, "m-echo-1");
    assert!(!snapshot.messages[0].failed);
    // The user's own echo does not clear the composing indicator.
    assert!(snapshot.status.responder_composing);

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "Approve leave request #42");
    assert_eq!(sent[0].thread_id, THREAD);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_frames_are_admitted_once() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());

    feed.open();
    feed.frame(frame("m-100", "agent", "first"));
    feed.frame(frame("m-100", "agent", "second copy"));

    let snapshot = wait_for(&handle, |s| s.stats.duplicate == 1).await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].text, "first");
    assert_eq!(snapshot.stats.accepted, 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_scope_isolation() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());

    feed.open();
    feed.frame(json!({ "id": "o-1", "threadId": "other", "text": "not ours" }));
    feed.frame(frame("m-1", "agent", "ours"));
    feed.frame(json!({ "id": "o-2", "conversationId": "other", "text": "still not ours" }));

    let snapshot = wait_for(&handle, |s| s.stats.wrong_scope == 2).await;
    assert_eq!(snapshot.messages.len(), 1);
    assert!(snapshot.messages.iter().all(|m| m.thread_id == THREAD));

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_unidentified_frames_are_counted_and_dropped() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());

    feed.open();
    feed.frame(json!({ "threadId": THREAD, "text": "who am i" }));

    let snapshot = wait_for(&handle, |s| s.stats.no_id == 1).await;
    assert!(snapshot.messages.is_empty());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frame_is_dropped_without_breaking_the_stream() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());

    feed.open();
    feed.raw_frame("{definitely not json");
    feed.frame(frame("m-1", "agent", "still alive"));

    let snapshot = wait_for(&handle, |s| s.stats.accepted == 1).await;
    assert_eq!(snapshot.connection, ConnectionState::Open);
    assert_eq!(snapshot.messages[0].text, "still alive");

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_flags_placeholder_and_clears_status() {
    let (transport, feed) = ChannelTransport::single();
    let sender = FakeSender::failing();
    let mut handle = ChatPanel::start(config(), transport, sender);

    feed.open();
    wait_for(&handle, |s| s.connection == ConnectionState::Open).await;

    let result = handle.submit("doomed message").await;
    assert!(matches!(result, Err(ChatError::Send(_))));

    let snapshot = wait_for(&handle, |s| s.messages.first().is_some_and(|m| m.failed)).await;
    // The drafted content stays visible.
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].text, "doomed message");
    assert!(!snapshot.status.responder_composing);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_empty_submission_is_rejected() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());
    feed.open();

    let result = handle.submit("   ").await;
    assert!(matches!(result, Err(ChatError::EmptyMessage)));
    assert!(handle.snapshot().messages.is_empty());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_agent_reply_clears_composing() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());

    feed.open();
    wait_for(&handle, |s| s.connection == ConnectionState::Open).await;

    handle.submit("question").await.unwrap();
    wait_for(&handle, |s| s.status.responder_composing).await;

    feed.frame(frame("m-2", "agent", "answer"));
    let snapshot = wait_for(&handle, |s| !s.status.responder_composing).await;
    assert_eq!(snapshot.messages.len(), 2);

    handle.stop().await;
}

#[tokio::test]
async fn test_unconfirmed_placeholder_is_flagged_after_timeout() {
    let (transport, feed) = ChannelTransport::single();
    let mut config = config();
    config.pending_timeout = Duration::from_millis(200);
    config.sweep_interval = Duration::from_millis(50);
    let mut handle = ChatPanel::start(config, transport, FakeSender::new());

    feed.open();
    wait_for(&handle, |s| s.connection == ConnectionState::Open).await;

    handle.submit("lost in transit").await.unwrap();
    let snapshot = wait_for(&handle, |s| s.messages.first().is_some_and(|m| m.failed)).await;
    assert!(snapshot.messages[0].pending);

    // A late echo still reconciles the flagged placeholder.
    feed.frame(frame("m-late", "user", "lost in transit"));
    let snapshot = wait_for(&handle, |s| !s.messages[0].pending).await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].id, "m-late");
    assert!(!snapshot.messages[0].failed);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dedup_registry_survives_reconnect() {
    let (transport, feeds) = ChannelTransport::with_connections(2);
    let mut handle = ChatPanel::start(config(), transport.clone(), FakeSender::new());

    feeds[0].open();
    feeds[0].frame(frame("m-1", "agent", "before the drop"));
    wait_for(&handle, |s| s.stats.accepted == 1).await;

    feeds[0].error("connection reset");
    wait_for(&handle, |s| s.connection == ConnectionState::Reconnecting).await;

    // Second connection: the same id is a duplicate, a new one is accepted.
    feeds[1].open();
    feeds[1].frame(frame("m-1", "agent", "replayed"));
    feeds[1].frame(frame("m-2", "agent", "fresh"));

    let snapshot = wait_for(&handle, |s| s.stats.duplicate == 1).await;
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.stats.accepted, 2);
    assert_eq!(transport.connect_count(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_reopening_the_panel_resets_dedup_memory() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());
    feed.open();
    feed.frame(frame("m-1", "agent", "hello"));
    wait_for(&handle, |s| s.stats.accepted == 1).await;
    handle.stop().await;

    // Fresh panel session: the registry starts empty, so the same id is new.
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());
    feed.open();
    feed.frame(frame("m-1", "agent", "hello again"));

    let snapshot = wait_for(&handle, |s| s.stats.accepted == 1).await;
    assert_eq!(snapshot.stats.duplicate, 0);
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].text, "hello again");

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_closing_during_reconnect_cancels_the_retry() {
    let (transport, feeds) = ChannelTransport::with_connections(1);
    let mut handle = ChatPanel::start(config(), transport.clone(), FakeSender::new());

    feeds[0].open();
    wait_for(&handle, |s| s.connection == ConnectionState::Open).await;
    feeds[0].error("gone");
    wait_for(&handle, |s| s.connection == ConnectionState::Reconnecting).await;

    handle.stop().await;

    // Well past every backoff delay: no further attempt was made.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_panel_rejects_operations() {
    let (transport, feed) = ChannelTransport::single();
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());
    feed.open();

    handle.stop().await;
    let result = handle.submit("too late").await;
    assert!(matches!(result, Err(ChatError::PanelClosed)));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_attempt_counter_is_visible_and_resets() {
    let (transport, feeds) = ChannelTransport::with_connections(2);
    let mut handle = ChatPanel::start(config(), transport, FakeSender::new());

    feeds[0].open();
    wait_for(&handle, |s| s.connection == ConnectionState::Open).await;
    feeds[0].error("first drop");

    wait_for(&handle, |s| s.reconnect_attempt == 1).await;

    feeds[1].open();
    let snapshot = wait_for(&handle, |s| s.connection == ConnectionState::Open).await;
    assert_eq!(snapshot.reconnect_attempt, 0);

    handle.stop().await;
}
