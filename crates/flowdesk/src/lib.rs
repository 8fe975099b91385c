//! Flowdesk client library.
//!
//! This library implements the realtime message-stream client behind the
//! workflow console's chat widget: a long-lived push connection with bounded
//! reconnect backoff, alias-tolerant event normalization, dedup/scope
//! filtering, and optimistic-send reconciliation, plus the messages REST
//! client the widget sends through.

pub mod auth;
pub mod chat;
pub mod messages;
pub mod settings;
