//! Canonical protocol types for the Flowdesk messages service.
//!
//! The messages service is permissive about key names at its boundary: the
//! same logical field may arrive under several aliases depending on which
//! backend build produced it. This crate owns the canonical shapes and the
//! alias tables that map the permissive wire forms onto them.

pub mod fields;
pub mod messages;

pub use messages::{ChatMessage, MailboxMessage, OutgoingMessage, SendAck, SenderKind};
