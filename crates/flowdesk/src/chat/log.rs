//! Ordered message log.
//!
//! Append-mostly: the only in-place mutations are placeholder reconciliation
//! (replace at the same position) and failure flagging.

use flowdesk_protocol::ChatMessage;

/// The messages driving the rendered view, in arrival order.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(message);
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    /// Index of the message with the given id.
    pub fn find_index_by_id(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|m| m.id == id)
    }

    /// Replace the entry at `index`, keeping its log position.
    pub fn replace_at(&mut self, index: usize, message: ChatMessage) -> bool {
        match self.entries.get_mut(index) {
            Some(slot) => {
                *slot = message;
                true
            }
            None => false,
        }
    }

    /// Flag the message with the given id as failed, keeping it visible.
    pub fn mark_failed(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.failed = true;
                true
            }
            None => false,
        }
    }

    /// Clone of the current view state.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.clone()
    }
}
