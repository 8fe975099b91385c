//! Dedup and scope filtering.
//!
//! One `ScopeFilter` exists per open-panel session. Its seen-id registry is
//! append-only for that session: it survives reconnects and is discarded
//! only when the panel is closed and reopened.

use serde::Serialize;
use std::collections::HashSet;

use super::normalize::Candidate;

/// Admission decision for a normalized candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New, in-scope, identified: append to the log.
    Accepted,
    /// Belongs to a different thread than the panel's scope.
    WrongScope,
    /// No identifier could be resolved.
    NoId,
    /// Identifier already admitted this session.
    Duplicate,
}

/// Diagnostic counters, one per admission outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub accepted: u64,
    pub wrong_scope: u64,
    pub no_id: u64,
    pub duplicate: u64,
}

/// Scope filter with the session's seen-id registry.
pub struct ScopeFilter {
    scope: String,
    seen: HashSet<String>,
    stats: FilterStats,
}

impl ScopeFilter {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            seen: HashSet::new(),
            stats: FilterStats::default(),
        }
    }

    /// Decide admission for a candidate, recording the id on acceptance.
    pub fn admit(&mut self, candidate: &Candidate) -> Admission {
        if candidate.thread_id.as_deref() != Some(self.scope.as_str()) {
            self.stats.wrong_scope += 1;
            return Admission::WrongScope;
        }
        let Some(id) = candidate.id.as_deref() else {
            self.stats.no_id += 1;
            return Admission::NoId;
        };
        if !self.seen.insert(id.to_string()) {
            self.stats.duplicate += 1;
            return Admission::Duplicate;
        }
        self.stats.accepted += 1;
        Admission::Accepted
    }

    /// Pre-seed an id (used for optimistic local ids at submit time, so a
    /// later frame reusing the same id is a duplicate, not a second append).
    pub fn mark_seen(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_string())
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}
