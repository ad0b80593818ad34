//! Pending "provision and enqueue" work.
//!
//! Entries are pushed in bulk at recount time and popped one per tick, last
//! in first out. Order across workers carries no meaning; the only guarantee
//! is that the scheduler consumes at most one entry per `advance`.

use chrono::{DateTime, Utc};

use crate::id::{RecipeId, WorkerId};

// ---------------------------------------------------------------------------
// DispatchEntry
// ---------------------------------------------------------------------------

/// One batch of `recipe` to provision for and enqueue on `worker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub worker: WorkerId,
    pub recipe: RecipeId,
}

// ---------------------------------------------------------------------------
// DispatchQueue
// ---------------------------------------------------------------------------

/// Work list drained at one entry per tick.
///
/// Optionally remembers completed dispatches for status and debugging.
#[derive(Debug, Clone, Default)]
pub struct DispatchQueue {
    pending: Vec<DispatchEntry>,
    /// Completed dispatches: (time, entry).
    history: Vec<(DateTime<Utc>, DispatchEntry)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that retains up to `max_history` completed dispatches.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push_batch(&mut self, entries: impl IntoIterator<Item = DispatchEntry>) {
        self.pending.extend(entries);
    }

    /// Take the most recently pushed entry.
    pub fn pop(&mut self) -> Option<DispatchEntry> {
        self.pending.pop()
    }

    pub fn pending(&self) -> &[DispatchEntry] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remember a completed dispatch, trimming the oldest past the limit.
    pub fn record(&mut self, at: DateTime<Utc>, entry: DispatchEntry) {
        if self.max_history == 0 {
            return;
        }
        self.history.push((at, entry));
        let excess = self.history.len().saturating_sub(self.max_history);
        if excess > 0 {
            self.history.drain(..excess);
        }
    }

    pub fn history(&self) -> &[(DateTime<Utc>, DispatchEntry)] {
        &self.history
    }
}
