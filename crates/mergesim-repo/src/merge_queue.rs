//! The speculative merge queue.
//!
//! Entries are kept oldest-first. The most recently appended entry is the
//! *head*: it gates promotion, and its speculative commit transitively
//! contains every entry below it.

use mergesim_core::CommitId;

/// One admitted branch and the speculative commit that tests it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    /// Speculative commit: parents are the previous entry's commit (or
    /// `main`'s head when the queue was empty) and the branch head.
    pub commit: CommitId,
    /// The admitted branch (without the `queue/` prefix).
    pub branch: String,
}

/// Ordered stack of [`QueueEntry`]s.
#[derive(Clone, Debug, Default)]
pub struct MergeQueue {
    entries: Vec<QueueEntry>,
}

impl MergeQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry currently gating promotion.
    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.last()
    }

    /// Whether `branch` has an entry in the queue.
    pub fn contains(&self, branch: &str) -> bool {
        self.entries.iter().any(|e| e.branch == branch)
    }

    /// Append an entry, making it the new head.
    pub(crate) fn push(&mut self, entry: QueueEntry) {
        debug_assert!(!self.contains(&entry.branch));
        self.entries.push(entry);
    }

    /// Remove and return the head entry.
    pub(crate) fn pop_head(&mut self) -> Option<QueueEntry> {
        self.entries.pop()
    }

    /// Remove every entry, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<QueueEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
