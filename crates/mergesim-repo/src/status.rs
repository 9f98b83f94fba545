//! Per-commit build status.

use indexmap::IndexMap;
use mergesim_core::{BuildStatus, CommitId};

/// Mapping from commit to the status of its latest build.
///
/// Written only by the completion recorder and the manual retry sweep;
/// read by every promotion and retry decision. A commit with no entry has
/// never completed a build.
#[derive(Clone, Debug, Default)]
pub struct BuildStatusMap {
    statuses: IndexMap<CommitId, BuildStatus>,
}

impl BuildStatusMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of `commit`, or `None` if it has never completed a build.
    pub fn get(&self, commit: CommitId) -> Option<BuildStatus> {
        self.statuses.get(&commit).copied()
    }

    /// Record `status` for `commit`, replacing any earlier one.
    pub fn set(&mut self, commit: CommitId, status: BuildStatus) {
        self.statuses.insert(commit, status);
    }

    /// Number of commits with a recorded status.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Whether no status has been recorded.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Iterate `(commit, status)` in first-recorded order.
    pub fn iter(&self) -> impl Iterator<Item = (CommitId, BuildStatus)> + '_ {
        self.statuses.iter().map(|(&c, &s)| (c, s))
    }
}
