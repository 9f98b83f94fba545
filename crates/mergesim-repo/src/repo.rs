//! The simulated repository and its integration operations.
//!
//! # Branch table
//!
//! Maps names to head commits. `main` is always present. Every other name
//! is either an open branch or a merge-queue slot `queue/<branch>`. A
//! queued branch keeps its own name next to its slot until it is promoted
//! onto `main`.
//!
//! # Operations
//!
//! Each operation that creates a commit needing CI returns the
//! [`Event::BuildTriggered`] for it; the caller schedules it. Operations
//! that may legitimately be stale return `Ok(None)` instead of an event.
//! Invariant violations are returned as [`RepoError`].

use indexmap::IndexMap;
use mergesim_core::{
    queue_slot, queued_branch, BuildId, BuildKind, BuildStatus, CommitId, Event, RepoError, MAIN,
};
use serde::Serialize;

use crate::commit::CommitGraph;
use crate::merge_queue::{MergeQueue, QueueEntry};
use crate::status::BuildStatusMap;

/// Cumulative counts of integration operations over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RepoStats {
    /// Branches created (generated or named).
    pub branches_created: u64,
    /// Direct merges into `main`.
    pub direct_merges: u64,
    /// Rebases of a branch onto `main`.
    pub rebases: u64,
    /// Merge-queue admissions.
    pub admissions: u64,
    /// Merge-queue promotions onto `main`.
    pub promotions: u64,
    /// Merge-queue head rejections.
    pub rejections: u64,
}

/// Commit graph, branch table, merge queue, build statuses, and counters.
///
/// The id counters (branch sequence, build sequence) live here rather than
/// in process-wide statics, so independent runs never interfere.
#[derive(Clone, Debug)]
pub struct Repository {
    graph: CommitGraph,
    branches: IndexMap<String, CommitId>,
    queue: MergeQueue,
    statuses: BuildStatusMap,
    branch_seq: u64,
    build_seq: u64,
    stats: RepoStats,
}

impl Repository {
    /// Create a repository whose `main` points at a single initial commit.
    pub fn new() -> Self {
        let mut graph = CommitGraph::new();
        let root = graph.root("Initial commit");
        let mut branches = IndexMap::new();
        branches.insert(MAIN.to_string(), root);
        Self {
            graph,
            branches,
            queue: MergeQueue::new(),
            statuses: BuildStatusMap::new(),
            branch_seq: 0,
            build_seq: 0,
            stats: RepoStats::default(),
        }
    }

    // ── Queries ────────────────────────────────────────────────

    /// The commit graph.
    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    /// The merge queue.
    pub fn queue(&self) -> &MergeQueue {
        &self.queue
    }

    /// Recorded build statuses.
    pub fn statuses(&self) -> &BuildStatusMap {
        &self.statuses
    }

    /// Status of `commit`'s latest build.
    pub fn status_of(&self, commit: CommitId) -> Option<BuildStatus> {
        self.statuses.get(commit)
    }

    /// Cumulative operation counts.
    pub fn stats(&self) -> &RepoStats {
        &self.stats
    }

    /// Head commit of `name`, if the name exists.
    pub fn head(&self, name: &str) -> Option<CommitId> {
        self.branches.get(name).copied()
    }

    /// Head commit of `main`.
    pub fn main_head(&self) -> CommitId {
        // `main` is inserted at construction and never removed.
        self.branches[MAIN]
    }

    /// All `(name, head)` pairs in creation order, `main` first.
    pub fn branches(&self) -> impl Iterator<Item = (&str, CommitId)> {
        self.branches.iter().map(|(n, &c)| (n.as_str(), c))
    }

    /// Open branches: names other than `main` and merge-queue slots.
    pub fn open_branches(&self) -> impl Iterator<Item = (&str, CommitId)> {
        self.branches()
            .filter(|(name, _)| *name != MAIN && queued_branch(name).is_none())
    }

    /// Number of open branches.
    pub fn open_branch_count(&self) -> usize {
        self.open_branches().count()
    }

    /// Number of branches integrated into `main`, measured as the length
    /// of `main`'s first-parent chain.
    pub fn merged_into_main(&self) -> usize {
        self.graph.first_parent_depth(self.main_head())
    }

    fn branch_head(&self, name: &str) -> Result<CommitId, RepoError> {
        self.head(name).ok_or_else(|| RepoError::UnknownBranch {
            name: name.to_string(),
        })
    }

    fn require_plain_branch(name: &str) -> Result<(), RepoError> {
        if name == MAIN || queued_branch(name).is_some() {
            return Err(RepoError::ReservedName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    // ── Builds and statuses ────────────────────────────────────

    /// Allocate a build id and return the trigger event for `commit`.
    pub fn trigger_build(&mut self, commit: CommitId, branch: &str, kind: BuildKind) -> Event {
        self.build_seq += 1;
        Event::BuildTriggered {
            build: BuildId(self.build_seq),
            commit,
            branch: branch.to_string(),
            kind,
        }
    }

    /// Record the status of `commit`'s latest build.
    pub fn record_status(&mut self, commit: CommitId, status: BuildStatus) {
        self.statuses.set(commit, status);
    }

    // ── Branches ───────────────────────────────────────────────

    /// Create branch `name` with one commit on top of `main`.
    ///
    /// # Errors
    ///
    /// [`RepoError::ReservedName`] for `main` or a `queue/` name,
    /// [`RepoError::BranchExists`] if the name is taken.
    pub fn create_branch(&mut self, name: &str) -> Result<Event, RepoError> {
        Self::require_plain_branch(name)?;
        if self.branches.contains_key(name) {
            return Err(RepoError::BranchExists {
                name: name.to_string(),
            });
        }
        let main = self.main_head();
        let commit = self.graph.commit(&[main], name)?;
        self.branches.insert(name.to_string(), commit);
        self.stats.branches_created += 1;
        Ok(self.trigger_build(commit, name, BuildKind::Normal))
    }

    /// Create the next generated branch (`branch-1`, `branch-2`, ...).
    pub fn make_new_branch(&mut self) -> Result<Event, RepoError> {
        loop {
            self.branch_seq += 1;
            let name = format!("branch-{}", self.branch_seq);
            if !self.branches.contains_key(&name) {
                return self.create_branch(&name);
            }
        }
    }

    /// Merge `branch` into `main` and delete the branch.
    ///
    /// The merge commit's parents are `main`'s head then the branch head.
    /// Returns the trigger for the post-merge `main` build.
    pub fn merge_branch(&mut self, branch: &str) -> Result<Event, RepoError> {
        Self::require_plain_branch(branch)?;
        let head = self.branch_head(branch)?;
        let main = self.main_head();
        let merged = self.graph.commit(&[main, head], format!("Merge {branch}"))?;
        self.branches.insert(MAIN.to_string(), merged);
        self.branches.shift_remove(branch);
        self.stats.direct_merges += 1;
        Ok(self.trigger_build(merged, MAIN, BuildKind::Normal))
    }

    /// Bring `main`'s head into `branch` without merging the branch.
    ///
    /// The new branch head has parents `main`'s head then the old branch
    /// head. Returns the trigger for the rebased commit's build.
    pub fn rebase_branch(&mut self, branch: &str) -> Result<Event, RepoError> {
        Self::require_plain_branch(branch)?;
        let head = self.branch_head(branch)?;
        let main = self.main_head();
        let rebased = self
            .graph
            .commit(&[main, head], format!("Rebase {branch} onto main"))?;
        self.branches.insert(branch.to_string(), rebased);
        self.stats.rebases += 1;
        Ok(self.trigger_build(rebased, branch, BuildKind::Normal))
    }

    // ── Merge queue ────────────────────────────────────────────

    /// Admit `branch` to the merge queue.
    ///
    /// Creates a speculative commit on top of the current queue head (or
    /// `main` when the queue is empty), registers it as `queue/<branch>`,
    /// and returns its build trigger. Returns `Ok(None)` if the branch is
    /// already queued.
    pub fn add_to_merge_queue(&mut self, branch: &str) -> Result<Option<Event>, RepoError> {
        if self.queue.contains(branch) {
            return Ok(None);
        }
        Self::require_plain_branch(branch)?;
        let head = self.branch_head(branch)?;
        let base = self.queue.head().map_or(self.main_head(), |e| e.commit);
        let speculative = self
            .graph
            .commit(&[base, head], format!("Merge {branch} (queued)"))?;
        self.queue.push(QueueEntry {
            commit: speculative,
            branch: branch.to_string(),
        });
        let slot = queue_slot(branch);
        self.branches.insert(slot.clone(), speculative);
        self.stats.admissions += 1;
        Ok(Some(self.trigger_build(speculative, &slot, BuildKind::Normal)))
    }

    /// Promote the queue head onto `main` after `commit` built green on `slot`.
    ///
    /// If `commit` is not the current queue head the build is stale and
    /// `Ok(None)` is returned. Otherwise `main` moves to the head commit,
    /// the whole queue is cleared (every lower entry is contained in the
    /// head's speculative chain), each entry's branch and slot names are
    /// removed, and the trigger for one `main` build is returned.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotQueueSlot`] if `slot` lacks the `queue/` prefix,
    /// [`RepoError::EmptyQueue`] if there is nothing to promote.
    pub fn promote(&mut self, slot: &str, commit: CommitId) -> Result<Option<Event>, RepoError> {
        if queued_branch(slot).is_none() {
            return Err(RepoError::NotQueueSlot {
                name: slot.to_string(),
            });
        }
        let head = self
            .queue
            .head()
            .map(|e| e.commit)
            .ok_or_else(|| RepoError::EmptyQueue {
                name: slot.to_string(),
            })?;
        if head != commit {
            return Ok(None);
        }
        for entry in self.queue.drain() {
            self.branches.shift_remove(&queue_slot(&entry.branch));
            self.branches.shift_remove(&entry.branch);
        }
        self.branches.insert(MAIN.to_string(), commit);
        self.stats.promotions += 1;
        Ok(Some(self.trigger_build(commit, MAIN, BuildKind::Normal)))
    }

    /// React to a failed build of `commit`.
    ///
    /// Only a failure of the current queue head has an effect: the entry
    /// and its slot are removed, and the branch's head moves to the failed
    /// speculative commit so the manual retry sweep can pick it up. If the
    /// entry below has already built green, it is promoted at once.
    /// Failures of buried entries are ignored.
    pub fn reject(&mut self, commit: CommitId) -> Result<Option<Event>, RepoError> {
        if self.queue.head().map(|e| e.commit) != Some(commit) {
            return Ok(None);
        }
        let Some(rejected) = self.queue.pop_head() else {
            return Ok(None);
        };
        self.branches.shift_remove(&queue_slot(&rejected.branch));
        if let Some(head) = self.branches.get_mut(&rejected.branch) {
            *head = rejected.commit;
        }
        self.stats.rejections += 1;

        let Some(next) = self.queue.head() else {
            return Ok(None);
        };
        if self.status_of(next.commit) == Some(BuildStatus::Success) {
            let (slot, commit) = (queue_slot(&next.branch), next.commit);
            return self.promote(&slot, commit);
        }
        Ok(None)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
