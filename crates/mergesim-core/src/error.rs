//! Error types shared across the workspace.
//!
//! Every error here is an invariant violation: a defect in the driving
//! simulation, not a runtime condition to recover from. Expected divergence
//! (obsolete builds, stale queue builds, already-queued branches) is never
//! reported as an error; handlers silently discard it.

use crate::id::CommitId;
use thiserror::Error;

/// Invariant violations detected by repository operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RepoError {
    /// Queue promotion was invoked for a name without the `queue/` prefix.
    #[error("'{name}' is not a merge-queue slot")]
    NotQueueSlot {
        /// The offending branch-table name.
        name: String,
    },
    /// Queue promotion was invoked while the merge queue was empty.
    #[error("promotion of '{name}' requested with an empty merge queue")]
    EmptyQueue {
        /// The slot whose build triggered the promotion.
        name: String,
    },
    /// An operation named a branch that is not in the branch table.
    #[error("branch '{name}' does not exist")]
    UnknownBranch {
        /// The missing branch name.
        name: String,
    },
    /// A branch was created under a name that is already taken.
    #[error("branch '{name}' already exists")]
    BranchExists {
        /// The duplicate name.
        name: String,
    },
    /// A branch was created under `main` or a `queue/` slot name.
    #[error("'{name}' is a reserved branch name")]
    ReservedName {
        /// The reserved name.
        name: String,
    },
    /// A commit referenced a parent that is not in the graph.
    #[error("commit {commit} is not in the graph")]
    UnknownCommit {
        /// The missing commit.
        commit: CommitId,
    },
}

/// Errors returned by a processor's `handle()`.
///
/// Wrapped by the driver together with the processor's name; the first one
/// aborts the run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// A repository operation detected an invariant violation.
    #[error("invariant violated: {0}")]
    Invariant(#[from] RepoError),
    /// The processor failed for a reason of its own.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}
