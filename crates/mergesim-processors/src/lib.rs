//! The integration-pipeline rule set for mergesim.
//!
//! Each processor reacts to a disjoint slice of the event stream or writes
//! a disjoint part of the repository, so registration order never changes
//! the outcome of a dispatch; it is fixed only for reproducibility.
//!
//! # Pipeline order
//!
//! 1. [`BuildStarter`]: `BuildTriggered` → sampled completion
//! 2. [`StatusRecorder`]: completions → build status map
//! 3. one policy: [`DirectMergePolicy`] or [`MergeQueuePolicy`]
//! 4. [`BranchGenerator`]: `BranchGeneratorTick` → new branches
//! 5. [`RetrySweep`]: `RetrySweepTick` → manual retries

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod branch_generator;
pub mod build_starter;
pub mod direct_merge;
pub mod merge_queue;
pub mod retry_sweep;
pub mod status_recorder;

pub use branch_generator::{BranchGenerator, DEFAULT_BRANCH_CAP, DEFAULT_GENERATOR_INTERVAL};
pub use build_starter::BuildStarter;
pub use direct_merge::DirectMergePolicy;
pub use merge_queue::MergeQueuePolicy;
pub use retry_sweep::{RetrySweep, DEFAULT_SWEEP_INTERVAL};
pub use status_recorder::StatusRecorder;

use mergesim_core::CommitId;
use mergesim_repo::Repository;

/// Whether a build of `commit` on `branch` is still current: the name
/// exists and its head is still the tested commit.
pub(crate) fn is_current(repo: &Repository, branch: &str, commit: CommitId) -> bool {
    repo.head(branch) == Some(commit)
}
