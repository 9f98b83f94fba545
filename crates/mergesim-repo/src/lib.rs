//! Commit DAG, branch table, and merge queue for mergesim.
//!
//! [`CommitGraph`] is an append-only arena of immutable commits, each
//! carrying its precomputed ancestor set. [`Repository`] owns the graph
//! together with the branch table, the [`MergeQueue`], the
//! [`BuildStatusMap`], and the id counters, and exposes the integration
//! operations (branch creation, merge, rebase, queue admission, promotion,
//! rejection) that processors invoke.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod commit;
pub mod merge_queue;
pub mod repo;
pub mod status;

pub use commit::{Commit, CommitGraph};
pub use merge_queue::{MergeQueue, QueueEntry};
pub use repo::{RepoStats, Repository};
pub use status::BuildStatusMap;
