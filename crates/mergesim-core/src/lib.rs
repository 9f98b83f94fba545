//! Core types and traits for the mergesim integration-pipeline simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the workspace: commit and
//! build identifiers, simulated time, the closed [`Event`] sum type, build
//! profiles and statuses, error types, and the [`UniformSource`] trait
//! through which all randomness is injected.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod build;
pub mod error;
pub mod event;
pub mod id;
pub mod traits;

pub use build::{BuildKind, BuildOutcome, BuildProfile, BuildStatus};
pub use error::{ProcessorError, RepoError};
pub use event::{Event, EventKind, EventKindSet};
pub use id::{queue_slot, queued_branch, BuildId, CommitId, SimTime, MAIN, QUEUE_PREFIX};
pub use traits::UniformSource;
