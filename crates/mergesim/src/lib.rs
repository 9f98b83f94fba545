//! mergesim: a discrete-event Monte Carlo simulator of source-control
//! integration pipelines.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all mergesim sub-crates. For most users, adding `mergesim` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use mergesim::prelude::*;
//!
//! let config = SimConfig::default()
//!     .with_policy(IntegrationPolicy::MergeQueue)
//!     .with_seed(42)
//!     .with_days(2);
//! let mut sim = Simulation::new(config).unwrap();
//! let outcome = sim.run().unwrap();
//! let report = sim.report(outcome);
//! assert_eq!(report.seed, 42);
//! assert!(report.merges_per_day >= 0.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `mergesim-core` | IDs, events, build profiles, errors |
//! | [`repo`] | `mergesim-repo` | Commit graph, branch table, merge queue |
//! | [`processor`] | `mergesim-processor` | Processor trait and pipeline validation |
//! | [`processors`] | `mergesim-processors` | Build starter, policies, generator, retry sweep |
//! | [`engine`] | `mergesim-engine` | Event queue, simulation loop, config, reports |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and IDs (`mergesim-core`).
pub use mergesim_core as types;

/// Repository model (`mergesim-repo`).
///
/// [`repo::Repository`] owns the [`repo::CommitGraph`], the branch table,
/// the [`repo::MergeQueue`], and the build status map.
pub use mergesim_repo as repo;

/// Processor trait and pipeline validation (`mergesim-processor`).
///
/// The [`processor::Processor`] trait is the main extension point for
/// custom integration rules.
pub use mergesim_processor as processor;

/// Reference processors (`mergesim-processors`).
pub use mergesim_processors as processors;

/// Simulation driver (`mergesim-engine`).
pub use mergesim_engine as engine;

/// Common imports for typical mergesim usage.
pub mod prelude {
    // Core types
    pub use mergesim_core::{
        BuildKind, BuildProfile, BuildStatus, CommitId, Event, EventKind, SimTime, MAIN,
    };

    // Errors
    pub use mergesim_core::{ProcessorError, RepoError};

    // Repository
    pub use mergesim_repo::{RepoStats, Repository};

    // Processor
    pub use mergesim_processor::{Delayed, DispatchContext, Processor};

    // Engine
    pub use mergesim_engine::{
        ConfigError, IntegrationPolicy, RunOutcome, RunReport, SimConfig, SimError, Simulation,
    };
}
