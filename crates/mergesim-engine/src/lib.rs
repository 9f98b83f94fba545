//! Discrete-event driver for mergesim runs.
//!
//! Provides [`Simulation`], which owns one run's repository, processor
//! pipeline, event queue, and seeded uniform source, plus the
//! [`SimConfig`] that describes a run and the [`RunReport`] summarizing it.
//!
//! A run is fully determined by its configuration: same config and seed,
//! same [`History`] digest.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod history;
pub mod queue;
pub mod report;
pub mod rng;
pub mod simulation;

pub use config::{ConfigError, IntegrationPolicy, SimConfig};
pub use history::History;
pub use queue::{EventQueue, Scheduled};
pub use report::{BranchSummary, RunReport};
pub use rng::SimRng;
pub use simulation::{RunOutcome, SimError, Simulation};
