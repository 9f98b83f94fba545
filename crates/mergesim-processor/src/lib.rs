//! Processor trait and dispatch context for mergesim simulations.
//!
//! The [`Processor`] trait defines the `&self` event handler with a
//! [`DispatchContext`] giving mutable access to the repository and the
//! shared uniform source. [`validate_pipeline`] checks a processor list
//! once before a run and precomputes the per-kind dispatch routes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod pipeline;
pub mod processor;

pub use context::DispatchContext;
pub use pipeline::{validate_pipeline, DispatchPlan, PipelineError, StateConflict};
pub use processor::{Delayed, Processor, StateDomain, StateSet};
