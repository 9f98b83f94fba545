//! Execution context passed to processors during dispatch.

use mergesim_core::{SimTime, UniformSource};
use mergesim_repo::Repository;

/// Execution context passed to each processor's `handle()` method.
///
/// Borrows the repository mutably and the run's single uniform source.
/// Uses `&mut dyn UniformSource` to keep [`Processor`](crate::Processor)
/// object-safe while letting tests script every draw.
pub struct DispatchContext<'a> {
    repo: &'a mut Repository,
    source: &'a mut dyn UniformSource,
    now: SimTime,
}

impl<'a> DispatchContext<'a> {
    /// Construct a new dispatch context.
    ///
    /// Typically called by the driver, not by processors directly.
    pub fn new(repo: &'a mut Repository, source: &'a mut dyn UniformSource, now: SimTime) -> Self {
        Self { repo, source, now }
    }

    /// Read-only view of the repository.
    pub fn repo(&self) -> &Repository {
        self.repo
    }

    /// Mutable access to the repository.
    pub fn repo_mut(&mut self) -> &mut Repository {
        self.repo
    }

    /// The run's shared uniform source.
    pub fn source(&mut self) -> &mut dyn UniformSource {
        self.source
    }

    /// Simulated time of the event being dispatched.
    pub fn now(&self) -> SimTime {
        self.now
    }
}
