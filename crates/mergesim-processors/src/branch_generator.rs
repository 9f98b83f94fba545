//! Periodic creation of new branches, topping up to a fixed cap.

use std::time::Duration;

use mergesim_core::{Event, EventKind, EventKindSet, ProcessorError};
use mergesim_processor::{Delayed, DispatchContext, Processor, StateDomain, StateSet};
use tracing::info;

/// Default number of open branches the generator maintains.
pub const DEFAULT_BRANCH_CAP: usize = 3;

/// Default period between generator ticks.
pub const DEFAULT_GENERATOR_INTERVAL: Duration = Duration::from_secs(3600);

/// On every `BranchGeneratorTick`, re-schedules itself and then creates
/// branches on top of `main` until `cap` open branches exist.
///
/// Merge-queue slots do not count as open branches; a queued branch
/// still does, through its own name.
#[derive(Clone, Copy, Debug)]
pub struct BranchGenerator {
    cap: usize,
    interval: Duration,
}

impl BranchGenerator {
    /// Generator with the given cap and tick period.
    pub fn new(cap: usize, interval: Duration) -> Self {
        Self { cap, interval }
    }

    /// Maximum number of open branches.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Period between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for BranchGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCH_CAP, DEFAULT_GENERATOR_INTERVAL)
    }
}

impl Processor for BranchGenerator {
    fn name(&self) -> &str {
        "branch_generator"
    }

    fn reacts_to(&self) -> EventKindSet {
        [EventKind::BranchGeneratorTick].into_iter().collect()
    }

    fn writes(&self) -> StateSet {
        [StateDomain::Branches].into_iter().collect()
    }

    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        if *event != Event::BranchGeneratorTick {
            return Ok(Vec::new());
        }
        let mut out = vec![Delayed::after(Event::BranchGeneratorTick, self.interval)];
        let now = ctx.now();
        while ctx.repo().open_branch_count() < self.cap {
            let trigger = ctx.repo_mut().make_new_branch()?;
            if let Some(branch) = trigger.branch() {
                info!(%now, %branch, "branch created");
            }
            out.push(Delayed::now(trigger));
        }
        Ok(out)
    }
}
