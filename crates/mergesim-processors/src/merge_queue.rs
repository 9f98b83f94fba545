//! Speculative merge-queue policy.
//!
//! A green branch is admitted to the queue as a speculative commit stacked
//! on the current queue head. Promotion lands the head and, with it, every
//! entry below. Rejection drops a failed head and may cascade into an
//! immediate promotion of the entry below it.

use mergesim_core::{
    queued_branch, CommitId, Event, EventKind, EventKindSet, ProcessorError, MAIN,
};
use mergesim_processor::{Delayed, DispatchContext, Processor, StateDomain, StateSet};
use tracing::{debug, info};

use crate::is_current;

/// Admission, promotion, and rejection for the merge queue.
///
/// | Event | Branch | Action |
/// |---|---|---|
/// | `BuildSucceeded` | `main` | none |
/// | `BuildSucceeded` | `queue/<b>` | promote if the commit is the queue head |
/// | `BuildSucceeded` | other | admit if the commit is the branch head |
/// | `BuildFailed` | any | reject if the commit is the queue head |
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeQueuePolicy;

impl MergeQueuePolicy {
    fn admit(
        &self,
        ctx: &mut DispatchContext<'_>,
        branch: &str,
        commit: CommitId,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        if !is_current(ctx.repo(), branch, commit) {
            debug!(%commit, %branch, "obsolete build ignored");
            return Ok(Vec::new());
        }
        let now = ctx.now();
        match ctx.repo_mut().add_to_merge_queue(branch)? {
            Some(trigger) => {
                let depth = ctx.repo().queue().len();
                info!(%now, %branch, depth, "admitted to merge queue");
                Ok(vec![Delayed::now(trigger)])
            }
            None => {
                debug!(%branch, "already queued");
                Ok(Vec::new())
            }
        }
    }

    fn promote(
        &self,
        ctx: &mut DispatchContext<'_>,
        slot: &str,
        commit: CommitId,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        if !is_current(ctx.repo(), slot, commit) {
            debug!(%commit, %slot, "build of a landed or rejected slot ignored");
            return Ok(Vec::new());
        }
        let now = ctx.now();
        let landed = ctx.repo().queue().len();
        match ctx.repo_mut().promote(slot, commit)? {
            Some(trigger) => {
                info!(%now, %slot, %commit, landed, "promoted merge queue onto main");
                Ok(vec![Delayed::now(trigger)])
            }
            None => {
                debug!(%commit, %slot, "stale queue build ignored");
                Ok(Vec::new())
            }
        }
    }

    fn reject(
        &self,
        ctx: &mut DispatchContext<'_>,
        commit: CommitId,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        let rejected = ctx
            .repo()
            .queue()
            .head()
            .filter(|e| e.commit == commit)
            .map(|e| e.branch.clone());
        let now = ctx.now();
        let cascade = ctx.repo_mut().reject(commit)?;
        if let Some(branch) = rejected {
            info!(%now, %branch, %commit, "rejected from merge queue");
        }
        let Some(trigger) = cascade else {
            return Ok(Vec::new());
        };
        let main = ctx.repo().main_head();
        info!(%now, %main, "promoted green successor after rejection");
        Ok(vec![Delayed::now(trigger)])
    }
}

impl Processor for MergeQueuePolicy {
    fn name(&self) -> &str {
        "merge_queue"
    }

    fn reacts_to(&self) -> EventKindSet {
        [EventKind::BuildSucceeded, EventKind::BuildFailed]
            .into_iter()
            .collect()
    }

    fn writes(&self) -> StateSet {
        [
            StateDomain::Branches,
            StateDomain::Main,
            StateDomain::MergeQueue,
        ]
        .into_iter()
        .collect()
    }

    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        match event {
            Event::BuildSucceeded { branch, .. } if branch == MAIN => Ok(Vec::new()),
            Event::BuildSucceeded { commit, branch, .. } if queued_branch(branch).is_some() => {
                self.promote(ctx, branch, *commit)
            }
            Event::BuildSucceeded { commit, branch, .. } => self.admit(ctx, branch, *commit),
            Event::BuildFailed { commit, .. } => self.reject(ctx, *commit),
            _ => Ok(Vec::new()),
        }
    }
}
