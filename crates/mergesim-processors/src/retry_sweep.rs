//! Periodic manual retry of failed builds.

use std::time::Duration;

use mergesim_core::{
    BuildKind, BuildStatus, CommitId, Event, EventKind, EventKindSet, ProcessorError, MAIN,
};
use mergesim_processor::{Delayed, DispatchContext, Processor, StateDomain, StateSet};
use tracing::info;

/// Default period between retry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// On every `RetrySweepTick`, re-schedules itself and then triggers a
/// manual retry for each non-`main` name whose head last failed, marking
/// the head `Retrying` so the next sweep skips it.
#[derive(Clone, Copy, Debug)]
pub struct RetrySweep {
    interval: Duration,
}

impl RetrySweep {
    /// Sweep with the given period.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Period between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RetrySweep {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

impl Processor for RetrySweep {
    fn name(&self) -> &str {
        "retry_sweep"
    }

    fn reacts_to(&self) -> EventKindSet {
        [EventKind::RetrySweepTick].into_iter().collect()
    }

    fn writes(&self) -> StateSet {
        [StateDomain::Statuses].into_iter().collect()
    }

    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        if *event != Event::RetrySweepTick {
            return Ok(Vec::new());
        }
        let mut out = vec![Delayed::after(Event::RetrySweepTick, self.interval)];

        let repo = ctx.repo();
        let failed: Vec<(String, CommitId)> = repo
            .branches()
            .filter(|(name, head)| {
                *name != MAIN && repo.status_of(*head) == Some(BuildStatus::Failure)
            })
            .map(|(name, head)| (name.to_string(), head))
            .collect();

        let now = ctx.now();
        let repo = ctx.repo_mut();
        for (branch, head) in failed {
            info!(%now, %branch, commit = %head, "manual retry");
            out.push(Delayed::now(repo.trigger_build(
                head,
                &branch,
                BuildKind::ManualRetry,
            )));
            repo.record_status(head, BuildStatus::Retrying);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergesim_core::SimTime;
    use mergesim_repo::Repository;
    use mergesim_test_utils::ConstSource;

    fn sweep(repo: &mut Repository) -> Vec<Delayed> {
        let mut source = ConstSource(0.0);
        let mut ctx = DispatchContext::new(repo, &mut source, SimTime::ZERO);
        RetrySweep::default()
            .handle(&Event::RetrySweepTick, &mut ctx)
            .unwrap()
    }

    #[test]
    fn failed_branch_gets_one_manual_retry() {
        let mut repo = Repository::new();
        repo.create_branch("x").unwrap();
        repo.create_branch("y").unwrap();
        let x = repo.head("x").unwrap();
        let y = repo.head("y").unwrap();
        repo.record_status(x, BuildStatus::Failure);
        repo.record_status(y, BuildStatus::Success);

        let out = sweep(&mut repo);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].delay, DEFAULT_SWEEP_INTERVAL);
        match &out[1].event {
            Event::BuildTriggered {
                commit,
                branch,
                kind,
                ..
            } => {
                assert_eq!(*commit, x);
                assert_eq!(branch, "x");
                assert_eq!(*kind, BuildKind::ManualRetry);
            }
            other => panic!("expected manual retry, got {other:?}"),
        }
        assert_eq!(repo.status_of(x), Some(BuildStatus::Retrying));
    }

    #[test]
    fn retrying_branch_is_not_retried_again() {
        let mut repo = Repository::new();
        repo.create_branch("x").unwrap();
        let x = repo.head("x").unwrap();
        repo.record_status(x, BuildStatus::Failure);
        sweep(&mut repo);
        assert_eq!(sweep(&mut repo).len(), 1);
    }

    #[test]
    fn failing_main_is_never_retried() {
        let mut repo = Repository::new();
        let main = repo.main_head();
        repo.record_status(main, BuildStatus::Failure);
        assert_eq!(sweep(&mut repo).len(), 1);
        assert_eq!(repo.status_of(main), Some(BuildStatus::Failure));
    }
}
