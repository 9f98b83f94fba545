//! Records the outcome of every completed build.

use mergesim_core::{BuildStatus, Event, EventKind, EventKindSet, ProcessorError};
use mergesim_processor::{Delayed, DispatchContext, Processor, StateDomain, StateSet};

/// Writes `Success` or `Failure` for the tested commit on every completion,
/// current or obsolete.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusRecorder;

impl Processor for StatusRecorder {
    fn name(&self) -> &str {
        "status_recorder"
    }

    fn reacts_to(&self) -> EventKindSet {
        [EventKind::BuildSucceeded, EventKind::BuildFailed]
            .into_iter()
            .collect()
    }

    fn writes(&self) -> StateSet {
        [StateDomain::Statuses].into_iter().collect()
    }

    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        let (commit, status) = match event {
            Event::BuildSucceeded { commit, .. } => (*commit, BuildStatus::Success),
            Event::BuildFailed { commit, .. } => (*commit, BuildStatus::Failure),
            _ => return Ok(Vec::new()),
        };
        ctx.repo_mut().record_status(commit, status);
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergesim_core::{BuildId, CommitId, SimTime};
    use mergesim_repo::Repository;
    use mergesim_test_utils::ConstSource;

    #[test]
    fn completions_overwrite_status() {
        let mut repo = Repository::new();
        let mut source = ConstSource(0.0);
        let mut ctx = DispatchContext::new(&mut repo, &mut source, SimTime::ZERO);
        let failed = Event::BuildFailed {
            build: BuildId(1),
            commit: CommitId(0),
            branch: "main".to_string(),
        };
        let passed = Event::BuildSucceeded {
            build: BuildId(2),
            commit: CommitId(0),
            branch: "main".to_string(),
        };

        assert!(StatusRecorder.handle(&failed, &mut ctx).unwrap().is_empty());
        assert_eq!(ctx.repo().status_of(CommitId(0)), Some(BuildStatus::Failure));
        StatusRecorder.handle(&passed, &mut ctx).unwrap();
        assert_eq!(ctx.repo().status_of(CommitId(0)), Some(BuildStatus::Success));
    }
}
