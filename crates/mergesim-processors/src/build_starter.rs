//! Turns build triggers into sampled completions.

use mergesim_core::{
    BuildKind, BuildOutcome, BuildProfile, Event, EventKind, EventKindSet, ProcessorError,
};
use mergesim_processor::{Delayed, DispatchContext, Processor, StateSet};
use tracing::debug;

/// Samples an outcome and a duration for every `BuildTriggered` and
/// schedules the matching completion.
///
/// `ManualRetry` triggers use the retry profile; every other trigger uses
/// the normal one. Writes no repository state.
#[derive(Clone, Debug)]
pub struct BuildStarter {
    normal: BuildProfile,
    retry: BuildProfile,
}

impl BuildStarter {
    /// Starter with the default profiles: normal 1h-3h at p=0.5, retry
    /// 15min-45min at p=0.9.
    pub fn new() -> Self {
        Self {
            normal: BuildProfile::normal(),
            retry: BuildProfile::manual_retry(),
        }
    }

    /// Replace the profile of regular builds.
    pub fn with_normal(mut self, profile: BuildProfile) -> Self {
        self.normal = profile;
        self
    }

    /// Replace the profile of manual retries.
    pub fn with_retry(mut self, profile: BuildProfile) -> Self {
        self.retry = profile;
        self
    }

    fn profile(&self, kind: BuildKind) -> &BuildProfile {
        match kind {
            BuildKind::Normal => &self.normal,
            BuildKind::ManualRetry => &self.retry,
        }
    }
}

impl Default for BuildStarter {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for BuildStarter {
    fn name(&self) -> &str {
        "build_starter"
    }

    fn reacts_to(&self) -> EventKindSet {
        [EventKind::BuildTriggered].into_iter().collect()
    }

    fn writes(&self) -> StateSet {
        StateSet::empty()
    }

    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        let Event::BuildTriggered {
            build,
            commit,
            branch,
            kind,
        } = event
        else {
            return Ok(Vec::new());
        };
        let (outcome, duration) = self.profile(*kind).sample(ctx.source());
        debug!(%build, %commit, %branch, ?outcome, ?duration, "build started");
        let (build, commit, branch) = (*build, *commit, branch.clone());
        let completion = match outcome {
            BuildOutcome::Succeeded => Event::BuildSucceeded {
                build,
                commit,
                branch,
            },
            BuildOutcome::Failed => Event::BuildFailed {
                build,
                commit,
                branch,
            },
        };
        Ok(vec![Delayed::after(completion, duration)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergesim_core::{BuildId, CommitId, SimTime};
    use mergesim_repo::Repository;
    use mergesim_test_utils::SequenceSource;
    use std::time::Duration;

    fn trigger(kind: BuildKind) -> Event {
        Event::BuildTriggered {
            build: BuildId(3),
            commit: CommitId(1),
            branch: "branch-1".to_string(),
            kind,
        }
    }

    fn start(event: &Event, draws: [f64; 2]) -> Vec<Delayed> {
        let mut repo = Repository::new();
        let mut source = SequenceSource::new(draws);
        let mut ctx = DispatchContext::new(&mut repo, &mut source, SimTime::ZERO);
        BuildStarter::new().handle(event, &mut ctx).unwrap()
    }

    #[test]
    fn normal_build_completes_within_profile() {
        let out = start(&trigger(BuildKind::Normal), [0.1, 0.5]);
        assert_eq!(
            out,
            vec![Delayed::after(
                Event::BuildSucceeded {
                    build: BuildId(3),
                    commit: CommitId(1),
                    branch: "branch-1".to_string(),
                },
                Duration::from_secs(2 * 3600),
            )]
        );
    }

    #[test]
    fn normal_build_fails_above_probability() {
        let out = start(&trigger(BuildKind::Normal), [0.6, 0.0]);
        assert_eq!(out[0].event.kind(), EventKind::BuildFailed);
        assert_eq!(out[0].delay, Duration::from_secs(3600));
    }

    #[test]
    fn manual_retry_uses_retry_profile() {
        // 0.6 fails a normal build but passes a retry.
        let out = start(&trigger(BuildKind::ManualRetry), [0.6, 0.0]);
        assert_eq!(out[0].event.kind(), EventKind::BuildSucceeded);
        assert_eq!(out[0].delay, Duration::from_secs(15 * 60));
    }

    #[test]
    fn custom_profile_replaces_default() {
        let starter =
            BuildStarter::new().with_normal(BuildProfile::normal().with_success_probability(0.0));
        let mut repo = Repository::new();
        let mut source = SequenceSource::new([0.0, 0.0]);
        let mut ctx = DispatchContext::new(&mut repo, &mut source, SimTime::ZERO);
        let out = starter
            .handle(&trigger(BuildKind::Normal), &mut ctx)
            .unwrap();
        assert_eq!(out[0].event.kind(), EventKind::BuildFailed);
    }
}
