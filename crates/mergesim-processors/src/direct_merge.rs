//! Merge-when-green policy, optionally rebasing stale branches first.

use mergesim_core::{Event, EventKind, EventKindSet, ProcessorError, MAIN};
use mergesim_processor::{Delayed, DispatchContext, Processor, StateDomain, StateSet};
use tracing::{debug, info};

use crate::is_current;

/// On a current `BuildSucceeded` for a branch other than `main`, merges the
/// branch into `main`.
///
/// With rebase-on-success enabled, a green commit that does not already
/// contain `main`'s head is first rebased: `main` is brought into the
/// branch and the merge waits for the rebased commit's own green build.
#[derive(Clone, Copy, Debug)]
pub struct DirectMergePolicy {
    rebase_on_success: bool,
}

impl DirectMergePolicy {
    /// Policy that rebases before merging when `main` has moved.
    pub fn new(rebase_on_success: bool) -> Self {
        Self { rebase_on_success }
    }

    /// Whether stale branches are rebased before merging.
    pub fn rebases(&self) -> bool {
        self.rebase_on_success
    }
}

impl Default for DirectMergePolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Processor for DirectMergePolicy {
    fn name(&self) -> &str {
        "direct_merge"
    }

    fn reacts_to(&self) -> EventKindSet {
        [EventKind::BuildSucceeded].into_iter().collect()
    }

    fn writes(&self) -> StateSet {
        [StateDomain::Branches, StateDomain::Main]
            .into_iter()
            .collect()
    }

    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        let Event::BuildSucceeded { commit, branch, .. } = event else {
            return Ok(Vec::new());
        };
        if branch == MAIN {
            return Ok(Vec::new());
        }
        if !is_current(ctx.repo(), branch, *commit) {
            debug!(%commit, %branch, "obsolete build ignored");
            return Ok(Vec::new());
        }

        let now = ctx.now();
        let repo = ctx.repo_mut();
        if self.rebase_on_success && !repo.graph().is_ancestor(repo.main_head(), *commit) {
            let trigger = repo.rebase_branch(branch)?;
            info!(%now, %branch, main = %repo.main_head(), "rebased onto main");
            return Ok(vec![Delayed::now(trigger)]);
        }
        let trigger = repo.merge_branch(branch)?;
        info!(%now, %branch, main = %repo.main_head(), "merged into main");
        Ok(vec![Delayed::now(trigger)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergesim_core::{BuildId, BuildKind, CommitId, SimTime};
    use mergesim_repo::Repository;
    use mergesim_test_utils::ConstSource;

    fn succeeded(commit: CommitId, branch: &str) -> Event {
        Event::BuildSucceeded {
            build: BuildId(1),
            commit,
            branch: branch.to_string(),
        }
    }

    fn dispatch(policy: DirectMergePolicy, repo: &mut Repository, event: &Event) -> Vec<Delayed> {
        let mut source = ConstSource(0.0);
        let mut ctx = DispatchContext::new(repo, &mut source, SimTime::ZERO);
        policy.handle(event, &mut ctx).unwrap()
    }

    #[test]
    fn green_branch_on_current_main_is_merged() {
        let mut repo = Repository::new();
        repo.create_branch("x").unwrap();
        let x = repo.head("x").unwrap();

        let out = dispatch(DirectMergePolicy::new(true), &mut repo, &succeeded(x, "x"));
        assert_eq!(out.len(), 1);
        match &out[0].event {
            Event::BuildTriggered {
                commit,
                branch,
                kind,
                ..
            } => {
                assert_eq!(*commit, repo.main_head());
                assert_eq!(branch, MAIN);
                assert_eq!(*kind, BuildKind::Normal);
            }
            other => panic!("expected main build, got {other:?}"),
        }
        assert_eq!(repo.head("x"), None);
        assert_eq!(repo.merged_into_main(), 1);
    }

    #[test]
    fn green_branch_behind_main_is_rebased_first() {
        let mut repo = Repository::new();
        repo.create_branch("x").unwrap();
        repo.create_branch("y").unwrap();
        repo.merge_branch("x").unwrap();
        let y = repo.head("y").unwrap();

        let out = dispatch(DirectMergePolicy::new(true), &mut repo, &succeeded(y, "y"));
        let rebased = repo.head("y").unwrap();
        assert_ne!(rebased, y);
        assert_eq!(out[0].event.branch(), Some("y"));
        assert_eq!(out[0].event.commit(), Some(rebased));
        assert_eq!(repo.merged_into_main(), 1);

        // The rebased commit contains main, so its success merges.
        dispatch(DirectMergePolicy::new(true), &mut repo, &succeeded(rebased, "y"));
        assert_eq!(repo.head("y"), None);
        assert_eq!(repo.merged_into_main(), 2);
    }

    #[test]
    fn without_rebase_stale_branch_merges_directly() {
        let mut repo = Repository::new();
        repo.create_branch("x").unwrap();
        repo.create_branch("y").unwrap();
        repo.merge_branch("x").unwrap();
        let y = repo.head("y").unwrap();

        dispatch(DirectMergePolicy::new(false), &mut repo, &succeeded(y, "y"));
        assert_eq!(repo.head("y"), None);
        assert_eq!(repo.merged_into_main(), 2);
    }

    #[test]
    fn obsolete_success_has_no_effect() {
        let mut repo = Repository::new();
        repo.create_branch("x").unwrap();
        repo.create_branch("y").unwrap();
        repo.merge_branch("x").unwrap();
        let y_old = repo.head("y").unwrap();
        repo.rebase_branch("y").unwrap();
        let main = repo.main_head();
        let commits = repo.graph().len();

        let out = dispatch(DirectMergePolicy::new(true), &mut repo, &succeeded(y_old, "y"));
        assert!(out.is_empty());
        assert_eq!(repo.main_head(), main);
        assert_eq!(repo.graph().len(), commits);
        assert!(repo.head("y").is_some());
    }

    #[test]
    fn main_success_is_ignored() {
        let mut repo = Repository::new();
        let main = repo.main_head();
        let out = dispatch(DirectMergePolicy::default(), &mut repo, &succeeded(main, MAIN));
        assert!(out.is_empty());
        assert_eq!(repo.main_head(), main);
    }

    #[test]
    fn success_for_deleted_branch_is_ignored() {
        let mut repo = Repository::new();
        let out = dispatch(
            DirectMergePolicy::default(),
            &mut repo,
            &succeeded(CommitId(0), "gone"),
        );
        assert!(out.is_empty());
    }
}
