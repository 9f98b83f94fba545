//! Integration tests: seeded runs are reproducible and keep the
//! repository consistent under every integration policy.

use mergesim_core::{queue_slot, MAIN};
use mergesim_engine::{IntegrationPolicy, RunOutcome, SimConfig, Simulation};
use mergesim_repo::Repository;
use proptest::prelude::*;

fn run(config: SimConfig) -> Simulation {
    let mut sim = Simulation::new(config).unwrap();
    sim.run().unwrap();
    sim
}

fn assert_consistent(repo: &Repository, cap: usize) {
    assert!(repo.open_branch_count() <= cap);
    for entry in repo.queue().iter() {
        assert!(repo.head(&entry.branch).is_some(), "{} lost", entry.branch);
        assert_eq!(repo.head(&queue_slot(&entry.branch)), Some(entry.commit));
    }
    // Every branch head was built from some earlier main.
    let root = repo.graph().iter().next().unwrap().id();
    for (name, head) in repo.branches() {
        assert!(
            head == root || repo.graph().is_ancestor(root, head),
            "{name} is detached"
        );
    }
    assert_eq!(repo.head(MAIN), Some(repo.main_head()));
}

#[test]
fn same_seed_same_history() {
    for policy in IntegrationPolicy::ALL {
        let config = SimConfig::default().with_policy(policy).with_seed(42);
        let a = run(config.clone());
        let b = run(config);
        assert_eq!(a.history().digest(), b.history().digest(), "{policy}");
        assert_eq!(
            a.report(RunOutcome::HorizonReached),
            b.report(RunOutcome::HorizonReached)
        );
    }
}

#[test]
fn different_seeds_diverge() {
    let a = run(SimConfig::default().with_seed(1));
    let b = run(SimConfig::default().with_seed(2));
    assert_ne!(a.history().digest(), b.history().digest());
}

#[test]
fn every_policy_runs_five_days() {
    for policy in IntegrationPolicy::ALL {
        let mut sim = Simulation::new(SimConfig::default().with_policy(policy)).unwrap();
        let outcome = sim.run().unwrap();
        assert_eq!(outcome, RunOutcome::HorizonReached, "{policy}");
        assert!(sim.now() < sim.horizon());
        assert!(sim.repo().merged_into_main() > 0, "{policy} never merged");
        assert_consistent(sim.repo(), 3);

        let report = sim.report(outcome);
        assert_eq!(report.policy, policy.as_str());
        assert_eq!(report.events, sim.history().len());
        assert!(report.builds_per_merge.is_some_and(|r| r >= 1.0));
    }
}

#[test]
fn direct_merge_never_rebases() {
    let sim = run(SimConfig::default().with_policy(IntegrationPolicy::DirectMerge));
    assert_eq!(sim.repo().stats().rebases, 0);
    assert_eq!(sim.repo().stats().admissions, 0);
}

#[test]
fn merge_queue_never_merges_directly() {
    let sim = run(SimConfig::default().with_policy(IntegrationPolicy::MergeQueue));
    assert_eq!(sim.repo().stats().direct_merges, 0);
    assert_eq!(sim.repo().stats().rebases, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_seed_keeps_the_repository_consistent(
        seed in any::<u64>(),
        policy in prop::sample::select(IntegrationPolicy::ALL.to_vec()),
        cap in 1usize..6,
    ) {
        let config = SimConfig::default()
            .with_policy(policy)
            .with_seed(seed)
            .with_days(2)
            .with_branch_cap(cap);
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run().unwrap();
        prop_assert_eq!(outcome, RunOutcome::HorizonReached);
        assert_consistent(sim.repo(), cap);

        // Build accounting: every trigger before the horizon is in history.
        let history = sim.history();
        prop_assert_eq!(
            history.main_builds() + history.branch_builds(),
            history.triggers().count()
        );
    }
}
