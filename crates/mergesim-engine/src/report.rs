//! End-of-run summary statistics.

use std::fmt;

use mergesim_core::{BuildStatus, CommitId};
use mergesim_repo::RepoStats;
use serde::Serialize;

use crate::simulation::{RunOutcome, Simulation};

/// Final state of one branch-table name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchSummary {
    /// Branch-table name.
    pub name: String,
    /// Head commit.
    pub head: CommitId,
    /// Head commit's label.
    pub label: String,
    /// Status of the head's latest build, if any completed.
    pub status: Option<BuildStatus>,
}

/// Throughput and cost statistics of a finished run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    /// Policy selector of the run.
    pub policy: String,
    /// Seed of the run's uniform source.
    pub seed: u64,
    /// Horizon in days.
    pub days: f64,
    /// Branches integrated into `main` (first-parent depth of `main`).
    pub merged: usize,
    /// `merged / days`.
    pub merges_per_day: f64,
    /// Builds triggered on `main`.
    pub main_builds: usize,
    /// Builds triggered on any other name, queue slots included.
    pub branch_builds: usize,
    /// `(main_builds + branch_builds) / main_builds`; `None` without main builds.
    pub builds_per_merge: Option<f64>,
    /// Manual retry builds triggered.
    pub manual_retries: usize,
    /// `manual_retries / main_builds`; `None` without main builds.
    pub retries_per_merge: Option<f64>,
    /// Cumulative repository operation counts.
    pub stats: RepoStats,
    /// Every name left in the branch table, `main` first.
    pub branches: Vec<BranchSummary>,
    /// Whether the queue drained before the horizon.
    pub stalled: bool,
    /// Number of dispatched events.
    pub events: usize,
    /// FNV-1a digest of the dispatched history.
    pub digest: u64,
}

fn per_main_build(n: usize, main_builds: usize) -> Option<f64> {
    (main_builds > 0).then(|| n as f64 / main_builds as f64)
}

impl RunReport {
    /// Summarize `sim` as it stands.
    pub fn new(sim: &Simulation, outcome: RunOutcome) -> Self {
        let repo = sim.repo();
        let history = sim.history();
        let config = sim.config();

        let days = config.horizon.as_secs_f64() / 86_400.0;
        let merged = repo.merged_into_main();
        let main_builds = history.main_builds();
        let branch_builds = history.branch_builds();
        let manual_retries = history.manual_retries();

        let branches = repo
            .branches()
            .map(|(name, head)| BranchSummary {
                name: name.to_string(),
                head,
                label: repo
                    .graph()
                    .get(head)
                    .map(|c| c.label().to_string())
                    .unwrap_or_default(),
                status: repo.status_of(head),
            })
            .collect();

        Self {
            policy: config.policy.to_string(),
            seed: config.seed,
            days,
            merged,
            merges_per_day: merged as f64 / days,
            main_builds,
            branch_builds,
            builds_per_merge: per_main_build(main_builds + branch_builds, main_builds),
            manual_retries,
            retries_per_merge: per_main_build(manual_retries, main_builds),
            stats: *repo.stats(),
            branches,
            stalled: outcome.is_stalled(),
            events: history.len(),
            digest: history.digest(),
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn ratio(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"))
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{} seed={}] {} branches merged into main over {} days ({:.2} per day).",
            self.policy, self.seed, self.merged, self.days, self.merges_per_day
        )?;
        writeln!(
            f,
            "There were {} main builds and {} branch builds ({} builds per merged branch).",
            self.main_builds,
            self.branch_builds,
            ratio(self.builds_per_merge)
        )?;
        writeln!(
            f,
            "There were {} manual retries ({} per merge).",
            self.manual_retries,
            ratio(self.retries_per_merge)
        )?;
        if self.stalled {
            writeln!(f, "The pipeline stalled before the horizon.")?;
        }
        for b in &self.branches {
            let status = b.status.map_or_else(|| "unknown".to_string(), |s| s.to_string());
            writeln!(
                f,
                "  Branch {} at commit {} ({}) is {}",
                b.name, b.head, b.label, status
            )?;
        }
        write!(f, "{} events, history digest {:016x}", self.events, self.digest)
    }
}
