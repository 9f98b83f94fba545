//! Simulation configuration, validation, and error types.
//!
//! [`SimConfig`] is the builder-input for constructing a [`Simulation`].
//! [`validate()`](SimConfig::validate) checks structural invariants before
//! a run; [`processors()`](SimConfig::processors) assembles the rule set
//! for the selected [`IntegrationPolicy`].
//!
//! [`Simulation`]: crate::Simulation

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use mergesim_core::{BuildProfile, Event, SimTime};
use mergesim_processor::{validate_pipeline, PipelineError, Processor};
use mergesim_processors::{
    BranchGenerator, BuildStarter, DirectMergePolicy, MergeQueuePolicy, RetrySweep,
    StatusRecorder, DEFAULT_BRANCH_CAP, DEFAULT_GENERATOR_INTERVAL, DEFAULT_SWEEP_INTERVAL,
};
use thiserror::Error;

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(24 * 3600);

// ── IntegrationPolicy ──────────────────────────────────────────────

/// How green branches reach `main`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IntegrationPolicy {
    /// Merge each green branch straight into `main`.
    DirectMerge,
    /// Merge green branches that already contain `main`; rebase the rest.
    DirectMergeWithRebase,
    /// Land green branches through the speculative merge queue.
    #[default]
    MergeQueue,
}

impl IntegrationPolicy {
    /// All policies, in selector order.
    pub const ALL: [IntegrationPolicy; 3] = [
        IntegrationPolicy::DirectMerge,
        IntegrationPolicy::DirectMergeWithRebase,
        IntegrationPolicy::MergeQueue,
    ];

    /// The selector string accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectMerge => "direct",
            Self::DirectMergeWithRebase => "direct+rebase",
            Self::MergeQueue => "merge-queue",
        }
    }

    /// The same policy with rebase-on-success switched off.
    pub fn without_rebase(self) -> Self {
        match self {
            Self::DirectMergeWithRebase => Self::DirectMerge,
            other => other,
        }
    }
}

impl fmt::Display for IntegrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownPolicy {
                name: s.to_string(),
            })
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SimConfig::validate()`] or pipeline setup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Processor pipeline validation failed.
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),
    /// A policy selector did not name a known policy.
    #[error("unknown policy '{name}' (expected direct, direct+rebase, or merge-queue)")]
    UnknownPolicy {
        /// The unrecognized selector.
        name: String,
    },
    /// A success probability is NaN or outside `[0, 1]`.
    #[error("{profile} success probability must be in [0, 1], got {value}")]
    InvalidProbability {
        /// Which build profile.
        profile: &'static str,
        /// The invalid value.
        value: f64,
    },
    /// A build profile's duration range is empty or inverted.
    #[error("{profile} durations invalid: {reason}")]
    InvalidDuration {
        /// Which build profile.
        profile: &'static str,
        /// Description of the violated bound.
        reason: String,
    },
    /// The horizon is zero.
    #[error("horizon must be positive")]
    ZeroHorizon,
    /// A periodic interval is zero, which would re-fire forever at one instant.
    #[error("{which} interval must be positive")]
    ZeroInterval {
        /// Which timer.
        which: &'static str,
    },
    /// The branch cap is zero.
    #[error("branch cap must be at least 1")]
    ZeroBranchCap,
}

fn validate_profile(profile: &'static str, p: &BuildProfile) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&p.success_probability) {
        return Err(ConfigError::InvalidProbability {
            profile,
            value: p.success_probability,
        });
    }
    if p.max_duration.is_zero() {
        return Err(ConfigError::InvalidDuration {
            profile,
            reason: "max_duration must be positive".to_string(),
        });
    }
    if p.min_duration > p.max_duration {
        return Err(ConfigError::InvalidDuration {
            profile,
            reason: format!(
                "min_duration {:?} exceeds max_duration {:?}",
                p.min_duration, p.max_duration,
            ),
        });
    }
    Ok(())
}

// ── SimConfig ──────────────────────────────────────────────────────

/// Complete configuration for one simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Integration policy. Default: merge queue.
    pub policy: IntegrationPolicy,
    /// Seed of the run's uniform source. Default: 0.
    pub seed: u64,
    /// Span after which no further events are dispatched. Default: 5 days.
    pub horizon: Duration,
    /// Open branches the generator maintains. Default: 3.
    pub branch_cap: usize,
    /// Period of the branch generator. Default: 1h.
    pub generator_interval: Duration,
    /// Period of the manual retry sweep. Default: 24h.
    pub sweep_interval: Duration,
    /// Offset of the first generator tick. Default: 0.
    pub generator_start: Duration,
    /// Offset of the first retry sweep. Default: 9h.
    pub sweep_start: Duration,
    /// Profile of regular builds. Default: 1h-3h, p=0.5.
    pub normal_build: BuildProfile,
    /// Profile of manual retries. Default: 15min-45min, p=0.9.
    pub retry_build: BuildProfile,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: IntegrationPolicy::default(),
            seed: 0,
            horizon: 5 * DAY,
            branch_cap: DEFAULT_BRANCH_CAP,
            generator_interval: DEFAULT_GENERATOR_INTERVAL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            generator_start: Duration::ZERO,
            sweep_start: 9 * HOUR,
            normal_build: BuildProfile::normal(),
            retry_build: BuildProfile::manual_retry(),
        }
    }
}

impl SimConfig {
    /// Set the integration policy.
    pub fn with_policy(mut self, policy: IntegrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the horizon.
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the horizon in whole days.
    pub fn with_days(self, days: u64) -> Self {
        self.with_horizon(DAY.saturating_mul(u32::try_from(days).unwrap_or(u32::MAX)))
    }

    /// Set the branch cap.
    pub fn with_branch_cap(mut self, cap: usize) -> Self {
        self.branch_cap = cap;
        self
    }

    /// Set both timer periods.
    pub fn with_intervals(mut self, generator: Duration, sweep: Duration) -> Self {
        self.generator_interval = generator;
        self.sweep_interval = sweep;
        self
    }

    /// Set the first-tick offsets of the generator and the sweep.
    pub fn with_start_offsets(mut self, generator: Duration, sweep: Duration) -> Self {
        self.generator_start = generator;
        self.sweep_start = sweep;
        self
    }

    /// Set the profile of regular builds.
    pub fn with_normal_build(mut self, profile: BuildProfile) -> Self {
        self.normal_build = profile;
        self
    }

    /// Set the profile of manual retries.
    pub fn with_retry_build(mut self, profile: BuildProfile) -> Self {
        self.retry_build = profile;
        self
    }

    /// The horizon as an absolute timestamp.
    pub fn horizon_time(&self) -> SimTime {
        SimTime::from_duration(self.horizon)
    }

    /// Validate all structural invariants, including the assembled pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Horizon and timers.
        if self.horizon.is_zero() {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.generator_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                which: "branch generator",
            });
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                which: "retry sweep",
            });
        }
        // 2. Branch cap.
        if self.branch_cap == 0 {
            return Err(ConfigError::ZeroBranchCap);
        }
        // 3. Build profiles.
        validate_profile("normal build", &self.normal_build)?;
        validate_profile("manual retry", &self.retry_build)?;
        // 4. Pipeline. The plan is rebuilt by the simulation constructor.
        let _ = validate_pipeline(&self.processors())?;
        Ok(())
    }

    /// The rule set for this configuration, in registration order.
    pub fn processors(&self) -> Vec<Box<dyn Processor>> {
        let policy: Box<dyn Processor> = match self.policy {
            IntegrationPolicy::DirectMerge => Box::new(DirectMergePolicy::new(false)),
            IntegrationPolicy::DirectMergeWithRebase => Box::new(DirectMergePolicy::new(true)),
            IntegrationPolicy::MergeQueue => Box::new(MergeQueuePolicy),
        };
        vec![
            Box::new(
                BuildStarter::new()
                    .with_normal(self.normal_build)
                    .with_retry(self.retry_build),
            ),
            Box::new(StatusRecorder),
            policy,
            Box::new(BranchGenerator::new(
                self.branch_cap,
                self.generator_interval,
            )),
            Box::new(RetrySweep::new(self.sweep_interval)),
        ]
    }

    /// The timer events that start a run.
    pub fn seed_events(&self) -> Vec<(Event, SimTime)> {
        vec![
            (
                Event::BranchGeneratorTick,
                SimTime::from_duration(self.generator_start),
            ),
            (
                Event::RetrySweepTick,
                SimTime::from_duration(self.sweep_start),
            ),
        ]
    }
}
