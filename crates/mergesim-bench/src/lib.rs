//! Benchmark profiles for the mergesim simulator.
//!
//! Provides pre-built [`SimConfig`] profiles for benchmarking:
//!
//! - [`reference_profile`]: the default five-day run with three open branches
//! - [`stress_profile`]: sixty days with twelve open branches and faster builds

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::time::Duration;

use mergesim_core::BuildProfile;
use mergesim_engine::{IntegrationPolicy, SimConfig};

/// The default model: 5 days, cap 3, 1h generator, 24h retry sweep.
pub fn reference_profile(seed: u64, policy: IntegrationPolicy) -> SimConfig {
    SimConfig::default().with_policy(policy).with_seed(seed)
}

/// A long, busy run: 60 days, cap 12, 10min-30min builds at p=0.7.
///
/// Keeps the merge queue deep and the commit graph large, so ancestor-set
/// construction dominates.
pub fn stress_profile(seed: u64, policy: IntegrationPolicy) -> SimConfig {
    reference_profile(seed, policy)
        .with_days(60)
        .with_branch_cap(12)
        .with_normal_build(BuildProfile {
            min_duration: Duration::from_secs(10 * 60),
            max_duration: Duration::from_secs(30 * 60),
            success_probability: 0.7,
        })
}
