//! Build kinds, stochastic build profiles, and recorded build statuses.

use crate::traits::UniformSource;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which profile a triggered build runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BuildKind {
    /// A regular CI build triggered by a push, rebase, merge, or queue admission.
    Normal,
    /// A human-initiated retry of a failed build. Runs under the retry
    /// profile, which supersedes the normal one.
    ManualRetry,
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "build"),
            Self::ManualRetry => write!(f, "manual retry"),
        }
    }
}

/// Sampled result of a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The build passed.
    Succeeded,
    /// The build failed.
    Failed,
}

/// Recorded status of the most recent completed (or retrying) build of a commit.
///
/// A commit absent from the status map has never completed a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BuildStatus {
    /// The last build of the commit passed.
    Success,
    /// The last build of the commit failed and no retry is in flight.
    Failure,
    /// A manual retry of a failed build is in flight.
    Retrying,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Retrying => write!(f, "retrying"),
        }
    }
}

/// Duration range and success probability of one class of build.
///
/// Durations are uniform in `[min_duration, max_duration]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildProfile {
    /// Shortest possible build. Default (normal): 1h.
    pub min_duration: Duration,
    /// Longest possible build. Default (normal): 3h.
    pub max_duration: Duration,
    /// Probability in `[0, 1]` that the build passes. Default (normal): 0.5.
    pub success_probability: f64,
}

impl BuildProfile {
    /// Profile of a regular CI build: 1h to 3h, passes half the time.
    pub const fn normal() -> Self {
        Self {
            min_duration: Duration::from_secs(3600),
            max_duration: Duration::from_secs(3 * 3600),
            success_probability: 0.5,
        }
    }

    /// Profile of a manual retry: 15min to 45min, passes 90% of the time.
    pub const fn manual_retry() -> Self {
        Self {
            min_duration: Duration::from_secs(15 * 60),
            max_duration: Duration::from_secs(45 * 60),
            success_probability: 0.9,
        }
    }

    /// Replace the success probability.
    pub const fn with_success_probability(mut self, p: f64) -> Self {
        self.success_probability = p;
        self
    }

    /// Draw an outcome and then a duration from `source`.
    ///
    /// The outcome is `Succeeded` iff the first draw is below the success
    /// probability; the second draw scales the duration range. Exactly two
    /// draws are consumed per call.
    pub fn sample(&self, source: &mut dyn UniformSource) -> (BuildOutcome, Duration) {
        let outcome = if source.next_unit() < self.success_probability {
            BuildOutcome::Succeeded
        } else {
            BuildOutcome::Failed
        };
        let span = self.max_duration.saturating_sub(self.min_duration);
        let duration = self.min_duration + span.mul_f64(source.next_unit().clamp(0.0, 1.0));
        (outcome, duration)
    }
}

impl Default for BuildProfile {
    fn default() -> Self {
        Self::normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f64>);

    impl UniformSource for Fixed {
        fn next_unit(&mut self) -> f64 {
            self.0.remove(0)
        }
    }

    #[test]
    fn sample_below_probability_succeeds() {
        let mut src = Fixed(vec![0.49, 0.0]);
        let (outcome, d) = BuildProfile::normal().sample(&mut src);
        assert_eq!(outcome, BuildOutcome::Succeeded);
        assert_eq!(d, Duration::from_secs(3600));
    }

    #[test]
    fn sample_at_probability_fails() {
        let mut src = Fixed(vec![0.5, 0.5]);
        let (outcome, d) = BuildProfile::normal().sample(&mut src);
        assert_eq!(outcome, BuildOutcome::Failed);
        assert_eq!(d, Duration::from_secs(2 * 3600));
    }

    #[test]
    fn manual_retry_profile_is_short() {
        let mut src = Fixed(vec![0.89, 1.0]);
        let (outcome, d) = BuildProfile::manual_retry().sample(&mut src);
        assert_eq!(outcome, BuildOutcome::Succeeded);
        assert_eq!(d, Duration::from_secs(45 * 60));
    }

    #[test]
    fn certain_success_never_fails() {
        let profile = BuildProfile::normal().with_success_probability(1.0);
        for u in [0.0, 0.25, 0.999_999] {
            let mut src = Fixed(vec![u, u]);
            assert_eq!(profile.sample(&mut src).0, BuildOutcome::Succeeded);
        }
    }
}
