//! Strongly-typed identifiers, simulated time, and branch naming rules.

use serde::Serialize;
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// Name of the integrated trunk. Always present in a repository.
pub const MAIN: &str = "main";

/// Prefix of the branch-table names that identify merge-queue slots.
pub const QUEUE_PREFIX: &str = "queue/";

/// Branch-table name of the merge-queue slot for `branch`.
pub fn queue_slot(branch: &str) -> String {
    format!("{QUEUE_PREFIX}{branch}")
}

/// The branch a merge-queue slot name refers to, or `None` if `name`
/// is not a queue slot.
pub fn queued_branch(name: &str) -> Option<&str> {
    name.strip_prefix(QUEUE_PREFIX)
}

/// Identifies a commit in the commit graph.
///
/// Commits are appended to an arena and assigned dense sequential IDs.
/// `CommitId(n)` is the n-th commit ever created; `CommitId(0)` is the
/// initial commit on `main`. Because parents always pre-exist their
/// children, a parent's ID is strictly smaller than its child's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CommitId(pub u32);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for CommitId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies one CI run.
///
/// Allocated from the repository's build sequence when the build is
/// triggered; carried by the trigger and its completion event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BuildId(pub u64);

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for BuildId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// An absolute point on the simulated clock, in milliseconds since the
/// start of the run.
///
/// Arithmetic with [`Duration`] saturates instead of overflowing; a
/// saturated timestamp is always past any configured horizon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SimTime(pub u64);

impl SimTime {
    /// The start of the run.
    pub const ZERO: SimTime = SimTime(0);

    /// Timestamp `offset` after the start of the run.
    pub fn from_duration(offset: Duration) -> Self {
        Self(u64::try_from(offset.as_millis()).unwrap_or(u64::MAX))
    }

    /// Offset of this timestamp from the start of the run.
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Elapsed simulated time in (fractional) days.
    pub fn as_days_f64(self) -> f64 {
        self.0 as f64 / 86_400_000.0
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0.saturating_add(SimTime::from_duration(rhs).0))
    }
}

impl Sub for SimTime {
    type Output = Duration;

    fn sub(self, rhs: SimTime) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0 / 1000;
        let days = total_secs / 86_400;
        let hours = (total_secs % 86_400) / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        write!(f, "{days}d {hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_slot_round_trips_branch_name() {
        let slot = queue_slot("branch-7");
        assert_eq!(slot, "queue/branch-7");
        assert_eq!(queued_branch(&slot), Some("branch-7"));
        assert_eq!(queued_branch("branch-7"), None);
        assert_eq!(queued_branch(MAIN), None);
    }

    #[test]
    fn sim_time_adds_durations() {
        let t = SimTime::ZERO + Duration::from_secs(90 * 60);
        assert_eq!(t, SimTime(5_400_000));
        assert_eq!(t - SimTime::ZERO, Duration::from_secs(5400));
    }

    #[test]
    fn sim_time_addition_saturates() {
        let t = SimTime(u64::MAX - 1) + Duration::from_secs(1);
        assert_eq!(t, SimTime(u64::MAX));
    }

    #[test]
    fn sim_time_display_shows_days_and_clock() {
        let t = SimTime::from_duration(Duration::from_secs(86_400 + 2 * 3600 + 15 * 60 + 9));
        assert_eq!(t.to_string(), "1d 02:15:09");
        assert_eq!(SimTime::ZERO.to_string(), "0d 00:00:00");
    }

    #[test]
    fn sim_time_days() {
        let t = SimTime::from_duration(Duration::from_secs(5 * 86_400));
        assert!((t.as_days_f64() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn commit_and_build_ids_display() {
        assert_eq!(CommitId(3).to_string(), "c3");
        assert_eq!(BuildId(12).to_string(), "#12");
    }
}
