//! The closed set of simulation events and the [`EventKindSet`] bitset.
//!
//! Every state change in a run is caused by dispatching one of these
//! events. Processors declare the [`EventKind`]s they react to and match
//! on the variants they care about.

use crate::build::BuildKind;
use crate::id::{BuildId, CommitId};
use std::fmt;

/// A domain event scheduled on the simulation clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A CI run was requested for `commit` on `branch`.
    BuildTriggered {
        /// Identity of the run.
        build: BuildId,
        /// The commit under test.
        commit: CommitId,
        /// Branch-table name the build was triggered for (may be `main`
        /// or a `queue/` slot).
        branch: String,
        /// Which profile the run samples from.
        kind: BuildKind,
    },
    /// A CI run passed.
    BuildSucceeded {
        /// Identity of the run.
        build: BuildId,
        /// The commit that was tested.
        commit: CommitId,
        /// Branch-table name the build was triggered for.
        branch: String,
    },
    /// A CI run failed.
    BuildFailed {
        /// Identity of the run.
        build: BuildId,
        /// The commit that was tested.
        commit: CommitId,
        /// Branch-table name the build was triggered for.
        branch: String,
    },
    /// Recurring timer of the branch generator.
    BranchGeneratorTick,
    /// Recurring timer of the manual retry sweep.
    RetrySweepTick,
}

impl Event {
    /// The discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BuildTriggered { .. } => EventKind::BuildTriggered,
            Self::BuildSucceeded { .. } => EventKind::BuildSucceeded,
            Self::BuildFailed { .. } => EventKind::BuildFailed,
            Self::BranchGeneratorTick => EventKind::BranchGeneratorTick,
            Self::RetrySweepTick => EventKind::RetrySweepTick,
        }
    }

    /// The commit a build event refers to.
    pub fn commit(&self) -> Option<CommitId> {
        match self {
            Self::BuildTriggered { commit, .. }
            | Self::BuildSucceeded { commit, .. }
            | Self::BuildFailed { commit, .. } => Some(*commit),
            Self::BranchGeneratorTick | Self::RetrySweepTick => None,
        }
    }

    /// The branch-table name a build event refers to.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Self::BuildTriggered { branch, .. }
            | Self::BuildSucceeded { branch, .. }
            | Self::BuildFailed { branch, .. } => Some(branch),
            Self::BranchGeneratorTick | Self::RetrySweepTick => None,
        }
    }

    /// Whether this is a build trigger or completion, as opposed to a timer.
    pub fn is_build(&self) -> bool {
        self.commit().is_some()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildTriggered {
                build,
                commit,
                branch,
                kind,
            } => write!(f, "{kind} {build} triggered for {commit} on '{branch}'"),
            Self::BuildSucceeded {
                build,
                commit,
                branch,
            } => write!(f, "build {build} of {commit} on '{branch}' succeeded"),
            Self::BuildFailed {
                build,
                commit,
                branch,
            } => write!(f, "build {build} of {commit} on '{branch}' failed"),
            Self::BranchGeneratorTick => write!(f, "branch generator tick"),
            Self::RetrySweepTick => write!(f, "retry sweep tick"),
        }
    }
}

/// Discriminant of an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventKind {
    /// [`Event::BuildTriggered`].
    BuildTriggered = 0,
    /// [`Event::BuildSucceeded`].
    BuildSucceeded = 1,
    /// [`Event::BuildFailed`].
    BuildFailed = 2,
    /// [`Event::BranchGeneratorTick`].
    BranchGeneratorTick = 3,
    /// [`Event::RetrySweepTick`].
    RetrySweepTick = 4,
}

impl EventKind {
    /// All kinds, in discriminant order.
    pub const ALL: [EventKind; 5] = [
        EventKind::BuildTriggered,
        EventKind::BuildSucceeded,
        EventKind::BuildFailed,
        EventKind::BranchGeneratorTick,
        EventKind::RetrySweepTick,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of [`EventKind`]s, stored as a bitmask.
///
/// Used by processors to declare which events they react to; the driver
/// skips processors whose set does not contain the dispatched kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventKindSet {
    bits: u8,
}

impl EventKindSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Insert a kind.
    pub fn insert(&mut self, kind: EventKind) {
        self.bits |= kind.bit();
    }

    /// Whether the set contains `kind`.
    pub fn contains(&self, kind: EventKind) -> bool {
        self.bits & kind.bit() != 0
    }

    /// `self & other`.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// `self | other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Whether the set contains no kinds.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of kinds in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate the kinds in the set, in discriminant order.
    pub fn iter(&self) -> impl Iterator<Item = EventKind> + '_ {
        EventKind::ALL.into_iter().filter(|k| self.contains(*k))
    }
}

impl FromIterator<EventKind> for EventKindSet {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn succeeded() -> Event {
        Event::BuildSucceeded {
            build: BuildId(4),
            commit: CommitId(9),
            branch: "branch-1".to_string(),
        }
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(succeeded().kind(), EventKind::BuildSucceeded);
        assert_eq!(Event::RetrySweepTick.kind(), EventKind::RetrySweepTick);
        assert_eq!(
            Event::BranchGeneratorTick.kind(),
            EventKind::BranchGeneratorTick
        );
    }

    #[test]
    fn build_events_expose_commit_and_branch() {
        let e = succeeded();
        assert_eq!(e.commit(), Some(CommitId(9)));
        assert_eq!(e.branch(), Some("branch-1"));
        assert!(e.is_build());
        assert_eq!(Event::RetrySweepTick.commit(), None);
        assert!(!Event::BranchGeneratorTick.is_build());
    }

    #[test]
    fn display_names_the_build() {
        let e = Event::BuildTriggered {
            build: BuildId(2),
            commit: CommitId(5),
            branch: "main".to_string(),
            kind: BuildKind::ManualRetry,
        };
        assert_eq!(e.to_string(), "manual retry #2 triggered for c5 on 'main'");
    }

    #[test]
    fn empty_set_contains_nothing() {
        let s = EventKindSet::empty();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert!(EventKind::ALL.iter().all(|k| !s.contains(*k)));
    }

    #[test]
    fn set_iterates_in_discriminant_order() {
        let s: EventKindSet = [EventKind::RetrySweepTick, EventKind::BuildTriggered]
            .into_iter()
            .collect();
        let kinds: Vec<_> = s.iter().collect();
        assert_eq!(
            kinds,
            vec![EventKind::BuildTriggered, EventKind::RetrySweepTick]
        );
    }

    fn arb_kind() -> impl Strategy<Value = EventKind> {
        (0usize..EventKind::ALL.len()).prop_map(|i| EventKind::ALL[i])
    }

    proptest! {
        #[test]
        fn union_and_intersection_agree_with_membership(
            a in proptest::collection::vec(arb_kind(), 0..6),
            b in proptest::collection::vec(arb_kind(), 0..6),
        ) {
            let sa: EventKindSet = a.iter().copied().collect();
            let sb: EventKindSet = b.iter().copied().collect();
            for k in EventKind::ALL {
                prop_assert_eq!(sa.union(&sb).contains(k), a.contains(&k) || b.contains(&k));
                prop_assert_eq!(sa.intersection(&sb).contains(k), a.contains(&k) && b.contains(&k));
            }
        }
    }
}
