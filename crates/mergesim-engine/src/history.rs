//! Ordered log of dispatched events and its FNV-1a digest.
//!
//! The digest is not cryptographically secure; it is a fast equality
//! check for comparing runs (same seed, same digest).

use mergesim_core::{BuildKind, Event, SimTime, MAIN};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

#[inline]
fn fnv1a_u64(hash: u64, v: u64) -> u64 {
    fnv1a_bytes(hash, &v.to_le_bytes())
}

/// Every `(time, event)` pair dispatched during a run, in dispatch order.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<(SimTime, Event)>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dispatched event.
    pub fn record(&mut self, time: SimTime, event: Event) {
        self.entries.push((time, event));
    }

    /// Number of dispatched events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been dispatched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(time, event)` pairs in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &(SimTime, Event)> {
        self.entries.iter()
    }

    /// Time of the last dispatched event.
    pub fn last_time(&self) -> Option<SimTime> {
        self.entries.last().map(|(t, _)| *t)
    }

    /// Build triggers dispatched, as `(branch, kind)` pairs.
    pub fn triggers(&self) -> impl Iterator<Item = (&str, BuildKind)> {
        self.entries.iter().filter_map(|(_, e)| match e {
            Event::BuildTriggered { branch, kind, .. } => Some((branch.as_str(), *kind)),
            _ => None,
        })
    }

    /// Number of builds triggered on `main`.
    pub fn main_builds(&self) -> usize {
        self.triggers().filter(|(b, _)| *b == MAIN).count()
    }

    /// Number of builds triggered on any other name.
    pub fn branch_builds(&self) -> usize {
        self.triggers().filter(|(b, _)| *b != MAIN).count()
    }

    /// Number of manual retry builds triggered.
    pub fn manual_retries(&self) -> usize {
        self.triggers()
            .filter(|(_, k)| *k == BuildKind::ManualRetry)
            .count()
    }

    /// FNV-1a digest over every entry's time, kind, and build fields.
    ///
    /// Returns `FNV_OFFSET` (non-zero) for an empty history.
    pub fn digest(&self) -> u64 {
        let mut hash = FNV_OFFSET;
        for (time, event) in &self.entries {
            hash = fnv1a_u64(hash, time.0);
            hash = fnv1a_byte(hash, event.kind() as u8);
            match event {
                Event::BuildTriggered {
                    build,
                    commit,
                    branch,
                    kind,
                } => {
                    hash = fnv1a_u64(hash, build.0);
                    hash = fnv1a_u64(hash, u64::from(commit.0));
                    hash = fnv1a_bytes(hash, branch.as_bytes());
                    hash = fnv1a_byte(hash, *kind as u8);
                }
                Event::BuildSucceeded {
                    build,
                    commit,
                    branch,
                }
                | Event::BuildFailed {
                    build,
                    commit,
                    branch,
                } => {
                    hash = fnv1a_u64(hash, build.0);
                    hash = fnv1a_u64(hash, u64::from(commit.0));
                    hash = fnv1a_bytes(hash, branch.as_bytes());
                }
                Event::BranchGeneratorTick | Event::RetrySweepTick => {}
            }
        }
        hash
    }
}
