//! The [`Processor`] trait, its [`Delayed`] output, and the [`StateSet`]
//! write declaration.
//!
//! Processors are stateless rule handlers dispatched in registration order
//! for every event. They declare at registration which event kinds they
//! react to and which parts of the repository they write, enabling the
//! driver to validate the pipeline and precompute dispatch routes.

use crate::context::DispatchContext;
use mergesim_core::{Event, EventKindSet, ProcessorError};
use std::fmt;
use std::time::Duration;

/// An event to enqueue `delay` after the current simulated time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delayed {
    /// The event to schedule.
    pub event: Event,
    /// Offset from the time of the event being dispatched.
    pub delay: Duration,
}

impl Delayed {
    /// Schedule `event` at the current time, after everything already
    /// queued for that time.
    pub fn now(event: Event) -> Self {
        Self {
            event,
            delay: Duration::ZERO,
        }
    }

    /// Schedule `event` after `delay`.
    pub fn after(event: Event, delay: Duration) -> Self {
        Self { event, delay }
    }
}

/// A part of the repository state a processor may mutate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateDomain {
    /// The per-commit build status map.
    Statuses = 0,
    /// Names other than `main` in the branch table.
    Branches = 1,
    /// The head of `main`.
    Main = 2,
    /// Merge-queue entries and their `queue/` slots.
    MergeQueue = 3,
}

impl StateDomain {
    /// All domains, in discriminant order.
    pub const ALL: [StateDomain; 4] = [
        StateDomain::Statuses,
        StateDomain::Branches,
        StateDomain::Main,
        StateDomain::MergeQueue,
    ];
}

impl fmt::Display for StateDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statuses => write!(f, "statuses"),
            Self::Branches => write!(f, "branches"),
            Self::Main => write!(f, "main"),
            Self::MergeQueue => write!(f, "merge queue"),
        }
    }
}

/// A set of [`StateDomain`]s, stored as a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StateSet {
    bits: u8,
}

impl StateSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Insert a domain.
    pub fn insert(&mut self, domain: StateDomain) {
        self.bits |= 1 << (domain as u8);
    }

    /// Whether the set contains `domain`.
    pub fn contains(&self, domain: StateDomain) -> bool {
        self.bits & (1 << (domain as u8)) != 0
    }

    /// `self & other`.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// Whether the set contains no domains.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterate the domains in the set, in discriminant order.
    pub fn iter(&self) -> impl Iterator<Item = StateDomain> + '_ {
        StateDomain::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<StateDomain> for StateSet {
    fn from_iter<I: IntoIterator<Item = StateDomain>>(iter: I) -> Self {
        let mut set = Self::empty();
        for domain in iter {
            set.insert(domain);
        }
        set
    }
}

/// A stateless rule handler in the simulation's dispatch pipeline.
///
/// # Contract
///
/// - `handle()` MUST be deterministic given the repository state and the
///   draws it takes from the context's uniform source.
/// - `&self`: processors hold configuration only; all mutable state lives
///   in the [`Repository`](mergesim_repo::Repository).
/// - `reacts_to()` and `writes()` are called once at validation, not per
///   dispatch.
///
/// # Object safety
///
/// This trait is object-safe; the driver stores processors as
/// `Vec<Box<dyn Processor>>`.
///
/// # Examples
///
/// A processor that keeps a timer event recurring every hour:
///
/// ```
/// use std::time::Duration;
/// use mergesim_core::{Event, EventKind, EventKindSet, ProcessorError};
/// use mergesim_processor::{Delayed, DispatchContext, Processor, StateSet};
///
/// struct Heartbeat;
///
/// impl Processor for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     fn reacts_to(&self) -> EventKindSet {
///         [EventKind::BranchGeneratorTick].into_iter().collect()
///     }
///
///     fn writes(&self) -> StateSet { StateSet::empty() }
///
///     fn handle(
///         &self,
///         event: &Event,
///         _ctx: &mut DispatchContext<'_>,
///     ) -> Result<Vec<Delayed>, ProcessorError> {
///         Ok(vec![Delayed::after(event.clone(), Duration::from_secs(3600))])
///     }
/// }
///
/// assert_eq!(Heartbeat.name(), "heartbeat");
/// ```
pub trait Processor: Send + 'static {
    /// Human-readable name for error reporting and logs. Unique per pipeline.
    fn name(&self) -> &str;

    /// Event kinds this processor is dispatched for.
    fn reacts_to(&self) -> EventKindSet;

    /// Repository state this processor may mutate.
    ///
    /// Two processors reacting to a common event kind must not write a
    /// common domain.
    fn writes(&self) -> StateSet;

    /// Handle one event, returning the events to schedule.
    ///
    /// Only called for kinds in [`reacts_to()`](Processor::reacts_to).
    /// Expected divergence (obsolete or stale builds) returns `Ok` with no
    /// events; an `Err` aborts the run.
    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError>;
}
