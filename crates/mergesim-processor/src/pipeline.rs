//! Pipeline validation and dispatch route planning.
//!
//! [`validate_pipeline`] runs once before a simulation starts to check the
//! processor list for structural errors and build the [`DispatchPlan`], a
//! precomputed table of which processors receive each event kind.

use indexmap::{IndexMap, IndexSet};
use mergesim_core::{EventKind, EventKindSet};
use thiserror::Error;

use crate::processor::{Processor, StateSet};

// ── Dispatch routes ────────────────────────────────────────────────

/// Precomputed routing table mapping each [`EventKind`] to the indices of
/// the processors that react to it, in registration order.
///
/// Built once by [`validate_pipeline`]. The driver consults it instead of
/// asking every processor on every dispatch.
#[derive(Debug)]
#[must_use]
pub struct DispatchPlan {
    routes: IndexMap<EventKind, Vec<usize>>,
    processors: usize,
}

impl DispatchPlan {
    /// Number of processors in the plan.
    pub fn len(&self) -> usize {
        self.processors
    }

    /// Whether the plan covers zero processors.
    pub fn is_empty(&self) -> bool {
        self.processors == 0
    }

    /// Indices of the processors dispatched for `kind`.
    pub fn subscribers(&self, kind: EventKind) -> &[usize] {
        self.routes.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// Two processors that react to a common event kind and write a common
/// state domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateConflict {
    /// Name of the earlier processor in pipeline order.
    pub first: String,
    /// Name of the later processor in pipeline order.
    pub second: String,
    /// Event kinds both react to.
    pub kinds: EventKindSet,
    /// State domains both write.
    pub domains: StateSet,
}

fn describe_conflicts(conflicts: &[StateConflict]) -> String {
    conflicts
        .iter()
        .map(|c| {
            let domains: Vec<String> = c.domains.iter().map(|d| d.to_string()).collect();
            format!(
                "'{}' and '{}' both write {} on {:?}",
                c.first,
                c.second,
                domains.join("+"),
                c.kinds.iter().collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from pipeline validation (before a run, not per dispatch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// No processors registered.
    #[error("pipeline has no processors")]
    EmptyPipeline,

    /// Two processors share a name.
    #[error("processor name '{name}' is registered twice")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// A processor reacts to no event kind and would never run.
    #[error("processor '{processor}' reacts to no event kind")]
    Unsubscribed {
        /// Which processor.
        processor: String,
    },

    /// Two or more processor pairs react to the same event with
    /// overlapping writes.
    #[error("state conflicts: {}", describe_conflicts(.0))]
    StateConflict(Vec<StateConflict>),
}

// ── Validation ─────────────────────────────────────────────────────

/// Validate a processor pipeline and build the [`DispatchPlan`].
///
/// Checks performed:
///
/// 1. Pipeline is non-empty.
/// 2. Processor names are unique.
/// 3. Every processor reacts to at least one event kind.
/// 4. No two processors react to a common kind while writing a common
///    state domain (e.g. two integration policies registered together).
pub fn validate_pipeline(
    processors: &[Box<dyn Processor>],
) -> Result<DispatchPlan, PipelineError> {
    // 1. Non-empty
    if processors.is_empty() {
        return Err(PipelineError::EmptyPipeline);
    }

    // 2. Unique names
    let mut names: IndexSet<&str> = IndexSet::new();
    for p in processors {
        if !names.insert(p.name()) {
            return Err(PipelineError::DuplicateName {
                name: p.name().to_string(),
            });
        }
    }

    // 3. Subscriptions
    if let Some(p) = processors.iter().find(|p| p.reacts_to().is_empty()) {
        return Err(PipelineError::Unsubscribed {
            processor: p.name().to_string(),
        });
    }

    // 4. State conflicts
    let declared: Vec<(EventKindSet, StateSet)> = processors
        .iter()
        .map(|p| (p.reacts_to(), p.writes()))
        .collect();
    let mut conflicts = Vec::new();
    for (i, (reacts_i, writes_i)) in declared.iter().enumerate() {
        for (j, (reacts_j, writes_j)) in declared.iter().enumerate().skip(i + 1) {
            let kinds = reacts_i.intersection(reacts_j);
            let domains = writes_i.intersection(writes_j);
            if !kinds.is_empty() && !domains.is_empty() {
                conflicts.push(StateConflict {
                    first: processors[i].name().to_string(),
                    second: processors[j].name().to_string(),
                    kinds,
                    domains,
                });
            }
        }
    }
    if !conflicts.is_empty() {
        return Err(PipelineError::StateConflict(conflicts));
    }

    // 5. Build DispatchPlan
    let mut routes: IndexMap<EventKind, Vec<usize>> = IndexMap::new();
    for kind in EventKind::ALL {
        let subscribers: Vec<usize> = declared
            .iter()
            .enumerate()
            .filter(|(_, (reacts, _))| reacts.contains(kind))
            .map(|(i, _)| i)
            .collect();
        routes.insert(kind, subscribers);
    }

    Ok(DispatchPlan {
        routes,
        processors: processors.len(),
    })
}
