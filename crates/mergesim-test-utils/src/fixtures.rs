//! Reusable processor fixtures.
//!
//! Two standard processors for pipeline and driver testing:
//!
//! - [`RecordingProcessor`]: logs every event it is dispatched, with the
//!   dispatch time, and optionally re-emits a fixed follow-up.
//! - [`FailingProcessor`]: fails deterministically after N calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mergesim_core::{Event, EventKind, EventKindSet, ProcessorError, SimTime};
use mergesim_processor::{Delayed, DispatchContext, Processor, StateSet};

/// Shared log of `(time, event)` pairs seen by a [`RecordingProcessor`].
pub type Recording = Arc<Mutex<Vec<(SimTime, Event)>>>;

/// Records every dispatched event. Writes no repository state.
///
/// Keep a clone of [`log`](RecordingProcessor::log) before handing the
/// processor to a simulation to inspect what it saw.
pub struct RecordingProcessor {
    pub name: String,
    pub kinds: EventKindSet,
    pub follow_up: Option<Delayed>,
    log: Recording,
}

impl RecordingProcessor {
    /// Record events of the given kinds.
    pub fn new(name: impl Into<String>, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            name: name.into(),
            kinds: kinds.into_iter().collect(),
            follow_up: None,
            log: Arc::default(),
        }
    }

    /// Record every event kind.
    pub fn all(name: impl Into<String>) -> Self {
        Self::new(name, EventKind::ALL)
    }

    /// Emit `event` after `delay` on every dispatch.
    pub fn with_follow_up(mut self, event: Event, delay: Duration) -> Self {
        self.follow_up = Some(Delayed::after(event, delay));
        self
    }

    /// Handle to the shared log.
    pub fn log(&self) -> Recording {
        Arc::clone(&self.log)
    }
}

impl Processor for RecordingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn reacts_to(&self) -> EventKindSet {
        self.kinds
    }

    fn writes(&self) -> StateSet {
        StateSet::empty()
    }

    fn handle(
        &self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| ProcessorError::ExecutionFailed {
                reason: "recording lock poisoned".to_string(),
            })?;
        log.push((ctx.now(), event.clone()));
        Ok(self.follow_up.iter().cloned().collect())
    }
}

/// Fails deterministically after a configurable number of successful calls.
///
/// Useful for testing error propagation in the driver. Uses `AtomicUsize`
/// for the call counter so it satisfies `Send`.
pub struct FailingProcessor {
    pub name: String,
    pub kinds: EventKindSet,
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingProcessor {
    /// Create a processor that succeeds `succeed_count` times then fails.
    pub fn new(
        name: impl Into<String>,
        kinds: impl IntoIterator<Item = EventKind>,
        succeed_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kinds: kinds.into_iter().collect(),
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `handle()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Processor for FailingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn reacts_to(&self) -> EventKindSet {
        self.kinds
    }

    fn writes(&self) -> StateSet {
        StateSet::empty()
    }

    fn handle(
        &self,
        _event: &Event,
        _ctx: &mut DispatchContext<'_>,
    ) -> Result<Vec<Delayed>, ProcessorError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(ProcessorError::ExecutionFailed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(Vec::new())
    }
}
