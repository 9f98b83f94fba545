//! The discrete-event driver: the single-threaded simulation loop.
//!
//! [`Simulation`] wires together the repository, the processor pipeline,
//! the event queue, and the uniform source. Each dispatch pops the
//! earliest event, records it in the [`History`], hands it to every
//! subscribed processor in registration order, and enqueues whatever they
//! return relative to the event's time.

use std::time::Duration;

use mergesim_core::{Event, ProcessorError, SimTime, UniformSource};
use mergesim_processor::{validate_pipeline, DispatchContext, DispatchPlan, Processor};
use mergesim_repo::Repository;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{ConfigError, SimConfig};
use crate::history::History;
use crate::queue::{EventQueue, Scheduled};
use crate::report::RunReport;
use crate::rng::SimRng;

// ── Outcomes and errors ────────────────────────────────────────────

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue emptied before the horizon: the pipeline stalled.
    Drained,
    /// The next event was at or past the horizon.
    HorizonReached,
}

impl RunOutcome {
    /// Whether the pipeline stalled.
    pub fn is_stalled(&self) -> bool {
        matches!(self, Self::Drained)
    }
}

/// A processor returned an error; the run is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The named processor failed while handling `event`.
    #[error("processor '{name}' failed at {time} handling {event}")]
    Processor {
        /// Which processor.
        name: String,
        /// Simulated time of the dispatch.
        time: SimTime,
        /// The event being dispatched.
        event: Event,
        /// The processor's error.
        #[source]
        source: ProcessorError,
    },
}

// ── Simulation ─────────────────────────────────────────────────────

/// One independent simulation run.
///
/// Owns all run state; two `Simulation`s share nothing and may run side by
/// side.
pub struct Simulation {
    config: SimConfig,
    repo: Repository,
    processors: Vec<Box<dyn Processor>>,
    plan: DispatchPlan,
    queue: EventQueue,
    history: History,
    source: Box<dyn UniformSource>,
    now: SimTime,
}

impl Simulation {
    /// Build a run from `config`: its processors, a [`SimRng`] seeded with
    /// `config.seed`, and its seed events.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let source = SimRng::new(config.seed);
        Self::with_source(config, source)
    }

    /// Like [`new`](Self::new) but drawing from `source` instead of a
    /// seeded generator.
    pub fn with_source(
        config: SimConfig,
        source: impl UniformSource + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let processors = config.processors();
        let seeds = config.seed_events();
        let mut sim = Self::from_parts(config, processors, source)?;
        for (event, time) in seeds {
            sim.schedule(event, time);
        }
        Ok(sim)
    }

    /// Build a run with an explicit processor list and no seed events.
    ///
    /// Only `config.horizon` and the report metadata are taken from
    /// `config`; the pipeline is validated on its own.
    pub fn from_parts(
        config: SimConfig,
        processors: Vec<Box<dyn Processor>>,
        source: impl UniformSource + 'static,
    ) -> Result<Self, ConfigError> {
        if config.horizon.is_zero() {
            return Err(ConfigError::ZeroHorizon);
        }
        let plan = validate_pipeline(&processors)?;
        Ok(Self {
            config,
            repo: Repository::new(),
            processors,
            plan,
            queue: EventQueue::new(),
            history: History::new(),
            source: Box::new(source),
            now: SimTime::ZERO,
        })
    }

    // ── Accessors ──────────────────────────────────────────────

    /// The run's configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current repository state.
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Mutable repository access, for seeding scenarios before a run.
    pub fn repo_mut(&mut self) -> &mut Repository {
        &mut self.repo
    }

    /// Every event dispatched so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Time of the last dispatched event.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The horizon as an absolute timestamp.
    pub fn horizon(&self) -> SimTime {
        self.config.horizon_time()
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Time of the next event, if any.
    pub fn next_time(&self) -> Option<SimTime> {
        self.queue.peek_time()
    }

    // ── Driving ────────────────────────────────────────────────

    /// Schedule `event` at absolute `time`.
    pub fn schedule(&mut self, event: Event, time: SimTime) {
        self.queue.push(event, time);
    }

    /// Schedule `event` `delay` after the current time.
    pub fn schedule_after(&mut self, event: Event, delay: Duration) {
        self.queue.push(event, self.now + delay);
    }

    /// Dispatch the next event if it falls before the horizon.
    ///
    /// Returns the dispatched event's time, or `None` if nothing was
    /// dispatched.
    pub fn step(&mut self) -> Result<Option<SimTime>, SimError> {
        self.step_before(self.horizon())
    }

    /// Dispatch every event strictly before `limit` (capped at the
    /// horizon). Returns the number of events dispatched.
    pub fn run_until(&mut self, limit: SimTime) -> Result<usize, SimError> {
        let limit = limit.min(self.horizon());
        let mut dispatched = 0;
        while self.step_before(limit)?.is_some() {
            dispatched += 1;
        }
        Ok(dispatched)
    }

    /// Run to completion: until the queue drains or the horizon is reached.
    pub fn run(&mut self) -> Result<RunOutcome, SimError> {
        let dispatched = self.run_until(self.horizon())?;
        let outcome = if self.queue.is_empty() {
            RunOutcome::Drained
        } else {
            RunOutcome::HorizonReached
        };
        info!(
            ?outcome,
            dispatched,
            merged = self.repo.merged_into_main(),
            now = %self.now,
            "run finished"
        );
        Ok(outcome)
    }

    /// Summarize the run so far.
    pub fn report(&self, outcome: RunOutcome) -> RunReport {
        RunReport::new(self, outcome)
    }

    fn step_before(&mut self, limit: SimTime) -> Result<Option<SimTime>, SimError> {
        match self.queue.peek_time() {
            Some(t) if t < limit => {}
            _ => return Ok(None),
        }
        let Some(scheduled) = self.queue.pop() else {
            return Ok(None);
        };
        let time = scheduled.time;
        self.dispatch(scheduled)?;
        Ok(Some(time))
    }

    fn dispatch(&mut self, scheduled: Scheduled) -> Result<(), SimError> {
        let Scheduled { time, event, .. } = scheduled;
        self.now = time;
        if event.is_build() {
            info!(%time, "{event}");
        } else {
            debug!(%time, "{event}");
        }
        self.history.record(time, event.clone());

        let mut ctx = DispatchContext::new(&mut self.repo, &mut *self.source, time);
        for &i in self.plan.subscribers(event.kind()) {
            let processor = &self.processors[i];
            let emitted = processor.handle(&event, &mut ctx).map_err(|source| {
                error!(processor = processor.name(), %time, %event, error = %source, "run aborted");
                SimError::Processor {
                    name: processor.name().to_string(),
                    time,
                    event: event.clone(),
                    source,
                }
            })?;
            for delayed in emitted {
                self.queue.push(delayed.event, time + delayed.delay);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergesim_core::EventKind;
    use mergesim_test_utils::{ConstSource, FailingProcessor, RecordingProcessor};

    fn recorder_sim(horizon: Duration) -> (Simulation, mergesim_test_utils::fixtures::Recording) {
        let recorder = RecordingProcessor::all("recorder");
        let log = recorder.log();
        let sim = Simulation::from_parts(
            SimConfig::default().with_horizon(horizon),
            vec![Box::new(recorder)],
            ConstSource(0.0),
        )
        .unwrap();
        (sim, log)
    }

    #[test]
    fn empty_queue_drains_immediately() {
        let (mut sim, log) = recorder_sim(Duration::from_secs(60));
        assert_eq!(sim.run().unwrap(), RunOutcome::Drained);
        assert!(log.lock().unwrap().is_empty());
        assert!(sim.history().is_empty());
    }

    #[test]
    fn events_dispatch_in_time_order_and_stop_at_horizon() {
        let (mut sim, log) = recorder_sim(Duration::from_secs(60));
        sim.schedule(Event::RetrySweepTick, SimTime(20_000));
        sim.schedule(Event::BranchGeneratorTick, SimTime(10_000));
        sim.schedule(Event::RetrySweepTick, SimTime(60_000));

        assert_eq!(sim.run().unwrap(), RunOutcome::HorizonReached);
        let seen: Vec<SimTime> = log.lock().unwrap().iter().map(|(t, _)| *t).collect();
        assert_eq!(seen, vec![SimTime(10_000), SimTime(20_000)]);
        assert_eq!(sim.pending(), 1);
        assert_eq!(sim.now(), SimTime(20_000));
    }

    #[test]
    fn run_until_is_exclusive() {
        let (mut sim, _log) = recorder_sim(Duration::from_secs(600));
        sim.schedule(Event::RetrySweepTick, SimTime(1_000));
        sim.schedule(Event::RetrySweepTick, SimTime(2_000));
        assert_eq!(sim.run_until(SimTime(2_000)).unwrap(), 1);
        assert_eq!(sim.next_time(), Some(SimTime(2_000)));
        assert_eq!(sim.step().unwrap(), Some(SimTime(2_000)));
        assert_eq!(sim.step().unwrap(), None);
    }

    #[test]
    fn emitted_events_are_scheduled_relative_to_dispatch() {
        let recorder = RecordingProcessor::new("ticker", [EventKind::BranchGeneratorTick])
            .with_follow_up(Event::BranchGeneratorTick, Duration::from_secs(10));
        let log = recorder.log();
        let mut sim = Simulation::from_parts(
            SimConfig::default().with_horizon(Duration::from_secs(35)),
            vec![Box::new(recorder)],
            ConstSource(0.0),
        )
        .unwrap();
        sim.schedule(Event::BranchGeneratorTick, SimTime(5_000));

        assert_eq!(sim.run().unwrap(), RunOutcome::HorizonReached);
        let seen: Vec<u64> = log.lock().unwrap().iter().map(|(t, _)| t.0).collect();
        assert_eq!(seen, vec![5_000, 15_000, 25_000]);
    }

    #[test]
    fn processor_error_aborts_with_name() {
        let failing = FailingProcessor::new("flaky", [EventKind::RetrySweepTick], 1);
        let mut sim = Simulation::from_parts(
            SimConfig::default(),
            vec![Box::new(failing)],
            ConstSource(0.0),
        )
        .unwrap();
        sim.schedule(Event::RetrySweepTick, SimTime(1));
        sim.schedule(Event::RetrySweepTick, SimTime(2));
        sim.schedule(Event::RetrySweepTick, SimTime(3));

        let err = sim.run().unwrap_err();
        match &err {
            SimError::Processor { name, time, .. } => {
                assert_eq!(name, "flaky");
                assert_eq!(*time, SimTime(2));
            }
        }
        assert!(err.to_string().starts_with("processor 'flaky' failed"));
        assert_eq!(sim.pending(), 1);
    }

    #[test]
    fn invalid_pipeline_is_a_config_error() {
        let result = Simulation::from_parts(SimConfig::default(), Vec::new(), ConstSource(0.0));
        assert!(matches!(result, Err(ConfigError::Pipeline(_))));
    }

    #[test]
    fn new_schedules_seed_events() {
        let sim = Simulation::new(SimConfig::default()).unwrap();
        assert_eq!(sim.pending(), 2);
        assert_eq!(sim.next_time(), Some(SimTime::ZERO));
    }
}
