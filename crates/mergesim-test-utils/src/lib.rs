//! Test utilities and fixture types for mergesim development.
//!
//! Provides scripted implementations of [`UniformSource`] so tests can
//! force build outcomes and durations, plus fixture processors in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::VecDeque;

use mergesim_core::UniformSource;

pub use fixtures::{FailingProcessor, RecordingProcessor};

/// Returns the same value on every draw.
///
/// `ConstSource(0.0)` makes every build succeed in its minimum duration;
/// `ConstSource(0.7)` fails every normal build and passes every retry.
#[derive(Clone, Copy, Debug)]
pub struct ConstSource(pub f64);

impl UniformSource for ConstSource {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Returns scripted values in order, then a fallback once exhausted.
///
/// Each build consumes two draws: the outcome, then the duration.
#[derive(Clone, Debug)]
pub struct SequenceSource {
    values: VecDeque<f64>,
    fallback: f64,
    drawn: usize,
}

impl SequenceSource {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            fallback: 0.0,
            drawn: 0,
        }
    }

    /// Value returned after the script runs out. Default: `0.0`.
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Script one build per `(passes, duration_fraction)` pair.
    pub fn builds(builds: impl IntoIterator<Item = (bool, f64)>) -> Self {
        Self::new(
            builds
                .into_iter()
                .flat_map(|(passes, d)| [if passes { 0.0 } else { 0.999 }, d]),
        )
    }

    /// Total number of draws taken so far.
    pub fn drawn(&self) -> usize {
        self.drawn
    }

    /// Scripted values not yet drawn.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        self.drawn += 1;
        self.values.pop_front().unwrap_or(self.fallback)
    }
}
