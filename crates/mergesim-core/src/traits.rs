//! The injected randomness seam.

/// A source of uniformly distributed doubles.
///
/// All stochastic decisions in a run (build outcomes and durations) draw
/// from a single shared source, so a seeded implementation makes the whole
/// run reproducible. Implemented by the engine's seeded ChaCha generator
/// and by scripted sources in tests.
pub trait UniformSource {
    /// Next sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<T: UniformSource + ?Sized> UniformSource for Box<T> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}
