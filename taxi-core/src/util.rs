//! Utilities shared by sessions and runners.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Derives an independent seed for stream `index` from a root seed.
///
/// Used to give every session, and every evaluator inside a session, its own
/// random stream while keeping a whole run reproducible from one number.
pub fn derive_seed(root: u64, index: u64) -> u64 {
    xxh3_64_with_seed(&index.to_le_bytes(), root)
}

/// Running mean and standard deviation of a stream of values.
///
/// Uses Welford's update so that values never need to be kept around.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureDistribution {
    count: usize,
    mean: f64,
    m2: f64,
}

impl MeasureDistribution {
    /// Creates an empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of values seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the values seen, `0` when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation, `0` with fewer than two values.
    pub fn stddev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    /// Returns `(mean, stddev)`.
    pub fn get_distribution(&self) -> (f64, f64) {
        (self.mean(), self.stddev())
    }
}

impl std::iter::FromIterator<f64> for MeasureDistribution {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut dist = Self::new();
        for v in iter {
            dist.add(v);
        }
        dist
    }
}

/// Cooperative cancellation flag shared between a runner and its trials.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Creates a flag that is not raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once the flag has been raised.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
