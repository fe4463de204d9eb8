//! Random delay sources.
//!
//! The light sequence draws every delay from an injected [`RandomSource`]
//! so a race is reproducible under test. [`SeededRandom`] wraps a seedable
//! PRNG; [`FixedRandom`] always returns the same point within each range.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of bounded uniform random values.
pub trait RandomSource: Send {
    /// A value uniformly distributed in `[min, max)`.
    ///
    /// Returns `min` when the range is empty (`min >= max`) or not finite.
    fn uniform(&mut self, min: f64, max: f64) -> f64;
}

/// PRNG-backed random source.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// A deterministic source: the same seed yields the same delays.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A source seeded from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return min;
        }
        self.rng.random_range(min..max)
    }
}

/// A stub that returns the point `fraction` of the way through each range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom {
    fraction: f64,
}

impl FixedRandom {
    /// Always return `min + (max - min) * fraction`.
    ///
    /// `fraction` is clamped to `[0, 1)`; values at or above 1 return the
    /// start of the range so the result stays inside `[min, max)`.
    pub fn new(fraction: f64) -> Self {
        let fraction = if (0.0..1.0).contains(&fraction) {
            fraction
        } else {
            0.0
        };
        Self { fraction }
    }

    /// Always return the lower bound.
    pub fn minimum() -> Self {
        Self::new(0.0)
    }

    /// Always return the midpoint.
    pub fn midpoint() -> Self {
        Self::new(0.5)
    }
}

impl RandomSource for FixedRandom {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return min;
        }
        (max - min).mul_add(self.fraction, min)
    }
}
