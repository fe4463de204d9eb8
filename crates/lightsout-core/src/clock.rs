//! Time sources for the race state machine.
//!
//! The state machine never reads the system clock directly. It is given a
//! [`Clock`] that supplies monotonic readings and a sleep primitive, so the
//! same code runs against real time in production and against a manually
//! driven clock in tests.
//!
//! # Implementations
//!
//! - [`TokioClock`] -- monotonic time from the tokio runtime. Honors
//!   tokio's paused test time, so sequences can be fast-forwarded.
//! - [`ManualClock`] -- time only moves when told to. `sleep` advances the
//!   clock by the requested duration and returns immediately.

use core::future::Future;
use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic time source with a delay primitive.
///
/// Readings are offsets from an arbitrary, fixed origin. Only differences
/// between readings are meaningful.
pub trait Clock: Send + Sync {
    /// Current reading. Never decreases.
    fn now(&self) -> Duration;

    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real monotonic time from the tokio runtime.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// A clock whose origin is the moment of creation.
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// A clock that only moves when advanced.
///
/// Clones share the same reading, so a test can keep a handle while the
/// state machine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `delta`, saturating at `u64::MAX` nanoseconds.
    pub fn advance(&self, delta: Duration) {
        let delta_nanos = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        // The closure always returns Some, so the update cannot fail.
        let _ = self
            .now_nanos
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(delta_nanos))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.now_nanos.load(Ordering::Acquire))
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        core::future::ready(())
    }
}
