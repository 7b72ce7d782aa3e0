//! Clock implementations for animation timing

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use marionette_core::{duration_micros, AnimationTime};

/// Source of animation time
/// INVARIANT: `now()` MUST be monotonically non-decreasing
pub trait AnimationClock: Send + Sync {
    fn now(&self) -> AnimationTime;
}

/// Wall clock backed by the monotonic OS clock
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    reference: Instant,
}

impl MonotonicClock {
    /// Clock reading zero now
    pub fn new() -> Self {
        MonotonicClock {
            reference: Instant::now(),
        }
    }

    /// Time since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.reference.elapsed()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock for MonotonicClock {
    fn now(&self) -> AnimationTime {
        AnimationTime::ZERO + self.elapsed()
    }
}

/// Manually advanced clock for headless runs and tests.
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, dt: Duration) -> AnimationTime {
        let dt = duration_micros(dt);
        let prev = self
            .micros
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| Some(t.saturating_add(dt)))
            .unwrap_or_else(|t| t);
        AnimationTime::from_micros(prev.saturating_add(dt))
    }

    /// Jump to a time. Only moves forward.
    pub fn set(&self, t: AnimationTime) {
        self.micros.fetch_max(t.as_micros(), Ordering::AcqRel);
    }
}

impl AnimationClock for ManualClock {
    fn now(&self) -> AnimationTime {
        AnimationTime::from_micros(self.micros.load(Ordering::Acquire))
    }
}

impl<C: AnimationClock + ?Sized> AnimationClock for Arc<C> {
    fn now(&self) -> AnimationTime {
        (**self).now()
    }
}
