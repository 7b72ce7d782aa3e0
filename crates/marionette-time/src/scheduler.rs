//! Tick scheduling
//!
//! Periodic work (render ticks, audio metering) registers a callback through
//! [`TickScheduler::on_tick`] instead of binding to a UI timer. The returned
//! [`TickHandle`] cancels the registration when cancelled or dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use marionette_core::AnimationTime;

use crate::AnimationClock;

/// Callback invoked once per tick with the current animation time
pub type TickCallback = Box<dyn FnMut(AnimationTime) + Send + 'static>;

/// Registration point for periodic callbacks
pub trait TickScheduler {
    /// Register a callback; it runs until the handle is cancelled or dropped
    fn on_tick(&mut self, callback: TickCallback) -> TickHandle;
}

/// Cancels a tick registration. Dropping the handle cancels it too.
#[derive(Debug)]
pub struct TickHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    fn new(cancelled: Arc<AtomicBool>, task: Option<JoinHandle<()>>) -> Self {
        TickHandle { cancelled, task }
    }

    /// Stop further callbacks. A callback already running finishes.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Fires callbacks on a fixed period using a tokio interval.
///
/// Missed ticks are skipped, never replayed in a burst.
pub struct IntervalScheduler {
    period: Duration,
    clock: Arc<dyn AnimationClock>,
    runtime: Handle,
}

impl IntervalScheduler {
    /// Scheduler on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(period: Duration, clock: Arc<dyn AnimationClock>) -> Self {
        Self::with_runtime(period, clock, Handle::current())
    }

    pub fn with_runtime(period: Duration, clock: Arc<dyn AnimationClock>, runtime: Handle) -> Self {
        IntervalScheduler {
            period: period.max(Duration::from_millis(1)),
            clock,
            runtime,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl TickScheduler for IntervalScheduler {
    fn on_tick(&mut self, mut callback: TickCallback) -> TickHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let clock = Arc::clone(&self.clock);
        let period = self.period;

        let task = self.runtime.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                callback(clock.now());
            }
            tracing::trace!(?period, "interval scheduler task finished");
        });

        TickHandle::new(cancelled, Some(task))
    }
}

struct ManualEntry {
    cancelled: Arc<AtomicBool>,
    callback: TickCallback,
}

/// Scheduler fired explicitly, for headless runs and tests.
/// Clones share the same registrations.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    entries: Arc<Mutex<Vec<ManualEntry>>>,
    fired: Arc<AtomicU64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every live callback once
    pub fn fire(&self, now: AnimationTime) {
        let mut entries = self.entries.lock();
        entries.retain(|e| !e.cancelled.load(Ordering::Acquire));
        for entry in entries.iter_mut() {
            (entry.callback)(now);
        }
        self.fired.fetch_add(1, Ordering::Relaxed);
    }

    /// Live registrations
    pub fn registered(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| !e.cancelled.load(Ordering::Acquire))
            .count()
    }

    /// Number of `fire` calls so far
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

impl TickScheduler for ManualScheduler {
    fn on_tick(&mut self, callback: TickCallback) -> TickHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.entries.lock().push(ManualEntry {
            cancelled: Arc::clone(&cancelled),
            callback,
        });
        TickHandle::new(cancelled, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, MonotonicClock};

    #[test]
    fn test_manual_scheduler_fires_registered() {
        let mut scheduler = ManualScheduler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _handle = scheduler.on_tick(Box::new(move |t| sink.lock().push(t)));

        scheduler.fire(AnimationTime::from_millis(16));
        scheduler.fire(AnimationTime::from_millis(33));

        assert_eq!(
            *seen.lock(),
            vec![AnimationTime::from_millis(16), AnimationTime::from_millis(33)]
        );
        assert_eq!(scheduler.fired(), 2);
    }

    #[test]
    fn test_manual_scheduler_cancel() {
        let mut scheduler = ManualScheduler::new();
        let count = Arc::new(AtomicU64::new(0));

        let c = Arc::clone(&count);
        let mut handle = scheduler.on_tick(Box::new(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        }));

        scheduler.fire(AnimationTime::ZERO);
        handle.cancel();
        scheduler.fire(AnimationTime::ZERO);

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(scheduler.registered(), 0);
    }

    #[test]
    fn test_dropped_handle_cancels() {
        let mut scheduler = ManualScheduler::new();
        let count = Arc::new(AtomicU64::new(0));

        let c = Arc::clone(&count);
        drop(scheduler.on_tick(Box::new(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        })));

        scheduler.fire(AnimationTime::ZERO);
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_manual_scheduler_uses_clock_time() {
        let clock = ManualClock::new();
        let mut scheduler = ManualScheduler::new();
        let last = Arc::new(Mutex::new(AnimationTime::ZERO));

        let l = Arc::clone(&last);
        let _h = scheduler.on_tick(Box::new(move |t| *l.lock() = t));

        scheduler.fire(clock.advance(Duration::from_millis(100)));
        assert_eq!(*last.lock(), AnimationTime::from_millis(100));
    }

    #[tokio::test]
    async fn test_interval_scheduler_ticks_and_stops() {
        let clock: Arc<dyn AnimationClock> = Arc::new(MonotonicClock::new());
        let mut scheduler = IntervalScheduler::new(Duration::from_millis(5), clock);
        let count = Arc::new(AtomicU64::new(0));

        let c = Arc::clone(&count);
        let mut handle = scheduler.on_tick(Box::new(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        }));

        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.cancel();
        let after_cancel = count.load(Ordering::Relaxed);
        assert!(after_cancel >= 2);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::Relaxed), after_cancel);
        assert!(handle.is_cancelled());
    }
}
