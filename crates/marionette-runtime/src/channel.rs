//! Parameter channels
//!
//! Bounded single-producer/single-consumer FIFOs carrying raw samples from a
//! producer to the animation driver. Pushing never blocks: when a channel is
//! full the oldest pending sample is dropped and counted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use marionette_core::{MarionetteError, Parameter};

/// Default pending samples per channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushOutcome {
    /// Sample queued
    Queued,
    /// Sample queued, the oldest pending sample was dropped
    DroppedOldest(f32),
    /// Channel closed by a stop; sample discarded
    Closed,
}

struct ChannelInner {
    parameter: Parameter,
    capacity: usize,
    queue: Mutex<VecDeque<f32>>,
    closed: AtomicBool,
    pushed: AtomicU64,
    overflowed: AtomicU64,
}

/// Create a channel for `parameter` holding at most `capacity` samples
/// (at least one)
pub fn parameter_channel(parameter: Parameter, capacity: usize) -> (ChannelProducer, ParameterChannel) {
    let capacity = capacity.max(1);
    let inner = Arc::new(ChannelInner {
        parameter,
        capacity,
        queue: Mutex::new(VecDeque::with_capacity(capacity)),
        closed: AtomicBool::new(false),
        pushed: AtomicU64::new(0),
        overflowed: AtomicU64::new(0),
    });

    (
        ChannelProducer {
            inner: Arc::clone(&inner),
        },
        ParameterChannel { inner },
    )
}

/// Producer side of a channel. Not `Clone`: one producer per channel.
pub struct ChannelProducer {
    inner: Arc<ChannelInner>,
}

impl ChannelProducer {
    /// Queue a sample without blocking
    pub fn push(&self, value: f32) -> PushOutcome {
        let dropped = {
            let mut queue = self.inner.queue.lock();
            if self.inner.closed.load(Ordering::Acquire) {
                return PushOutcome::Closed;
            }
            let dropped = if queue.len() >= self.inner.capacity {
                queue.pop_front()
            } else {
                None
            };
            queue.push_back(value);
            dropped
        };
        self.inner.pushed.fetch_add(1, Ordering::Relaxed);

        match dropped {
            Some(old) => {
                let total = self.inner.overflowed.fetch_add(1, Ordering::Relaxed) + 1;
                if total == 1 {
                    tracing::debug!(parameter = %self.inner.parameter, "channel overflow, dropping oldest samples");
                } else {
                    tracing::trace!(parameter = %self.inner.parameter, total, "channel overflow");
                }
                PushOutcome::DroppedOldest(old)
            }
            None => PushOutcome::Queued,
        }
    }

    pub fn parameter(&self) -> Parameter {
        self.inner.parameter
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ChannelProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelProducer")
            .field("parameter", &self.inner.parameter)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Consumer side of a channel, owned by the animation driver
pub struct ParameterChannel {
    inner: Arc<ChannelInner>,
}

impl ParameterChannel {
    /// Take exactly one pending sample, oldest first
    pub fn try_pop(&self) -> Option<f32> {
        self.inner.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }

    /// Drop every pending sample
    pub fn clear(&self) {
        self.inner.queue.lock().clear();
    }

    /// Refuse further pushes and drop pending samples
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn parameter(&self) -> Parameter {
        self.inner.parameter
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Samples accepted so far
    pub fn pushed_count(&self) -> u64 {
        self.inner.pushed.load(Ordering::Relaxed)
    }

    /// Samples dropped by overflow so far
    pub fn overflow_count(&self) -> u64 {
        self.inner.overflowed.load(Ordering::Relaxed)
    }

    /// `ChannelOverflow` diagnostic, `None` if nothing was dropped
    pub fn overflow_error(&self) -> Option<MarionetteError> {
        match self.overflow_count() {
            0 => None,
            dropped => Some(MarionetteError::ChannelOverflow {
                parameter: self.parameter(),
                dropped,
            }),
        }
    }
}

impl std::fmt::Debug for ParameterChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterChannel")
            .field("parameter", &self.inner.parameter)
            .field("len", &self.len())
            .field("capacity", &self.inner.capacity)
            .field("overflowed", &self.overflow_count())
            .finish()
    }
}

/// Consumer sides of every sampled parameter's channel
#[derive(Debug)]
pub struct ChannelSet {
    channels: Vec<ParameterChannel>,
}

/// Producer sides handed out when a session starts
#[derive(Debug)]
pub struct ChannelProducers {
    pub mouth_open: ChannelProducer,
    pub eye_left: ChannelProducer,
    pub eye_right: ChannelProducer,
}

impl ChannelSet {
    /// Fresh, empty channels for every sampled parameter
    pub fn open(capacity: usize) -> (ChannelProducers, ChannelSet) {
        let (mouth_open, mouth_rx) = parameter_channel(Parameter::MouthOpenY, capacity);
        let (eye_left, eye_left_rx) = parameter_channel(Parameter::EyeLOpen, capacity);
        let (eye_right, eye_right_rx) = parameter_channel(Parameter::EyeROpen, capacity);

        (
            ChannelProducers {
                mouth_open,
                eye_left,
                eye_right,
            },
            ChannelSet {
                channels: vec![mouth_rx, eye_left_rx, eye_right_rx],
            },
        )
    }

    /// Channel for a sampled parameter
    pub fn get(&self, parameter: Parameter) -> Option<&ParameterChannel> {
        self.channels.iter().find(|c| c.parameter() == parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterChannel> {
        self.channels.iter()
    }

    pub fn clear(&self) {
        for channel in &self.channels {
            channel.clear();
        }
    }

    pub fn close(&self) {
        for channel in &self.channels {
            channel.close();
        }
    }

    /// Total samples dropped by overflow across all channels
    pub fn overflow_count(&self) -> u64 {
        self.channels.iter().map(|c| c.overflow_count()).sum()
    }

    /// One `ChannelOverflow` per channel that dropped samples
    pub fn overflow_errors(&self) -> Vec<MarionetteError> {
        self.channels.iter().filter_map(|c| c.overflow_error()).collect()
    }
}
