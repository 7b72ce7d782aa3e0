//! Sample producers
//!
//! Producers run on the sensor's own thread (camera callback, audio timer)
//! and push RAW samples into the parameter channels. Normalization happens
//! on the driver side when a sample is consumed.
//!
//! A producer never blocks and never fails loudly: an invalid detection is
//! logged, counted and dropped without writing to any channel.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use marionette_core::{MarionetteError, MarionetteResult};
use marionette_face::{EnvelopeMapper, LandmarkSet, Point2, RatioCalculator, RatioResult};

use crate::{ChannelProducer, PushOutcome};

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    invalid_count: AtomicU64,
    degenerate: AtomicU64,
    discarded: AtomicU64,
}

/// Producer statistics snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Inputs that produced samples
    pub accepted: u64,
    /// Landmark frames with the wrong number of points
    pub invalid_count: u64,
    /// Inputs with degenerate geometry
    pub degenerate: u64,
    /// Samples pushed after the session stopped
    pub discarded: u64,
}

/// Shared producer counters. Clones observe the same values.
#[derive(Clone, Debug, Default)]
pub struct ProducerCounters {
    inner: Arc<Counters>,
}

impl ProducerCounters {
    pub fn snapshot(&self) -> ProducerStats {
        ProducerStats {
            accepted: self.inner.accepted.load(Ordering::Relaxed),
            invalid_count: self.inner.invalid_count.load(Ordering::Relaxed),
            degenerate: self.inner.degenerate.load(Ordering::Relaxed),
            discarded: self.inner.discarded.load(Ordering::Relaxed),
        }
    }

    fn accepted(&self) {
        self.inner.accepted.fetch_add(1, Ordering::Relaxed);
    }

    fn rejected(&self, err: &MarionetteError) {
        if let MarionetteError::InvalidLandmarkCount { .. } = err {
            self.inner.invalid_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.degenerate.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record(&self, outcome: PushOutcome) {
        if outcome == PushOutcome::Closed {
            self.inner.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn push(channel: Option<&ChannelProducer>, value: f32, counters: &ProducerCounters) {
    if let Some(channel) = channel {
        counters.record(channel.push(value));
    }
}

/// Landmark producer: one detection in, up to three raw samples out
#[derive(Debug)]
pub struct LandmarkProducer {
    calculator: RatioCalculator,
    mouth: Option<ChannelProducer>,
    eye_left: ChannelProducer,
    eye_right: ChannelProducer,
    mirror: bool,
    counters: ProducerCounters,
}

impl LandmarkProducer {
    /// Producer feeding both eyes and the mouth
    pub fn new(
        calculator: RatioCalculator,
        mouth: ChannelProducer,
        eye_left: ChannelProducer,
        eye_right: ChannelProducer,
    ) -> Self {
        LandmarkProducer {
            calculator,
            mouth: Some(mouth),
            eye_left,
            eye_right,
            mirror: false,
            counters: ProducerCounters::default(),
        }
    }

    /// Producer feeding only the eyes; the mouth comes from another source
    pub fn eyes_only(
        calculator: RatioCalculator,
        eye_left: ChannelProducer,
        eye_right: ChannelProducer,
    ) -> Self {
        LandmarkProducer {
            calculator,
            mouth: None,
            eye_left,
            eye_right,
            mirror: false,
            counters: ProducerCounters::default(),
        }
    }

    /// Swap left and right eyes (selfie camera)
    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn drives_mouth(&self) -> bool {
        self.mouth.is_some()
    }

    pub fn counters(&self) -> ProducerCounters {
        self.counters.clone()
    }

    /// Handle one detection. Invalid input writes nothing.
    pub fn on_landmarks(&self, points: &[Point2]) -> MarionetteResult<RatioResult> {
        let result = LandmarkSet::from_slice(points).and_then(|set| self.calculator.compute(&set));
        self.publish(result)
    }

    /// Handle one detection already packed into a set
    pub fn on_landmark_set(&self, set: &LandmarkSet) -> MarionetteResult<RatioResult> {
        self.publish(self.calculator.compute(set))
    }

    fn publish(&self, result: MarionetteResult<RatioResult>) -> MarionetteResult<RatioResult> {
        let ratios = match result {
            Ok(ratios) => ratios,
            Err(err) if err.is_sample_error() => {
                self.counters.rejected(&err);
                tracing::debug!(error = %err, "landmark detection dropped");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(error = %err, "landmark calculation failed");
                return Err(err);
            }
        };
        let ratios = if self.mirror { ratios.mirrored() } else { ratios };

        push(self.mouth.as_ref(), ratios.mouth_openness, &self.counters);
        push(Some(&self.eye_left), ratios.left_eye_openness, &self.counters);
        push(Some(&self.eye_right), ratios.right_eye_openness, &self.counters);
        self.counters.accepted();

        tracing::trace!(
            mar = ratios.mouth_openness,
            ear_left = ratios.left_eye_openness,
            ear_right = ratios.right_eye_openness,
            "landmark sample"
        );
        Ok(ratios)
    }
}

/// Audio producer: one meter reading in, one raw mouth sample out
#[derive(Debug)]
pub struct AudioMeterProducer {
    mapper: EnvelopeMapper,
    mouth: ChannelProducer,
    counters: ProducerCounters,
}

impl AudioMeterProducer {
    pub fn new(mapper: EnvelopeMapper, mouth: ChannelProducer) -> Self {
        AudioMeterProducer {
            mapper,
            mouth,
            counters: ProducerCounters::default(),
        }
    }

    pub fn counters(&self) -> ProducerCounters {
        self.counters.clone()
    }

    /// Push the raw value for an average-power reading in dB
    pub fn on_meter(&self, db: f32) -> f32 {
        let raw = self.mapper.map(db);
        push(Some(&self.mouth), raw, &self.counters);
        self.counters.accepted();
        raw
    }
}

/// Source of average-power readings, polled at the metering interval
pub trait MeterSource: Send {
    /// Latest reading in dB, `None` when nothing is available
    fn average_power_db(&mut self) -> Option<f32>;
}

impl<F> MeterSource for F
where
    F: FnMut() -> Option<f32> + Send,
{
    fn average_power_db(&mut self) -> Option<f32> {
        self()
    }
}

/// Synthetic meter for demos: each reading maps to one of `0.1 ..= 0.9`
#[derive(Debug, Clone)]
pub struct RandomMeterSource {
    rng: StdRng,
    mapper: EnvelopeMapper,
}

impl RandomMeterSource {
    pub fn new(seed: u64) -> Self {
        RandomMeterSource {
            rng: StdRng::seed_from_u64(seed),
            mapper: EnvelopeMapper::new(),
        }
    }
}

impl MeterSource for RandomMeterSource {
    fn average_power_db(&mut self) -> Option<f32> {
        let level = self.rng.gen_range(1..=9u8) as f32 / 10.0;
        Some(self.mapper.db_for(level))
    }
}

/// Latest level set by an audio callback. Clones share the level.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    bits: Arc<AtomicU32>,
}

impl LevelMeter {
    /// Meter reading silence
    pub fn new() -> Self {
        LevelMeter {
            bits: Arc::new(AtomicU32::new(marionette_face::SILENCE_FLOOR_DB.to_bits())),
        }
    }

    pub fn set_db(&self, db: f32) {
        self.bits.store(db.to_bits(), Ordering::Relaxed);
    }

    pub fn db(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterSource for LevelMeter {
    fn average_power_db(&mut self) -> Option<f32> {
        Some(self.db())
    }
}
