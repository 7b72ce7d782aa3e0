//! Animation driver - the render-cadence tick
//!
//! Each tick:
//! 1. Compute BREATH from the time since start (never from channel state)
//! 2. MOUTH_OPEN_Y: take one pending sample, normalize; hold if none
//! 3. MOUTH_FORM: derive from the resulting MOUTH_OPEN_Y
//! 4. EYE_L_OPEN / EYE_R_OPEN: take one pending sample each; hold if none
//! 5. Deliver the complete map to the sink

use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use marionette_core::{
    mouth_form, AnimationTime, MarionetteError, MarionetteResult, Normalizer, Parameter,
    ParameterMap,
};

use crate::{ChannelProducers, ChannelSet, ParameterSink, DEFAULT_CHANNEL_CAPACITY};

/// Default breathing period
pub const DEFAULT_BREATH_PERIOD: Duration = Duration::from_secs(1);

/// Driver configuration
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Pending samples per channel
    pub channel_capacity: usize,
    /// One full breath cycle
    pub breath_period: Duration,
    /// Calibration for sampled parameters
    pub normalizer: Normalizer,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            breath_period: DEFAULT_BREATH_PERIOD,
            normalizer: Normalizer::default(),
        }
    }
}

/// Driver lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running,
}

#[derive(Clone, Debug, Default)]
pub struct DriverStats {
    /// Sessions started
    pub sessions: u64,
    /// Ticks while running
    pub ticks: u64,
    /// Maps handed to the sink
    pub maps_delivered: u64,
    /// Samples consumed, per parameter
    pub consumed: [u64; Parameter::COUNT],
    /// Ticks that held the previous value, per parameter
    pub held: [u64; Parameter::COUNT],
    /// Samples dropped by channel overflow in the current session
    pub overflowed: u64,
    pub last_tick_duration: Duration,
}

impl DriverStats {
    pub fn consumed(&self, parameter: Parameter) -> u64 {
        self.consumed[parameter.index()]
    }

    pub fn held(&self, parameter: Parameter) -> u64 {
        self.held[parameter.index()]
    }
}

/// BREATH value `t` into a cycle of `period`
pub fn breath(elapsed: Duration, period: Duration) -> f32 {
    let period = period.as_secs_f64();
    if period <= 0.0 {
        return Parameter::Breath.neutral();
    }
    let phase = TAU * elapsed.as_secs_f64() / period;
    (0.5 + 0.5 * phase.sin()) as f32
}

/// Assembles one parameter map per render tick
pub struct AnimationDriver {
    config: DriverConfig,
    state: DriverState,
    started_at: AnimationTime,
    channels: Option<ChannelSet>,
    current: ParameterMap,
    sink: Box<dyn ParameterSink>,
    stats: DriverStats,
}

impl AnimationDriver {
    /// Create a stopped driver delivering into `sink`
    pub fn new(config: DriverConfig, sink: Box<dyn ParameterSink>) -> Self {
        AnimationDriver {
            config,
            state: DriverState::Stopped,
            started_at: AnimationTime::ZERO,
            channels: None,
            current: ParameterMap::neutral(),
            sink,
            stats: DriverStats::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Last assembled map (neutral before the first tick of a session)
    pub fn current(&self) -> &ParameterMap {
        &self.current
    }

    pub fn stats(&self) -> DriverStats {
        let mut stats = self.stats.clone();
        stats.overflowed = self
            .channels
            .as_ref()
            .map(|c| c.overflow_count())
            .unwrap_or(0);
        stats
    }

    /// `ChannelOverflow` diagnostics for the running session
    pub fn overflow_errors(&self) -> Vec<MarionetteError> {
        self.channels
            .as_ref()
            .map(|c| c.overflow_errors())
            .unwrap_or_default()
    }

    /// Pending samples for a sampled parameter
    pub fn pending(&self, parameter: Parameter) -> usize {
        self.channels
            .as_ref()
            .and_then(|c| c.get(parameter))
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// Stopped → Running. Opens fresh channels, resets the time reference and
    /// every held value, and returns the producer sides.
    pub fn start(&mut self, now: AnimationTime) -> MarionetteResult<ChannelProducers> {
        if self.state == DriverState::Running {
            return Err(MarionetteError::AlreadyRunning);
        }

        let (producers, channels) = ChannelSet::open(self.config.channel_capacity);
        self.channels = Some(channels);
        self.started_at = now;
        self.current = ParameterMap::neutral();
        self.state = DriverState::Running;
        self.stats.sessions += 1;

        tracing::debug!(?now, capacity = self.config.channel_capacity, "animation driver started");
        Ok(producers)
    }

    /// Running → Stopped. Closes every channel; returns whether the driver
    /// was running.
    pub fn stop(&mut self) -> bool {
        if self.state == DriverState::Stopped {
            return false;
        }

        if let Some(channels) = self.channels.take() {
            channels.close();
            for err in channels.overflow_errors() {
                tracing::debug!(error = %err, "channel overflow during session");
            }
        }
        self.state = DriverState::Stopped;
        self.current = ParameterMap::neutral();

        tracing::debug!(ticks = self.stats.ticks, "animation driver stopped");
        true
    }

    /// Run one tick. Returns the delivered map, or `None` when stopped.
    pub fn tick(&mut self, now: AnimationTime) -> Option<ParameterMap> {
        if self.state != DriverState::Running {
            return None;
        }
        let start = Instant::now();
        self.stats.ticks += 1;

        // Stage 1: time-based breathing
        let elapsed = now.since(self.started_at);
        self.current
            .set(Parameter::Breath, breath(elapsed, self.config.breath_period));

        // Stage 2: mouth openness
        self.advance(Parameter::MouthOpenY);

        // Stage 3: mouth form follows this tick's openness
        let open_y = self.current.get(Parameter::MouthOpenY);
        self.current.set(Parameter::MouthForm, mouth_form(open_y));

        // Stage 4: eyes
        self.advance(Parameter::EyeLOpen);
        self.advance(Parameter::EyeROpen);

        // Stage 5: deliver
        let map = self.current;
        self.sink.deliver(&map);
        self.stats.maps_delivered += 1;
        self.stats.last_tick_duration = start.elapsed();

        Some(map)
    }

    /// Take at most one sample for `parameter`; hold the previous value if
    /// the channel is empty
    fn advance(&mut self, parameter: Parameter) {
        let sample = self
            .channels
            .as_ref()
            .and_then(|c| c.get(parameter))
            .and_then(|c| c.try_pop());

        match sample {
            Some(raw) => {
                let value = self.config.normalizer.normalize(parameter, raw);
                self.current.set(parameter, value);
                self.stats.consumed[parameter.index()] += 1;
            }
            None => {
                self.stats.held[parameter.index()] += 1;
            }
        }
    }
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("state", &self.state)
            .field("started_at", &self.started_at)
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingSink;
    use marionette_core::CalibrationRange;
    use marionette_face::EnvelopeMapper;

    fn driver() -> (AnimationDriver, RecordingSink) {
        let sink = RecordingSink::new();
        let driver = AnimationDriver::new(DriverConfig::default(), Box::new(sink.clone()));
        (driver, sink)
    }

    fn ms(v: u64) -> AnimationTime {
        AnimationTime::from_millis(v)
    }

    #[test]
    fn test_stopped_driver_delivers_nothing() {
        let (mut driver, sink) = driver();
        assert_eq!(driver.tick(ms(16)), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_first_tick_neutral() {
        let (mut driver, _) = driver();
        driver.start(ms(0)).unwrap();

        let map = driver.tick(ms(0)).unwrap();
        assert_eq!(map, ParameterMap::neutral());
        assert_eq!(map[Parameter::Breath], 0.5);
    }

    #[test]
    fn test_breath_cycle() {
        let period = Duration::from_secs(1);
        assert!((breath(Duration::ZERO, period) - 0.5).abs() < 1e-6);
        assert!((breath(Duration::from_millis(250), period) - 1.0).abs() < 1e-6);
        assert!((breath(Duration::from_millis(750), period) - 0.0).abs() < 1e-6);
        assert!((breath(Duration::from_millis(1000), period) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_breath_relative_to_start() {
        let (mut driver, _) = driver();
        driver.start(ms(10_000)).unwrap();
        let map = driver.tick(ms(10_250)).unwrap();
        assert!((map[Parameter::Breath] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_sample_per_tick() {
        let (mut driver, _) = driver();
        let producers = driver.start(ms(0)).unwrap();
        producers.mouth_open.push(0.2);
        producers.mouth_open.push(0.4);
        producers.mouth_open.push(0.6);

        let map = driver.tick(ms(16)).unwrap();
        assert!((map[Parameter::MouthOpenY] - 0.2).abs() < 1e-6);
        assert_eq!(driver.pending(Parameter::MouthOpenY), 2);

        let map = driver.tick(ms(33)).unwrap();
        assert!((map[Parameter::MouthOpenY] - 0.4).abs() < 1e-6);
        assert_eq!(driver.pending(Parameter::MouthOpenY), 1);
    }

    #[test]
    fn test_holds_previous_value() {
        let (mut driver, sink) = driver();
        let producers = driver.start(ms(0)).unwrap();
        // EAR 0.30 => 0.5 with the default eye range
        producers.eye_left.push(0.30);
        producers.mouth_open.push(0.8);

        let first = driver.tick(ms(16)).unwrap();
        let second = driver.tick(ms(33)).unwrap();

        assert!((first[Parameter::EyeLOpen] - 0.5).abs() < 1e-5);
        for p in [Parameter::MouthOpenY, Parameter::MouthForm, Parameter::EyeLOpen, Parameter::EyeROpen] {
            assert_eq!(second[p], first[p]);
        }
        assert_eq!(sink.len(), 2);
        assert_eq!(driver.stats().held(Parameter::EyeLOpen), 1);
        assert_eq!(driver.stats().consumed(Parameter::EyeLOpen), 1);
    }

    #[test]
    fn test_mouth_form_follows_open() {
        let (mut driver, _) = driver();
        let producers = driver.start(ms(0)).unwrap();
        producers.mouth_open.push(0.75);

        let map = driver.tick(ms(16)).unwrap();
        assert!((map[Parameter::MouthForm] - (1.0 - 2.0 * 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_zero_mar_scenario() {
        let (mut driver, _) = driver();
        let producers = driver.start(ms(0)).unwrap();
        producers.mouth_open.push(0.0);

        let map = driver.tick(ms(16)).unwrap();
        assert_eq!(map[Parameter::MouthOpenY], 0.0);
        assert_eq!(map[Parameter::MouthForm], 1.0);
    }

    #[test]
    fn test_silent_meter_reading_reaches_map() {
        let (mut driver, _) = driver();
        let producers = driver.start(ms(0)).unwrap();
        let meter = crate::AudioMeterProducer::new(EnvelopeMapper::default(), producers.mouth_open);

        let raw = meter.on_meter(-160.0);
        assert!((raw - 1e-4).abs() < 1e-7);

        let map = driver.tick(ms(16)).unwrap();
        assert!((map[Parameter::MouthOpenY] - 1e-4).abs() < 1e-6);
        assert!((map[Parameter::MouthForm] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_range_samples_clamped() {
        let (mut driver, _) = driver();
        let producers = driver.start(ms(0)).unwrap();
        producers.eye_right.push(5.0);
        producers.mouth_open.push(-2.0);

        let map = driver.tick(ms(16)).unwrap();
        assert_eq!(map[Parameter::EyeROpen], 1.0);
        assert_eq!(map[Parameter::MouthOpenY], 0.0);
        assert!(map.in_range());
    }

    #[test]
    fn test_custom_mouth_range() {
        let normalizer = Normalizer::new(
            CalibrationRange::new(0.1, 0.5).unwrap(),
            CalibrationRange::eye(),
        );
        let config = DriverConfig {
            normalizer,
            ..Default::default()
        };
        let mut driver = AnimationDriver::new(config, Box::new(crate::NullSink));
        let producers = driver.start(ms(0)).unwrap();
        producers.mouth_open.push(0.3);

        let map = driver.tick(ms(16)).unwrap();
        assert!((map[Parameter::MouthOpenY] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_restart_clears_previous_session() {
        let (mut driver, _) = driver();
        let old = driver.start(ms(0)).unwrap();
        old.mouth_open.push(0.9);
        old.eye_left.push(0.45);
        driver.tick(ms(16)).unwrap();
        old.mouth_open.push(0.7);

        assert!(driver.stop());
        // stale producer after stop
        old.eye_right.push(0.45);

        let _fresh = driver.start(ms(5_000)).unwrap();
        let map = driver.tick(ms(5_000)).unwrap();
        assert_eq!(map, ParameterMap::neutral());
        assert_eq!(driver.pending(Parameter::MouthOpenY), 0);
    }

    #[test]
    fn test_start_twice_rejected() {
        let (mut driver, _) = driver();
        driver.start(ms(0)).unwrap();
        assert!(matches!(
            driver.start(ms(1)),
            Err(MarionetteError::AlreadyRunning)
        ));
        assert!(driver.stop());
        assert!(!driver.stop());
    }

    #[test]
    fn test_every_map_complete_and_bounded() {
        let (mut driver, sink) = driver();
        let producers = driver.start(ms(0)).unwrap();

        for i in 0..120u64 {
            if i % 3 == 0 {
                producers.mouth_open.push((i as f32 * 0.37).sin() * 2.0);
            }
            if i % 5 == 0 {
                producers.eye_left.push(0.1 + (i as f32) * 0.01);
            }
            driver.tick(ms(i * 16));
        }

        let maps = sink.maps();
        assert_eq!(maps.len(), 120);
        for map in maps {
            assert_eq!(map.iter().count(), Parameter::COUNT);
            assert!(map.in_range());
        }
    }

    #[test]
    fn test_overflow_reported_in_stats() {
        let config = DriverConfig {
            channel_capacity: 2,
            ..Default::default()
        };
        let mut driver = AnimationDriver::new(config, Box::new(crate::NullSink));
        let producers = driver.start(ms(0)).unwrap();
        for v in [0.1, 0.2, 0.3, 0.4] {
            producers.mouth_open.push(v);
        }

        assert_eq!(driver.stats().overflowed, 2);
        assert_eq!(
            driver.overflow_errors(),
            vec![MarionetteError::ChannelOverflow {
                parameter: Parameter::MouthOpenY,
                dropped: 2,
            }]
        );
        let map = driver.tick(ms(16)).unwrap();
        assert!((map[Parameter::MouthOpenY] - 0.3).abs() < 1e-6);
    }
}
