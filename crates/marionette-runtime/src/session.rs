//! Session lifecycle
//!
//! A session wires the producers, channels and driver together:
//!
//! ```text
//! camera thread ──► LandmarkInput ──┐
//!                                   ├─► channels ──► AnimationDriver ──► sink
//! meter tick ──► AudioMeterProducer ┘                    ▲
//!                                                 render tick
//! ```
//!
//! `start` opens fresh channels and installs new producers. `stop` closes the
//! channels first, then removes the producers, so a sample still in flight
//! from the old session is discarded rather than replayed later.

use std::sync::Arc;

use parking_lot::Mutex;

use marionette_core::{MarionetteError, MarionetteResult, ParameterMap};
use marionette_face::{LandmarkLayout, LandmarkSet, Point2, RatioCalculator, RatioResult};
use marionette_time::{
    AnimationClock, IntervalScheduler, MonotonicClock, TickHandle, TickScheduler,
};

use crate::{
    AnimationDriver, AudioMeterProducer, DriverStats, LandmarkProducer, MeterSource, MouthSource,
    NullSink, ParameterSink, ProducerCounters, ProducerStats, SessionConfig,
};

type LandmarkSlot = Arc<Mutex<Option<LandmarkProducer>>>;

/// Builder for [`Session`]
pub struct SessionBuilder {
    config: SessionConfig,
    sink: Box<dyn ParameterSink>,
    clock: Option<Arc<dyn AnimationClock>>,
    meter_source: Option<Box<dyn MeterSource>>,
    meter_scheduler: Option<Box<dyn TickScheduler + Send>>,
    layout: LandmarkLayout,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        SessionBuilder {
            config,
            sink: Box::new(NullSink),
            clock: None,
            meter_source: None,
            meter_scheduler: None,
            layout: LandmarkLayout::IBUG_68,
        }
    }

    /// Renderer receiving one map per tick
    pub fn sink(mut self, sink: impl ParameterSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Animation clock (defaults to a monotonic wall clock)
    pub fn clock(mut self, clock: Arc<dyn AnimationClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Audio level source, required for audio-driven mouth
    pub fn meter_source(mut self, source: impl MeterSource + 'static) -> Self {
        self.meter_source = Some(Box::new(source));
        self
    }

    /// Scheduler polling the meter. Defaults to a tokio interval at the
    /// configured metering period.
    pub fn meter_scheduler(mut self, scheduler: impl TickScheduler + Send + 'static) -> Self {
        self.meter_scheduler = Some(Box::new(scheduler));
        self
    }

    pub fn layout(mut self, layout: LandmarkLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn build(self) -> MarionetteResult<Session> {
        self.config.validate()?;
        let calculator = RatioCalculator::with_layout(self.layout)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        let meter = match self.config.mouth_source {
            MouthSource::Landmarks => None,
            MouthSource::Audio => {
                let source = self.meter_source.ok_or_else(|| {
                    MarionetteError::InvalidConfig("audio mouth source needs a meter source".into())
                })?;
                let scheduler = match self.meter_scheduler {
                    Some(scheduler) => scheduler,
                    None => default_meter_scheduler(&self.config, Arc::clone(&clock))?,
                };
                Some(Meter {
                    source: Arc::new(Mutex::new(source)),
                    scheduler,
                    handle: None,
                })
            }
        };

        let driver = AnimationDriver::new(self.config.driver_config(), self.sink);

        Ok(Session {
            config: self.config,
            calculator,
            clock,
            driver: Arc::new(Mutex::new(driver)),
            landmarks: Arc::new(Mutex::new(None)),
            meter,
            landmark_counters: None,
            audio_counters: None,
        })
    }
}

fn default_meter_scheduler(
    config: &SessionConfig,
    clock: Arc<dyn AnimationClock>,
) -> MarionetteResult<Box<dyn TickScheduler + Send>> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
        MarionetteError::InvalidConfig(
            "audio metering needs a tokio runtime or an explicit meter scheduler".into(),
        )
    })?;
    Ok(Box::new(IntervalScheduler::with_runtime(
        config.meter_interval(),
        clock,
        runtime,
    )))
}

struct Meter {
    source: Arc<Mutex<Box<dyn MeterSource>>>,
    scheduler: Box<dyn TickScheduler + Send>,
    handle: Option<TickHandle>,
}

/// Combined statistics for the current (or last) session
#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    pub driver: DriverStats,
    pub landmarks: ProducerStats,
    pub audio: ProducerStats,
}

/// One avatar animation session
pub struct Session {
    config: SessionConfig,
    calculator: RatioCalculator,
    clock: Arc<dyn AnimationClock>,
    driver: Arc<Mutex<AnimationDriver>>,
    landmarks: LandmarkSlot,
    meter: Option<Meter>,
    landmark_counters: Option<ProducerCounters>,
    audio_counters: Option<ProducerCounters>,
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.driver.lock().is_running()
    }

    /// Begin a session: fresh channels, neutral parameters, breathing
    /// phase restarted
    pub fn start(&mut self) -> MarionetteResult<()> {
        let producers = self.driver.lock().start(self.clock.now())?;

        let landmark = match &mut self.meter {
            None => LandmarkProducer::new(
                self.calculator,
                producers.mouth_open,
                producers.eye_left,
                producers.eye_right,
            ),
            Some(meter) => {
                let audio = AudioMeterProducer::new(self.config.envelope_mapper(), producers.mouth_open);
                self.audio_counters = Some(audio.counters());

                let source = Arc::clone(&meter.source);
                meter.handle = Some(meter.scheduler.on_tick(Box::new(move |_| {
                    if let Some(db) = source.lock().average_power_db() {
                        audio.on_meter(db);
                    }
                })));

                LandmarkProducer::eyes_only(self.calculator, producers.eye_left, producers.eye_right)
            }
        }
        .mirrored(self.config.mirror_eyes);

        self.landmark_counters = Some(landmark.counters());
        *self.landmarks.lock() = Some(landmark);

        tracing::info!(mouth_source = ?self.config.mouth_source, "session started");
        Ok(())
    }

    /// End the session. Returns whether it was running.
    pub fn stop(&mut self) -> bool {
        if !self.driver.lock().stop() {
            return false;
        }
        if let Some(handle) = self.meter.as_mut().and_then(|m| m.handle.take()) {
            drop(handle);
        }
        self.landmarks.lock().take();

        tracing::info!("session stopped");
        true
    }

    /// Run one render tick now
    pub fn tick(&self) -> Option<ParameterMap> {
        self.driver.lock().tick(self.clock.now())
    }

    /// Register the render tick with a scheduler. Ticks read the session
    /// clock. Cancel or drop the handle to detach.
    pub fn drive_with(&self, scheduler: &mut dyn TickScheduler) -> TickHandle {
        let driver = Arc::clone(&self.driver);
        let clock = Arc::clone(&self.clock);
        scheduler.on_tick(Box::new(move |_| {
            driver.lock().tick(clock.now());
        }))
    }

    /// Handle for the landmark detector's callback thread
    pub fn landmark_input(&self) -> LandmarkInput {
        LandmarkInput {
            slot: Arc::clone(&self.landmarks),
        }
    }

    /// Last map assembled by the driver
    pub fn current(&self) -> ParameterMap {
        *self.driver.lock().current()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            driver: self.driver.lock().stats(),
            landmarks: self
                .landmark_counters
                .as_ref()
                .map(|c| c.snapshot())
                .unwrap_or_default(),
            audio: self
                .audio_counters
                .as_ref()
                .map(|c| c.snapshot())
                .unwrap_or_default(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Landmark entry point for the detector thread. Clones share the session.
#[derive(Clone)]
pub struct LandmarkInput {
    slot: LandmarkSlot,
}

impl LandmarkInput {
    /// Feed one detection. Fails with `NotRunning` between sessions.
    pub fn on_landmarks(&self, points: &[Point2]) -> MarionetteResult<RatioResult> {
        match self.slot.lock().as_ref() {
            Some(producer) => producer.on_landmarks(points),
            None => Err(MarionetteError::NotRunning),
        }
    }

    pub fn on_landmark_set(&self, set: &LandmarkSet) -> MarionetteResult<RatioResult> {
        match self.slot.lock().as_ref() {
            Some(producer) => producer.on_landmark_set(set),
            None => Err(MarionetteError::NotRunning),
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl std::fmt::Debug for LandmarkInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandmarkInput")
            .field("active", &self.is_active())
            .finish()
    }
}
