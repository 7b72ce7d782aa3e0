//! Pipeline simulator - full session runs on a virtual clock
//!
//! Drives a real [`Session`] with a manual clock: the render loop fires at a
//! fixed rate, the camera feed delivers frames on its own cadence, and the
//! audio meter (when enabled) polls a seeded random source. Every delivered
//! parameter map is recorded and checked.

use std::sync::Arc;
use std::time::Duration;

use marionette_core::{MarionetteResult, Parameter, ParameterMap};
use marionette_runtime::{
    RandomMeterSource, RecordingSink, Session, SessionConfig, SessionStats,
};
use marionette_time::{AnimationClock, ManualClock, ManualScheduler, TickHandle};

use crate::camera::{CameraConfig, CameraFeed, CameraStats};
use crate::face_script::FaceScript;

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub session: SessionConfig,
    pub camera: CameraConfig,
    pub script: FaceScript,
    /// Render tick period
    pub frame_period: Duration,
    pub duration: Duration,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            session: SessionConfig::landmark_driven(),
            camera: CameraConfig::default(),
            script: FaceScript::default(),
            frame_period: Duration::from_micros(16_667),
            duration: Duration::from_secs(5),
            seed: 0x4d41_5249,
        }
    }
}

/// Outcome of one run
#[derive(Clone, Debug)]
pub struct SimulationReport {
    pub maps: Vec<ParameterMap>,
    pub session: SessionStats,
    pub camera: CameraStats,
    /// Maps with a missing or out-of-range parameter
    pub violations: usize,
}

impl SimulationReport {
    pub fn ticks(&self) -> usize {
        self.maps.len()
    }

    /// Ticks whose value for `parameter` differs from the previous tick
    pub fn changes(&self, parameter: Parameter) -> usize {
        self.maps
            .windows(2)
            .filter(|w| w[0][parameter] != w[1][parameter])
            .count()
    }

    pub fn min(&self, parameter: Parameter) -> f32 {
        self.maps
            .iter()
            .map(|m| m[parameter])
            .fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self, parameter: Parameter) -> f32 {
        self.maps
            .iter()
            .map(|m| m[parameter])
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Count maps that break the per-tick guarantees
pub fn check_maps(maps: &[ParameterMap]) -> usize {
    maps.iter()
        .filter(|m| m.iter().count() != Parameter::COUNT || !m.in_range())
        .count()
}

pub struct PipelineSimulator {
    config: SimulationConfig,
    clock: ManualClock,
    render: ManualScheduler,
    meter: ManualScheduler,
    sink: RecordingSink,
    session: Session,
    _render_handle: TickHandle,
}

impl PipelineSimulator {
    pub fn new(config: SimulationConfig) -> MarionetteResult<Self> {
        let clock = ManualClock::new();
        let mut render = ManualScheduler::new();
        let meter = ManualScheduler::new();
        let sink = RecordingSink::new();

        let session = Session::builder(config.session.clone())
            .clock(Arc::new(clock.clone()))
            .sink(sink.clone())
            .meter_source(RandomMeterSource::new(config.seed))
            .meter_scheduler(meter.clone())
            .build()?;
        let render_handle = session.drive_with(&mut render);

        Ok(PipelineSimulator {
            config,
            clock,
            render,
            meter,
            sink,
            session,
            _render_handle: render_handle,
        })
    }

    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Start the session and run for the configured duration
    pub fn run(&mut self) -> MarionetteResult<SimulationReport> {
        if !self.session.is_running() {
            self.session.start()?;
        }

        let mut camera = CameraFeed::new(
            self.config.camera.clone(),
            self.config.script.clone(),
            self.config.seed,
        );
        let input = self.session.landmark_input();
        let step = Duration::from_millis(1);
        let meter_interval = self.config.session.meter_interval();
        let mut since_render = Duration::ZERO;
        let mut since_meter = Duration::ZERO;
        let mut elapsed = Duration::ZERO;

        while elapsed < self.config.duration {
            elapsed += step;
            since_render += step;
            since_meter += step;
            let now = self.clock.advance(step);

            for frame in camera.advance(step) {
                // rejected frames are counted by the producer
                let _ = input.on_landmarks(&frame.points);
            }
            if since_meter >= meter_interval {
                since_meter = Duration::ZERO;
                self.meter.fire(now);
            }
            if since_render >= self.config.frame_period {
                since_render = Duration::ZERO;
                self.render.fire(self.clock.now());
            }
        }

        let maps = self.sink.maps();
        self.sink.clear();
        Ok(SimulationReport {
            violations: check_maps(&maps),
            maps,
            session: self.session.stats(),
            camera: camera.stats().clone(),
        })
    }
}

/// Run one simulation to completion
pub fn simulate(config: SimulationConfig) -> MarionetteResult<SimulationReport> {
    PipelineSimulator::new(config)?.run()
}
