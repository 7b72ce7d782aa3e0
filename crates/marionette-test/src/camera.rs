//! Simulated camera and landmark detector
//!
//! Produces detection frames on an irregular cadence, independent of the
//! render tick:
//! - Frame timing jitter
//! - Missed detections (no face found)
//! - Truncated frames (wrong point count)
//! - Degenerate frames (all points collapsed)

use std::collections::VecDeque;
use std::time::Duration;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use marionette_face::{Point2, LANDMARK_COUNT};

use crate::face_script::{FacePose, FaceScript};

/// Frame timing jitter
#[derive(Clone, Debug)]
pub enum FrameJitter {
    None,
    /// Uniform extra delay
    Uniform { min_ms: u32, max_ms: u32 },
    /// Heavy-tailed stalls (e.g. detector under load)
    Pareto { scale_ms: f64, shape: f64 },
}

impl FrameJitter {
    pub fn sample(&self, rng: &mut StdRng) -> Duration {
        match self {
            FrameJitter::None => Duration::ZERO,
            FrameJitter::Uniform { min_ms, max_ms } => {
                if max_ms <= min_ms {
                    return Duration::from_millis(*min_ms as u64);
                }
                let dist = Uniform::new(*min_ms, *max_ms);
                Duration::from_millis(dist.sample(rng) as u64)
            }
            FrameJitter::Pareto { scale_ms, shape } => {
                let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                let value = scale_ms / u.powf(1.0 / shape) - scale_ms;
                Duration::from_millis(value.clamp(0.0, 500.0) as u64)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Nominal detector period
    pub frame_interval: Duration,
    pub jitter: FrameJitter,
    /// Probability a frame has no detection at all
    pub miss_rate: f64,
    /// Probability a frame arrives with the wrong point count
    pub truncated_rate: f64,
    /// Probability every point of a frame collapses onto one
    pub degenerate_rate: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            frame_interval: Duration::from_millis(33),
            jitter: FrameJitter::Uniform {
                min_ms: 0,
                max_ms: 8,
            },
            miss_rate: 0.02,
            truncated_rate: 0.0,
            degenerate_rate: 0.0,
        }
    }
}

impl CameraConfig {
    /// Steady 30 fps detector, every frame valid
    pub fn ideal() -> Self {
        CameraConfig {
            jitter: FrameJitter::None,
            miss_rate: 0.0,
            ..Default::default()
        }
    }

    /// Overloaded detector with bad frames
    pub fn noisy() -> Self {
        CameraConfig {
            frame_interval: Duration::from_millis(40),
            jitter: FrameJitter::Pareto {
                scale_ms: 10.0,
                shape: 1.5,
            },
            miss_rate: 0.1,
            truncated_rate: 0.05,
            degenerate_rate: 0.05,
        }
    }

    /// Detector faster than the render loop
    pub fn burst() -> Self {
        CameraConfig {
            frame_interval: Duration::from_millis(5),
            jitter: FrameJitter::None,
            miss_rate: 0.0,
            ..Default::default()
        }
    }
}

/// What the detector reported for one frame
#[derive(Clone, Debug, PartialEq)]
pub enum FrameKind {
    /// Valid detection of the scripted pose
    Face(FacePose),
    Truncated,
    Degenerate,
}

#[derive(Clone, Debug)]
pub struct CameraFrame {
    /// Capture time relative to the feed start
    pub at: Duration,
    pub kind: FrameKind,
    pub points: Vec<Point2>,
}

#[derive(Clone, Debug, Default)]
pub struct CameraStats {
    pub frames: u64,
    pub missed: u64,
    pub truncated: u64,
    pub degenerate: u64,
}

impl CameraStats {
    pub fn valid(&self) -> u64 {
        self.frames - self.truncated - self.degenerate
    }
}

/// Deterministic camera feed for a scripted face
pub struct CameraFeed {
    config: CameraConfig,
    script: FaceScript,
    rng: StdRng,
    now: Duration,
    next_frame: Duration,
    pending: VecDeque<CameraFrame>,
    stats: CameraStats,
}

impl CameraFeed {
    pub fn new(config: CameraConfig, script: FaceScript, seed: u64) -> Self {
        CameraFeed {
            config,
            script,
            rng: StdRng::seed_from_u64(seed),
            now: Duration::ZERO,
            next_frame: Duration::ZERO,
            pending: VecDeque::new(),
            stats: CameraStats::default(),
        }
    }

    /// Advance time; return frames captured within `dt`, oldest first
    pub fn advance(&mut self, dt: Duration) -> Vec<CameraFrame> {
        self.now += dt;

        while self.next_frame <= self.now {
            let at = self.next_frame;
            self.capture(at);
            let step = self.config.frame_interval.max(Duration::from_millis(1));
            self.next_frame = at + step + self.config.jitter.sample(&mut self.rng);
        }

        self.pending.drain(..).collect()
    }

    fn capture(&mut self, at: Duration) {
        if self.rng.gen::<f64>() < self.config.miss_rate {
            self.stats.missed += 1;
            return;
        }
        self.stats.frames += 1;

        let pose = self.script.pose_at(at);
        let origin = Point2::new(320.0, 240.0);
        let roll = self.rng.gen::<f64>();

        let frame = if roll < self.config.truncated_rate {
            self.stats.truncated += 1;
            let keep = self.rng.gen_range(0..LANDMARK_COUNT);
            let mut points = pose.landmarks(origin);
            points.truncate(keep);
            CameraFrame {
                at,
                kind: FrameKind::Truncated,
                points,
            }
        } else if roll < self.config.truncated_rate + self.config.degenerate_rate {
            self.stats.degenerate += 1;
            CameraFrame {
                at,
                kind: FrameKind::Degenerate,
                points: vec![origin; LANDMARK_COUNT],
            }
        } else {
            CameraFrame {
                at,
                kind: FrameKind::Face(pose),
                points: pose.landmarks(origin),
            }
        };
        self.pending.push_back(frame);
    }

    pub fn stats(&self) -> &CameraStats {
        &self.stats
    }

    pub fn current_time(&self) -> Duration {
        self.now
    }
}
