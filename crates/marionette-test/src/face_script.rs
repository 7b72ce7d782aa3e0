//! Scripted faces - synthetic 68-point detections with known ratios
//!
//! Generates landmark frames whose eye and mouth aspect ratios are exact
//! functions of the requested openness, so tests can assert on the values
//! that reach the renderer.

use std::time::Duration;

use marionette_face::{LandmarkLayout, LandmarkPoint, LandmarkSet, Point2};

/// Eye width in face units; EAR equals `lid_gap / EYE_WIDTH`
pub const EYE_WIDTH: f32 = 30.0;
/// Inner mouth width; MAR equals `lip_gap / MOUTH_WIDTH`
pub const MOUTH_WIDTH: f32 = 50.0;

/// Pose of one synthetic face
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacePose {
    /// Target EAR of the subject's left eye
    pub left_ear: f32,
    /// Target EAR of the subject's right eye
    pub right_ear: f32,
    /// Target inner-mouth MAR
    pub mar: f32,
}

impl FacePose {
    pub fn new(left_ear: f32, right_ear: f32, mar: f32) -> Self {
        FacePose {
            left_ear,
            right_ear,
            mar,
        }
    }

    /// Relaxed face: eyes open, mouth closed
    pub fn rest() -> Self {
        Self::new(0.32, 0.32, 0.0)
    }

    /// Detection realizing this pose, centred at `origin`
    pub fn landmark_set(&self, origin: Point2) -> LandmarkSet {
        let layout = LandmarkLayout::IBUG_68;
        let mut set = LandmarkSet::filled(origin);
        let mut place = |name: LandmarkPoint, dx: f32, dy: f32| {
            set.set(&layout, name, Point2::new(origin.x + dx, origin.y + dy));
        };

        use LandmarkPoint::*;
        let right = self.right_ear.max(0.0) * EYE_WIDTH / 2.0;
        place(RightEyeOuterCorner, -75.0, -40.0);
        place(RightEyeUpperOuter, -65.0, -40.0 - right);
        place(RightEyeUpperInner, -55.0, -40.0 - right);
        place(RightEyeInnerCorner, -45.0, -40.0);
        place(RightEyeLowerInner, -55.0, -40.0 + right);
        place(RightEyeLowerOuter, -65.0, -40.0 + right);

        let left = self.left_ear.max(0.0) * EYE_WIDTH / 2.0;
        place(LeftEyeInnerCorner, 45.0, -40.0);
        place(LeftEyeUpperInner, 55.0, -40.0 - left);
        place(LeftEyeUpperOuter, 65.0, -40.0 - left);
        place(LeftEyeOuterCorner, 75.0, -40.0);
        place(LeftEyeLowerOuter, 65.0, -40.0 + left);
        place(LeftEyeLowerInner, 55.0, -40.0 + left);

        let lips = self.mar.max(0.0) * MOUTH_WIDTH / 2.0;
        place(MouthInnerRightCorner, -25.0, 60.0);
        place(MouthInnerUpperRight, -12.5, 60.0 - lips);
        place(MouthInnerUpperCenter, 0.0, 60.0 - lips);
        place(MouthInnerUpperLeft, 12.5, 60.0 - lips);
        place(MouthInnerLeftCorner, 25.0, 60.0);
        place(MouthInnerLowerLeft, 12.5, 60.0 + lips);
        place(MouthInnerLowerCenter, 0.0, 60.0 + lips);
        place(MouthInnerLowerRight, -12.5, 60.0 + lips);

        set
    }

    /// Same detection as a raw detector frame
    pub fn landmarks(&self, origin: Point2) -> Vec<Point2> {
        self.landmark_set(origin).points().to_vec()
    }
}

/// A face that blinks and talks on a fixed rhythm
#[derive(Clone, Debug)]
pub struct FaceScript {
    /// Time between blink starts
    pub blink_period: Duration,
    /// Eyes-closed duration of one blink
    pub blink_duration: Duration,
    /// EAR with eyes open
    pub open_ear: f32,
    /// EAR with eyes closed
    pub closed_ear: f32,
    /// Peak MAR while talking
    pub peak_mar: f32,
    /// Syllable rate (Hz)
    pub syllable_rate: f64,
}

impl Default for FaceScript {
    fn default() -> Self {
        FaceScript {
            blink_period: Duration::from_millis(3_000),
            blink_duration: Duration::from_millis(150),
            open_ear: 0.32,
            closed_ear: 0.05,
            peak_mar: 0.6,
            syllable_rate: 4.0,
        }
    }
}

impl FaceScript {
    /// Face that never blinks or talks
    pub fn still() -> Self {
        FaceScript {
            blink_period: Duration::MAX,
            peak_mar: 0.0,
            ..Default::default()
        }
    }

    pub fn is_blinking(&self, t: Duration) -> bool {
        if self.blink_period == Duration::MAX || self.blink_period.is_zero() {
            return false;
        }
        let phase = t.as_micros() % self.blink_period.as_micros();
        phase < self.blink_duration.as_micros()
    }

    pub fn pose_at(&self, t: Duration) -> FacePose {
        let ear = if self.is_blinking(t) {
            self.closed_ear
        } else {
            self.open_ear
        };
        let syllable = (std::f64::consts::PI * self.syllable_rate * t.as_secs_f64()).sin();
        let mar = self.peak_mar * syllable.abs() as f32;
        FacePose::new(ear, ear, mar)
    }
}
