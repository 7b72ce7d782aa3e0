//! Shape ratios from landmark geometry

use marionette_core::{MarionetteError, MarionetteResult};

use crate::{LandmarkLayout, LandmarkSet, Point2, INNER_MOUTH, LEFT_EYE, RIGHT_EYE};

/// Horizontal reference distances at or below this are degenerate
pub const MIN_REFERENCE_DISTANCE: f32 = f32::EPSILON;

/// Raw (un-normalized) shape ratios for one detection
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatioResult {
    /// EAR of the subject's left eye
    pub left_eye_openness: f32,
    /// EAR of the subject's right eye
    pub right_eye_openness: f32,
    /// MAR of the inner lip contour
    pub mouth_openness: f32,
}

impl RatioResult {
    /// Swap eyes, for mirrored (selfie) camera feeds
    pub fn mirrored(self) -> Self {
        RatioResult {
            left_eye_openness: self.right_eye_openness,
            right_eye_openness: self.left_eye_openness,
            mouth_openness: self.mouth_openness,
        }
    }
}

/// `(d(p2,p6) + d(p3,p5)) / (2 * d(p1,p4))`
pub fn eye_aspect_ratio(eye: &[Point2; 6]) -> MarionetteResult<f32> {
    let vertical = eye[1].distance(&eye[5]) + eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);
    ratio(vertical, 2.0 * horizontal)
}

/// `(d(p2,p8) + d(p3,p7) + d(p4,p6)) / (3 * d(p1,p5))`
pub fn mouth_aspect_ratio(mouth: &[Point2; 8]) -> MarionetteResult<f32> {
    let vertical =
        mouth[1].distance(&mouth[7]) + mouth[2].distance(&mouth[6]) + mouth[3].distance(&mouth[5]);
    let horizontal = mouth[0].distance(&mouth[4]);
    ratio(vertical, 3.0 * horizontal)
}

fn ratio(numerator: f32, denominator: f32) -> MarionetteResult<f32> {
    if !denominator.is_finite() || denominator <= MIN_REFERENCE_DISTANCE {
        return Err(MarionetteError::DegenerateGeometry);
    }
    let value = numerator / denominator;
    if !value.is_finite() {
        return Err(MarionetteError::DegenerateGeometry);
    }
    Ok(value)
}

/// Computes EAR/MAR over a validated landmark layout
#[derive(Debug, Clone, Copy)]
pub struct RatioCalculator {
    layout: LandmarkLayout,
}

impl RatioCalculator {
    /// Calculator for the built-in 68-point layout
    pub fn new() -> Self {
        RatioCalculator {
            layout: LandmarkLayout::IBUG_68,
        }
    }

    /// Calculator for a custom layout, validated here once
    pub fn with_layout(layout: LandmarkLayout) -> MarionetteResult<Self> {
        layout.validate()?;
        Ok(RatioCalculator { layout })
    }

    pub fn layout(&self) -> &LandmarkLayout {
        &self.layout
    }

    /// Ratios for one landmark set
    pub fn compute(&self, set: &LandmarkSet) -> MarionetteResult<RatioResult> {
        let left = eye_aspect_ratio(&set.contour(&self.layout, &LEFT_EYE))?;
        let right = eye_aspect_ratio(&set.contour(&self.layout, &RIGHT_EYE))?;
        let mouth = mouth_aspect_ratio(&set.contour(&self.layout, &INNER_MOUTH))?;

        Ok(RatioResult {
            left_eye_openness: left,
            right_eye_openness: right,
            mouth_openness: mouth,
        })
    }

    /// Ratios for a raw detector frame; wrong-sized frames are rejected
    pub fn compute_points(&self, points: &[Point2]) -> MarionetteResult<RatioResult> {
        let set = LandmarkSet::from_slice(points)?;
        self.compute(&set)
    }
}

impl Default for RatioCalculator {
    fn default() -> Self {
        Self::new()
    }
}
