//! Calibration and normalization
//!
//! Raw shape ratios and envelope values are mapped linearly onto [0, 1]
//! through a per-parameter calibration range. The range is validated once,
//! when it is built, so normalization never guards against division by zero.

use serde::{Deserialize, Serialize};

use crate::{MarionetteError, MarionetteResult, Parameter};

/// Default eye calibration: EAR of a closed eye
pub const EYE_RANGE_MIN: f32 = 0.15;
/// Default eye calibration: EAR of a wide-open eye
pub const EYE_RANGE_MAX: f32 = 0.45;

/// Linear calibration range for one parameter
/// INVARIANT: min, max and max - min are finite and max > min
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRange", into = "RawRange")]
pub struct CalibrationRange {
    min: f32,
    max: f32,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct RawRange {
    min: f32,
    max: f32,
}

impl TryFrom<RawRange> for CalibrationRange {
    type Error = MarionetteError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        CalibrationRange::new(raw.min, raw.max)
    }
}

impl From<CalibrationRange> for RawRange {
    fn from(range: CalibrationRange) -> Self {
        RawRange {
            min: range.min,
            max: range.max,
        }
    }
}

impl CalibrationRange {
    /// Build a range, rejecting `max <= min`, non-finite bounds and spans
    /// that overflow `f32`
    pub fn new(min: f32, max: f32) -> MarionetteResult<Self> {
        if !min.is_finite() || !max.is_finite() || max <= min || !(max - min).is_finite() {
            return Err(MarionetteError::CalibrationRangeInvalid { min, max });
        }
        Ok(CalibrationRange { min, max })
    }

    /// Default eye range (0.15 - 0.45)
    pub fn eye() -> Self {
        CalibrationRange {
            min: EYE_RANGE_MIN,
            max: EYE_RANGE_MAX,
        }
    }

    /// Identity range (0.0 - 1.0)
    pub fn unit() -> Self {
        CalibrationRange { min: 0.0, max: 1.0 }
    }

    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Map a raw value onto [0, 1]. Non-finite input maps to 0.
    #[inline]
    pub fn normalize(&self, raw: f32) -> f32 {
        normalize(raw, self)
    }
}

/// `clamp((raw - min) / (max - min), 0, 1)`
#[inline]
pub fn normalize(raw: f32, range: &CalibrationRange) -> f32 {
    if !raw.is_finite() {
        return 0.0;
    }
    ((raw - range.min) / range.span()).clamp(0.0, 1.0)
}

/// MOUTH_FORM from the same tick's normalized MOUTH_OPEN_Y: `1 - 2 * open_y`
#[inline]
pub fn mouth_form(open_y: f32) -> f32 {
    Parameter::MouthForm.clamp(1.0 - 2.0 * open_y)
}

/// Calibration ranges for every sampled parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalizer {
    pub mouth: CalibrationRange,
    pub eyes: CalibrationRange,
}

impl Normalizer {
    pub fn new(mouth: CalibrationRange, eyes: CalibrationRange) -> Self {
        Normalizer { mouth, eyes }
    }

    /// Range used for a parameter, `None` for derived parameters
    pub fn range(&self, parameter: Parameter) -> Option<&CalibrationRange> {
        match parameter {
            Parameter::MouthOpenY => Some(&self.mouth),
            Parameter::EyeLOpen | Parameter::EyeROpen => Some(&self.eyes),
            Parameter::MouthForm | Parameter::Breath => None,
        }
    }

    /// Normalize a raw sample for a parameter.
    /// Derived parameters are only clamped to their documented range.
    pub fn normalize(&self, parameter: Parameter, raw: f32) -> f32 {
        match self.range(parameter) {
            Some(range) => range.normalize(raw),
            None => parameter.clamp(raw),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer {
            mouth: CalibrationRange::unit(),
            eyes: CalibrationRange::eye(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_range_rejects_inverted() {
        assert_eq!(
            CalibrationRange::new(0.45, 0.15),
            Err(MarionetteError::CalibrationRangeInvalid {
                min: 0.45,
                max: 0.15
            })
        );
        assert!(CalibrationRange::new(0.3, 0.3).is_err());
        assert!(CalibrationRange::new(f32::NAN, 1.0).is_err());
        assert!(CalibrationRange::new(0.0, f32::INFINITY).is_err());
    }

    #[test]
    fn test_extreme_ranges() {
        assert!(CalibrationRange::new(-f32::MAX, f32::MAX).is_err());

        let range = CalibrationRange::new(-f32::MAX / 2.0, f32::MAX / 2.0).unwrap();
        assert_eq!(range.normalize(range.min()), 0.0);
        assert_eq!(range.normalize(range.max()), 1.0);
        assert_eq!(range.normalize(f32::MAX), 1.0);
        assert_eq!(range.normalize(-f32::MAX), 0.0);
    }

    #[test]
    fn test_normalize_endpoints() {
        let range = CalibrationRange::eye();
        assert_eq!(range.normalize(range.min()), 0.0);
        assert_eq!(range.normalize(range.max()), 1.0);
        assert!((range.normalize(0.30) - 0.5).abs() < 1e-5);
        assert_eq!(range.normalize(-2.0), 0.0);
        assert_eq!(range.normalize(9.0), 1.0);
        assert_eq!(range.normalize(f32::NAN), 0.0);
    }

    #[test]
    fn test_mouth_form() {
        assert_eq!(mouth_form(0.0), 1.0);
        assert_eq!(mouth_form(0.5), 0.0);
        assert_eq!(mouth_form(1.0), -1.0);
    }

    #[test]
    fn test_normalizer_derived_passthrough() {
        let n = Normalizer::default();
        assert_eq!(n.normalize(Parameter::MouthForm, -3.0), -1.0);
        assert_eq!(n.normalize(Parameter::EyeROpen, 0.15), 0.0);
        assert!(n.range(Parameter::Breath).is_none());
    }

    #[test]
    fn test_range_deserialize_validates() {
        let ok: CalibrationRange = serde_json::from_str(r#"{"min":0.1,"max":0.4}"#).unwrap();
        assert_eq!(ok.min(), 0.1);

        let bad = serde_json::from_str::<CalibrationRange>(r#"{"min":0.4,"max":0.1}"#);
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn prop_normalize_bounded(raw in -10.0f32..10.0, min in -1.0f32..1.0, span in 0.001f32..5.0) {
            let range = CalibrationRange::new(min, min + span).unwrap();
            let v = range.normalize(raw);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn prop_accepted_range_endpoints(min in -f32::MAX..f32::MAX, max in -f32::MAX..f32::MAX) {
            if let Ok(range) = CalibrationRange::new(min, max) {
                prop_assert_eq!(range.normalize(range.min()), 0.0);
                prop_assert_eq!(range.normalize(range.max()), 1.0);
            }
        }

        #[test]
        fn prop_normalize_monotonic(a in -10.0f32..10.0, b in -10.0f32..10.0) {
            let range = CalibrationRange::eye();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(range.normalize(lo) <= range.normalize(hi));
        }
    }
}
