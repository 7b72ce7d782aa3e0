//! Animation time
//!
//! Monotonic, local-driven time measured from the start of an animation
//! session. The render tick derives every time-based parameter from it.

use std::ops::{Add, Sub};
use std::time::Duration;

/// Animation time - microseconds since the animation session started
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AnimationTime(pub u64);

impl AnimationTime {
    pub const ZERO: AnimationTime = AnimationTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        AnimationTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        AnimationTime(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        AnimationTime((secs.max(0.0) * 1_000_000.0) as u64)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        AnimationTime(self.0.saturating_add(duration_micros(duration)))
    }

    /// Time elapsed since `origin`, zero if `origin` is later
    #[inline]
    pub fn since(self, origin: AnimationTime) -> Duration {
        self - origin
    }
}

/// Whole microseconds in `duration`, saturating at `u64::MAX`
#[inline]
pub fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl Add<Duration> for AnimationTime {
    type Output = AnimationTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<AnimationTime> for AnimationTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: AnimationTime) -> Self::Output {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for AnimationTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}ms)", self.0 as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_time_monotonic() {
        let t1 = AnimationTime::from_millis(100);
        let t2 = t1 + Duration::from_millis(10);

        assert!(t2 > t1);
        assert_eq!(t2 - t1, Duration::from_millis(10));
    }

    #[test]
    fn test_since_never_negative() {
        let early = AnimationTime::from_millis(5);
        let late = AnimationTime::from_millis(50);

        assert_eq!(early.since(late), Duration::ZERO);
        assert_eq!(late.since(early), Duration::from_millis(45));
    }

    #[test]
    fn test_secs_conversion() {
        let t = AnimationTime::from_secs_f64(1.25);
        assert_eq!(t.as_millis(), 1250);
        assert!((t.as_secs_f64() - 1.25).abs() < 1e-9);
        assert_eq!(AnimationTime::from_secs_f64(-3.0), AnimationTime::ZERO);
    }

    #[test]
    fn test_conversions_saturate() {
        assert_eq!(AnimationTime::from_millis(u64::MAX).as_micros(), u64::MAX);
        assert_eq!(duration_micros(Duration::MAX), u64::MAX);

        let t = AnimationTime::from_millis(1) + Duration::MAX;
        assert_eq!(t.as_micros(), u64::MAX);
    }
}
