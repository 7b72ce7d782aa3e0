//! Audio envelope mapping
//!
//! Maps a metering reading in decibels onto the same raw domain as a mouth
//! aspect ratio, so audio-driven and landmark-driven mouth animation share
//! one calibration path.

/// Silence floor reported by typical audio meters
pub const SILENCE_FLOOR_DB: f32 = -160.0;

/// Loudest reading accepted (full scale)
pub const FULL_SCALE_DB: f32 = 0.0;

/// dB → raw mouth openness via `10^(dB / 40)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeMapper {
    floor_db: f32,
}

impl EnvelopeMapper {
    pub fn new() -> Self {
        EnvelopeMapper {
            floor_db: SILENCE_FLOOR_DB,
        }
    }

    /// Mapper with a custom silence floor (clamped to at most full scale)
    pub fn with_floor(floor_db: f32) -> Self {
        let floor_db = if floor_db.is_finite() {
            floor_db.min(FULL_SCALE_DB)
        } else {
            SILENCE_FLOOR_DB
        };
        EnvelopeMapper { floor_db }
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    /// Raw value for a reading. Readings below the floor (or NaN) read as
    /// the floor, readings above full scale read as full scale.
    pub fn map(&self, db: f32) -> f32 {
        let db = if db.is_nan() {
            self.floor_db
        } else {
            db.clamp(self.floor_db, FULL_SCALE_DB)
        };
        10f32.powf(db / 40.0)
    }

    /// Inverse of [`EnvelopeMapper::map`], for synthesising readings
    pub fn db_for(&self, raw: f32) -> f32 {
        if raw.is_nan() || raw <= 0.0 {
            return self.floor_db;
        }
        (40.0 * raw.log10()).clamp(self.floor_db, FULL_SCALE_DB)
    }
}

impl Default for EnvelopeMapper {
    fn default() -> Self {
        Self::new()
    }
}
