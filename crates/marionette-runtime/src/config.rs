//! Session configuration
//!
//! Loaded from JSON (every field optional, missing fields take defaults) or
//! built from one of the presets.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use marionette_core::{CalibrationRange, MarionetteError, MarionetteResult, Normalizer};
use marionette_face::{EnvelopeMapper, FULL_SCALE_DB};

use crate::{DriverConfig, DEFAULT_BREATH_PERIOD, DEFAULT_CHANNEL_CAPACITY};

/// Where MOUTH_OPEN_Y samples come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthSource {
    /// Mouth aspect ratio from the landmark detector
    Landmarks,
    /// Average power from an audio meter
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mouth_source: MouthSource,
    /// Raw EAR range mapped onto 0..1
    pub eye_range: CalibrationRange,
    /// Raw MAR range mapped onto 0..1 (landmark mouth)
    pub mouth_landmark_range: CalibrationRange,
    /// Raw envelope range mapped onto 0..1 (audio mouth)
    pub mouth_audio_range: CalibrationRange,
    /// Pending samples per parameter channel
    pub channel_capacity: usize,
    /// Audio metering period
    pub meter_interval_ms: u64,
    /// Meter readings at or below this are silence
    pub silence_floor_db: f32,
    /// One full breath cycle
    pub breath_period_secs: f64,
    /// Swap eyes for mirrored camera feeds
    pub mirror_eyes: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            mouth_source: MouthSource::Landmarks,
            eye_range: CalibrationRange::eye(),
            mouth_landmark_range: CalibrationRange::unit(),
            mouth_audio_range: CalibrationRange::unit(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            meter_interval_ms: 100,
            silence_floor_db: marionette_face::SILENCE_FLOOR_DB,
            breath_period_secs: 1.0,
            mirror_eyes: false,
        }
    }
}

impl SessionConfig {
    /// Mouth, eyes and breathing all from the camera
    pub fn landmark_driven() -> Self {
        Self::default()
    }

    /// Eyes from the camera, mouth from the audio meter
    pub fn audio_driven() -> Self {
        SessionConfig {
            mouth_source: MouthSource::Audio,
            ..Default::default()
        }
    }

    /// Audio mouth metered twice a second, as in the livestream demo app
    pub fn livestream_demo() -> Self {
        SessionConfig {
            meter_interval_ms: 500,
            ..Self::audio_driven()
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> MarionetteResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MarionetteError::InvalidConfig(format!("{}: {}", path.display(), e)))?;

        Self::from_json_str(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(s: &str) -> MarionetteResult<Self> {
        let config: SessionConfig =
            serde_json::from_str(s).map_err(|e| MarionetteError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MarionetteResult<()> {
        if self.channel_capacity == 0 {
            return Err(invalid("channel_capacity", "must be greater than 0"));
        }
        if self.meter_interval_ms == 0 {
            return Err(invalid("meter_interval_ms", "must be greater than 0"));
        }
        if !self.silence_floor_db.is_finite() || self.silence_floor_db >= FULL_SCALE_DB {
            return Err(invalid("silence_floor_db", "must be finite and below 0 dB"));
        }
        if self.breath_period_secs <= 0.0 {
            return Err(invalid("breath_period_secs", "must be positive"));
        }
        match Duration::try_from_secs_f64(self.breath_period_secs) {
            Ok(period) if period.is_zero() => {
                return Err(invalid("breath_period_secs", "rounds to zero"));
            }
            Ok(_) => {}
            Err(e) => return Err(invalid("breath_period_secs", &e.to_string())),
        }
        Ok(())
    }

    pub fn meter_interval(&self) -> Duration {
        Duration::from_millis(self.meter_interval_ms)
    }

    /// Breath period; the default period if the field does not validate
    pub fn breath_period(&self) -> Duration {
        match Duration::try_from_secs_f64(self.breath_period_secs) {
            Ok(period) if !period.is_zero() => period,
            _ => DEFAULT_BREATH_PERIOD,
        }
    }

    pub fn envelope_mapper(&self) -> EnvelopeMapper {
        EnvelopeMapper::with_floor(self.silence_floor_db)
    }

    /// Normalizer for the configured mouth source
    pub fn normalizer(&self) -> Normalizer {
        let mouth = match self.mouth_source {
            MouthSource::Landmarks => self.mouth_landmark_range,
            MouthSource::Audio => self.mouth_audio_range,
        };
        Normalizer::new(mouth, self.eye_range)
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            channel_capacity: self.channel_capacity,
            breath_period: self.breath_period(),
            normalizer: self.normalizer(),
        }
    }
}

fn invalid(field: &str, message: &str) -> MarionetteError {
    MarionetteError::InvalidConfig(format!("{}: {}", field, message))
}
