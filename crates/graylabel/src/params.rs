use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::MappingError;

/// Encoding used for frames kept between the service phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameFormat {
    /// Lossy, `quality` in `1..=100`.
    Jpeg { quality: u8 },
    /// Lossless.
    Png,
}

impl FrameFormat {
    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg { .. } => ".jpg",
            FrameFormat::Png => ".png",
        }
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        FrameFormat::Jpeg { quality: 90 }
    }
}

/// Mapping service settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How long job records are kept.
    pub retention_seconds: u64,
    /// Time each pattern frame is held by the LED controller.
    pub pattern_interval_seconds: f64,
    pub frame_format: FrameFormat,
}

impl ServiceConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_seconds)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            retention_seconds: 7 * 60,
            pattern_interval_seconds: 2.0,
            frame_format: FrameFormat::default(),
        }
    }
}

/// Options of a single detection attempt on the reference frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOptions {
    /// Darken the frame before detection.
    pub use_tone_filter: bool,
    /// Detect extra candidates and keep the best scoring ones.
    pub use_score_filter: bool,
    /// Extra candidates requested from the detector when scoring is on.
    pub score_filter_margin: usize,
    /// Minimal distance between two pixels, `10..=30`.
    pub min_distance: u32,
    /// Relative detector quality level, `0.01..=0.3`.
    pub quality_level: f32,
}

impl TryOptions {
    pub const MIN_DISTANCE_RANGE: std::ops::RangeInclusive<u32> = 10..=30;
    pub const QUALITY_LEVEL_RANGE: std::ops::RangeInclusive<f32> = 0.01..=0.3;

    pub fn validate(&self) -> Result<(), MappingError> {
        if !Self::MIN_DISTANCE_RANGE.contains(&self.min_distance) {
            return Err(MappingError::InvalidOptions(format!(
                "min_distance must be in {:?}, got {}",
                Self::MIN_DISTANCE_RANGE,
                self.min_distance
            )));
        }
        if !Self::QUALITY_LEVEL_RANGE.contains(&self.quality_level) {
            return Err(MappingError::InvalidOptions(format!(
                "quality_level must be in {:?}, got {}",
                Self::QUALITY_LEVEL_RANGE,
                self.quality_level
            )));
        }
        Ok(())
    }
}

impl Default for TryOptions {
    fn default() -> Self {
        Self {
            use_tone_filter: true,
            use_score_filter: true,
            score_filter_margin: 10,
            min_distance: 14,
            quality_level: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(TryOptions::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        for options in [
            TryOptions {
                min_distance: 9,
                ..TryOptions::default()
            },
            TryOptions {
                min_distance: 31,
                ..TryOptions::default()
            },
            TryOptions {
                quality_level: 0.005,
                ..TryOptions::default()
            },
            TryOptions {
                quality_level: f32::NAN,
                ..TryOptions::default()
            },
        ] {
            assert!(matches!(
                options.validate(),
                Err(MappingError::InvalidOptions(_))
            ));
        }
    }

    #[test]
    fn frame_format_json_shape() {
        let json = serde_json::to_string(&FrameFormat::Jpeg { quality: 75 }).expect("json");
        assert_eq!(json, r#"{"kind":"jpeg","quality":75}"#);
        let png: FrameFormat = serde_json::from_str(r#"{"kind":"png"}"#).expect("parse");
        assert_eq!(png.extension(), ".png");
    }
}
