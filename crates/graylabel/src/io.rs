//! JSON configuration for the mapping service and the CLI.

use std::fs;
use std::path::Path;

use graylabel_core::ToneParams;
use graylabel_decode::LabelParams;
use graylabel_detect::{DetectParams, ScoreParams};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ServiceConfig, TryOptions};

/// Every tunable of a mapping run. Missing sections and fields take their
/// defaults, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub service: ServiceConfig,
    pub try_options: TryOptions,
    /// Base detector settings; the per-attempt fields come from `try_options`.
    pub detect: DetectParams,
    pub score: ScoreParams,
    pub label: LabelParams,
    /// Curve applied before detection when the tone filter is on.
    pub tone: ToneParams,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            try_options: TryOptions::default(),
            detect: DetectParams::default(),
            score: ScoreParams::default(),
            label: LabelParams::default(),
            tone: ToneParams::darken(),
        }
    }
}

impl MappingConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a mapping service from this config.
    #[cfg(feature = "image")]
    pub fn build_service<S, R>(&self, storage: S, repository: R) -> crate::MappingService<S, R>
    where
        S: crate::ByteStorage,
        R: crate::JobRepository,
    {
        crate::MappingService::new(self.service.clone(), storage, repository)
            .with_detect_params(self.detect.clone())
            .with_score_params(self.score.clone())
            .with_label_params(self.label.clone())
            .with_tone(self.tone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameFormat;

    #[test]
    fn empty_json_is_default() {
        let config: MappingConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, MappingConfig::default());
        assert_eq!(config.tone, ToneParams::darken());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: MappingConfig = serde_json::from_str(
            r#"{
                "service": { "frame_format": { "kind": "png" } },
                "try_options": { "use_score_filter": false },
                "label": { "on_threshold_margin": 25.0 }
            }"#,
        )
        .expect("parse");
        assert_eq!(config.service.frame_format, FrameFormat::Png);
        assert_eq!(config.service.pattern_interval_seconds, 2.0);
        assert!(!config.try_options.use_score_filter);
        assert!(config.try_options.use_tone_filter);
        assert_eq!(config.label.on_threshold_margin, 25.0);
        assert_eq!(config.label.ring, LabelParams::default().ring);
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mapping.json");
        let mut config = MappingConfig::default();
        config.try_options.min_distance = 20;
        config.score.signal_weight = 0.5;
        config.write_json(&path).expect("write");
        assert_eq!(MappingConfig::load_json(&path).expect("load"), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            MappingConfig::load_json("/nonexistent/graylabel.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
