//! Two-phase mapping jobs over pluggable storage.
//!
//! `init` samples a capture into stored frames, `try_analyze` proposes pixel
//! positions on the reference frame (repeatable with different options) and
//! `continue_analyze` decodes the labels for the confirmed positions.

use graylabel_capture::{CaptureSource, FrameSampler, SampleError};
use graylabel_core::{adjust_tone, required_frames, PixelCoord, RgbFrame, ToneParams};
use graylabel_decode::{read_labels, LabelParams};
use graylabel_detect::{detect_pixels, score_pixels, DetectParams, ScoreParams};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::codec::{decode_frame, encode_frame};
use crate::storage::storage_key;
use crate::{
    ByteStorage, JobRecord, JobRepository, JobStatus, MappingError, ServiceConfig, Strategy,
    TryOptions,
};

const FRAMES_DIR: &str = "frames";

/// Outcome of a detection attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TryResult {
    /// Storage key of the reference frame the positions refer to.
    pub base_frame: String,
    pub positions: Vec<PixelCoord>,
}

pub struct MappingService<S, R> {
    config: ServiceConfig,
    storage: S,
    repository: R,
    detect: DetectParams,
    score: ScoreParams,
    label: LabelParams,
    tone: ToneParams,
}

impl<S: ByteStorage, R: JobRepository> MappingService<S, R> {
    pub fn new(config: ServiceConfig, storage: S, repository: R) -> Self {
        Self {
            config,
            storage,
            repository,
            detect: DetectParams::default(),
            score: ScoreParams::default(),
            label: LabelParams::default(),
            tone: ToneParams::darken(),
        }
    }

    /// Base detector settings. `max_candidates`, `quality_level` and
    /// `min_distance` are overridden per attempt.
    pub fn with_detect_params(mut self, params: DetectParams) -> Self {
        self.detect = params;
        self
    }

    pub fn with_score_params(mut self, params: ScoreParams) -> Self {
        self.score = params;
        self
    }

    pub fn with_label_params(mut self, params: LabelParams) -> Self {
        self.label = params;
        self
    }

    /// Tone curve applied when `use_tone_filter` is set.
    pub fn with_tone(mut self, tone: ToneParams) -> Self {
        self.tone = tone;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Storage key of pattern frame `index` of job `id`.
    pub fn frame_key(&self, id: Uuid, index: usize) -> String {
        storage_key([
            id.to_string(),
            FRAMES_DIR.to_string(),
            format!("{index}{}", self.config.frame_format.extension()),
        ])
    }

    /// Create a queued job and store the reference and bit-plane frames.
    ///
    /// On a sampling or encoding failure the job directory is removed and
    /// the error returned; the queued record is left to expire.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, source)))]
    pub fn init<C: CaptureSource>(
        &self,
        total_pixels: usize,
        source: C,
    ) -> Result<JobRecord, MappingError> {
        if total_pixels == 0 {
            return Err(SampleError::InvalidPixelCount.into());
        }

        let record = JobRecord::new(total_pixels, Strategy::GrayLabel);
        self.repository
            .save(&record, Some(self.config.retention()))?;

        match self.store_frames(&record, source) {
            Ok(stored) => {
                info!("job {}: stored {stored} frames", record.id);
                Ok(record)
            }
            Err(err) => {
                warn!("job {}: init failed, removing its files: {err}", record.id);
                if let Err(cleanup) = self.storage.delete(&record.dir()) {
                    warn!("job {}: cleanup failed: {cleanup}", record.id);
                }
                Err(err)
            }
        }
    }

    fn store_frames<C: CaptureSource>(
        &self,
        record: &JobRecord,
        source: C,
    ) -> Result<usize, MappingError> {
        let sampler = FrameSampler::new(
            source,
            record.total_pixels,
            self.config.pattern_interval_seconds,
        )?;
        let mut stored = 0;
        for sampled in sampler {
            let sampled = sampled?;
            let bytes = encode_frame(&sampled.frame, self.config.frame_format)?;
            self.storage
                .save(&self.frame_key(record.id, sampled.index), &bytes)?;
            stored += 1;
        }
        Ok(stored)
    }

    /// Propose `total_pixels` positions on the reference frame.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, options)))]
    pub fn try_analyze(&self, id: Uuid, options: &TryOptions) -> Result<TryResult, MappingError> {
        options.validate()?;
        let record = self.gray_label_record(id)?;
        let total = record.total_pixels;

        let base_frame = self.frame_key(id, 0);
        let original = self.load_frame(&base_frame)?;

        let toned;
        let frame = if options.use_tone_filter {
            toned = adjust_tone(&original, &self.tone);
            &toned
        } else {
            &original
        };

        let requested = if options.use_score_filter {
            total
                .checked_add(options.score_filter_margin)
                .ok_or_else(|| {
                    MappingError::InvalidOptions(format!(
                        "score filter margin {} overflows the candidate count",
                        options.score_filter_margin
                    ))
                })?
        } else {
            total
        };
        let params = DetectParams {
            max_candidates: requested,
            quality_level: options.quality_level,
            min_distance: options.min_distance as f32,
            ..self.detect.clone()
        };
        let mut positions = detect_pixels(frame, &params);
        if positions.len() < total {
            return Err(MappingError::NoPixelTargets {
                found: positions.len(),
                required: total,
            });
        }

        if options.use_score_filter {
            positions = score_pixels(&original, total, &positions, &self.score);
        }
        info!("job {id}: proposing {} positions", positions.len());

        Ok(TryResult {
            base_frame,
            positions,
        })
    }

    /// Decode the index of every confirmed position and store the mapping.
    ///
    /// Returns the positions ordered by LED index.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, positions), fields(positions = positions.len()))
    )]
    pub fn continue_analyze(
        &self,
        id: Uuid,
        positions: &[PixelCoord],
    ) -> Result<Vec<PixelCoord>, MappingError> {
        let mut record = self.gray_label_record(id)?;
        let total = record.total_pixels;

        let frames = (0..=required_frames(total))
            .map(|index| self.load_frame(&self.frame_key(id, index)))
            .collect::<Result<Vec<_>, _>>()?;

        let ordered = read_labels(&frames, total, positions, &self.label)?.into_positions(total)?;

        record.status = JobStatus::Mapped;
        record.positions = ordered.clone();
        self.repository
            .save(&record, Some(self.config.retention()))?;
        info!("job {id}: mapped {total} pixels");
        Ok(ordered)
    }

    pub fn read(&self, id: Uuid) -> Result<JobRecord, MappingError> {
        self.repository
            .get(id)?
            .ok_or(MappingError::JobNotFound(id))
    }

    fn gray_label_record(&self, id: Uuid) -> Result<JobRecord, MappingError> {
        let record = self.read(id)?;
        if record.strategy != Strategy::GrayLabel {
            return Err(MappingError::StrategyUnapplicable(record.strategy));
        }
        Ok(record)
    }

    fn load_frame(&self, key: &str) -> Result<RgbFrame, MappingError> {
        let bytes = self
            .storage
            .read(key)?
            .ok_or_else(|| MappingError::NotInitialized {
                path: key.to_string(),
            })?;
        Ok(decode_frame(&bytes, self.config.frame_format)?)
    }
}
