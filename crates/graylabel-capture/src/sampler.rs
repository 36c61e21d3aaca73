use crate::{CaptureSource, SampleError};
use graylabel_core::{required_frames, RgbFrame};
use log::{debug, info};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One frame of the pattern sequence. Index `0` is the reference frame with
/// every light pixel lit, indices `1..=required_frames` are bit-planes.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledFrame {
    pub index: usize,
    pub frame: RgbFrame,
}

/// Single-pass iterator over the pattern frames of a capture.
///
/// Frame `k` is read at `start + round(k * frame_step)` where `start` is the
/// source position when the sampler was created and
/// `frame_step = fps * pattern_interval_seconds`. Frames in between are
/// skipped by seeking, so jitter of the camera frame rate within one step
/// does not matter.
///
/// The length check in [`FrameSampler::new`] only asks for
/// `frame_count >= frame_step * required_frames`. The last bit-plane is read
/// at exactly that position, so a capture of precisely that length passes
/// validation and then fails with
/// [`SampleError::UnexpectedEndOfCapture`] on its final frame.
///
/// The iterator stops after the first error. The source is released exactly
/// once: when the sequence completes, when it fails, or when the sampler is
/// dropped.
pub struct FrameSampler<S: CaptureSource> {
    source: S,
    required_frames: usize,
    frame_step: f64,
    start: u64,
    next_index: usize,
    finished: bool,
    released: bool,
}

impl<S: CaptureSource> FrameSampler<S> {
    /// Validate the source against the pattern length and prepare sampling.
    ///
    /// Nothing is read here. On error the source has already been released.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(source), fields(frame_count = source.frame_count()))
    )]
    pub fn new(
        source: S,
        total_pixels: usize,
        pattern_interval_seconds: f64,
    ) -> Result<Self, SampleError> {
        let start = source.position();
        let mut sampler = Self {
            source,
            required_frames: required_frames(total_pixels),
            frame_step: 0.0,
            start,
            next_index: 0,
            finished: false,
            released: false,
        };

        if !sampler.source.is_opened() {
            return Err(SampleError::CaptureInit);
        }
        let fps = sampler.source.fps();
        if !(fps.is_finite() && fps > 0.0) {
            return Err(SampleError::InvalidFrameRate(fps));
        }
        if total_pixels == 0 {
            return Err(SampleError::InvalidPixelCount);
        }
        if !(pattern_interval_seconds.is_finite() && pattern_interval_seconds > 0.0) {
            return Err(SampleError::InvalidInterval(pattern_interval_seconds));
        }

        sampler.frame_step = fps * pattern_interval_seconds;
        let available = sampler.source.frame_count();
        let needed = sampler.frame_step * sampler.required_frames as f64;
        if (available as f64) < needed {
            return Err(SampleError::InsufficientFrames {
                available,
                required: needed,
            });
        }

        info!(
            "sampling {} pattern frames (+1 reference) every {:.2} frames from {} available",
            sampler.required_frames, sampler.frame_step, available
        );
        Ok(sampler)
    }

    /// Number of pattern frames, excluding the reference frame.
    #[inline]
    pub fn required_frames(&self) -> usize {
        self.required_frames
    }

    /// Frames between two emitted frames.
    #[inline]
    pub fn frame_step(&self) -> f64 {
        self.frame_step
    }

    /// Drain the sampler into a vector ordered by pattern index.
    pub fn into_frames(self) -> Result<Vec<RgbFrame>, SampleError> {
        self.map(|sampled| sampled.map(|s| s.frame)).collect()
    }

    fn finish(&mut self) {
        self.finished = true;
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}

impl<S: CaptureSource> Iterator for FrameSampler<S> {
    type Item = Result<SampledFrame, SampleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.next_index > self.required_frames {
            self.finish();
            return None;
        }

        let index = self.next_index;
        let target = self.start + (index as f64 * self.frame_step).round() as u64;
        if self.source.position() != target {
            self.source.seek(target);
        }

        let Some(frame) = self.source.read_frame() else {
            self.finish();
            return Some(Err(SampleError::UnexpectedEndOfCapture { index }));
        };

        debug!("sampled frame {index} at source position {target}");
        self.next_index += 1;
        if self.next_index > self.required_frames {
            self.finish();
        }
        Some(Ok(SampledFrame { index, frame }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        (0, Some(self.required_frames + 1 - self.next_index))
    }
}

impl<S: CaptureSource> Drop for FrameSampler<S> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}
