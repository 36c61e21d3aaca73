use graylabel_core::RgbFrame;

/// Sequential frame reader.
///
/// Positions are zero-based frame indices. `read_frame` returns the frame at
/// the current position and advances the cursor by one, or `None` once the
/// source cannot deliver any more frames.
pub trait CaptureSource {
    /// Whether the source was opened successfully.
    fn is_opened(&self) -> bool {
        true
    }

    /// Total number of frames in the capture.
    fn frame_count(&self) -> u64;

    /// Frames per second.
    fn fps(&self) -> f64;

    /// Current read position.
    fn position(&self) -> u64;

    /// Move the read cursor. Positions past the end are allowed; the next
    /// read then fails.
    fn seek(&mut self, position: u64);

    fn read_frame(&mut self) -> Option<RgbFrame>;

    /// Release the underlying device or file.
    fn release(&mut self) {}
}

impl<S: CaptureSource + ?Sized> CaptureSource for &mut S {
    fn is_opened(&self) -> bool {
        (**self).is_opened()
    }

    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn fps(&self) -> f64 {
        (**self).fps()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn seek(&mut self, position: u64) {
        (**self).seek(position)
    }

    fn read_frame(&mut self) -> Option<RgbFrame> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn is_opened(&self) -> bool {
        (**self).is_opened()
    }

    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn fps(&self) -> f64 {
        (**self).fps()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn seek(&mut self, position: u64) {
        (**self).seek(position)
    }

    fn read_frame(&mut self) -> Option<RgbFrame> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Capture source over frames already held in memory.
///
/// Useful for synthetic sequences and for callers that decode a recording
/// themselves. `reported_frame_count` lets a test pretend the capture is
/// longer than the frames actually present.
#[derive(Clone, Debug)]
pub struct MemorySource {
    frames: Vec<RgbFrame>,
    fps: f64,
    position: u64,
    reported_frame_count: Option<u64>,
    frames_read: usize,
    released: usize,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbFrame>, fps: f64) -> Self {
        Self {
            frames,
            fps,
            position: 0,
            reported_frame_count: None,
            frames_read: 0,
            released: 0,
        }
    }

    /// Override the frame count reported to the sampler.
    pub fn with_reported_frame_count(mut self, count: u64) -> Self {
        self.reported_frame_count = Some(count);
        self
    }

    /// Number of frames actually decoded so far.
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// How many times `release` was called.
    pub fn release_count(&self) -> usize {
        self.released
    }
}

impl CaptureSource for MemorySource {
    fn frame_count(&self) -> u64 {
        self.reported_frame_count
            .unwrap_or(self.frames.len() as u64)
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, position: u64) {
        self.position = position;
    }

    fn read_frame(&mut self) -> Option<RgbFrame> {
        let frame = self.frames.get(usize::try_from(self.position).ok()?)?.clone();
        self.position += 1;
        self.frames_read += 1;
        Some(frame)
    }

    fn release(&mut self) {
        self.released += 1;
    }
}
