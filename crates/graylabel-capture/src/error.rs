/// Errors raised while sampling pattern frames from a capture source.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("failed to initialize video capture")]
    CaptureInit,

    #[error("total pixel count must be at least 1")]
    InvalidPixelCount,

    #[error("capture reports an unusable frame rate ({0} fps)")]
    InvalidFrameRate(f64),

    #[error("pattern interval must be a positive number of seconds (got {0})")]
    InvalidInterval(f64),

    #[error(
        "not enough frames to read the pattern (source has {available}, pattern needs {required:.1})"
    )]
    InsufficientFrames { available: u64, required: f64 },

    #[error("unexpected end of video capture while reading frame {index}")]
    UnexpectedEndOfCapture { index: usize },
}
