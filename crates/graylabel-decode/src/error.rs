/// Errors returned by the label reader.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("total pixel count must be at least 1")]
    InvalidPixelCount,

    #[error("expected {expected} frames (reference + bit-planes), got {got}")]
    FrameCountMismatch { expected: usize, got: usize },

    #[error("failed to decode labels: {got} distinct indices for {expected} pixels")]
    LabelCardinality { expected: usize, got: usize },
}
