use std::io;

use graylabel_capture::SampleError;
use graylabel_decode::DecodeError;
use uuid::Uuid;

use crate::Strategy;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the frame codec.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("cannot encode an empty frame")]
    EmptyFrame,

    #[error("frame buffer length mismatch (expected {expected} bytes, got {got})")]
    BufferSize { expected: usize, got: usize },

    #[error("failed to encode frame")]
    Encode(#[source] BoxError),

    #[error("failed to decode frame")]
    Decode(#[source] BoxError),
}

/// Errors raised by job record stores.
#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading or writing configuration files.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors returned by the mapping service.
#[derive(thiserror::Error, Debug)]
pub enum MappingError {
    #[error("mapping job {0} not found")]
    JobNotFound(Uuid),

    #[error("job uses the {0} strategy, which this service cannot run")]
    StrategyUnapplicable(Strategy),

    #[error("job is not initialized: {path} is missing")]
    NotInitialized { path: String },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("not enough pixel targets detected (found {found}, need {required})")]
    NoPixelTargets { found: usize, required: usize },

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Storage(#[from] io::Error),

    #[error(transparent)]
    Record(#[from] RepositoryError),
}
