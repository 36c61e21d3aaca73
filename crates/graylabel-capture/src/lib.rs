//! Capture sources and the pattern frame sampler.
//!
//! A capture source is any sequential frame reader with a known frame count
//! and frame rate (a video decoder, a camera recording, an image sequence).
//! The sampler walks it once and yields the reference frame followed by one
//! frame per Gray-code bit-plane, skipping over the frames in between.

mod error;
mod sampler;
mod source;

pub use error::SampleError;
pub use sampler::{FrameSampler, SampledFrame};
pub use source::{CaptureSource, MemorySource};

pub use graylabel_core::required_frames;
