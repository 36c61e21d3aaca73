//! Core types and utilities for Gray-code LED pixel mapping.
//!
//! This crate holds everything the pipeline stages share: frame containers
//! in the three color encodings the pipeline works with (RGB for capture and
//! codec, 8-bit HSV for the heuristics, luma for the detector), integer pixel
//! coordinates, ring sampling, the Gray-code arithmetic and the tone curve
//! used to suppress ambient reflections before detection.
//!
//! It does *not* depend on any concrete image or video library.

mod coord;
mod gray;
mod image;
mod logger;
mod ring;
mod tone;

pub use coord::PixelCoord;
pub use gray::{
    gray_from_bits, gray_to_index, index_to_gray, pattern_bit, pattern_schedule, required_frames,
};
pub use image::{rgb_to_hsv, rgb_to_luma, GrayImage, GrayImageView, Hsv, HsvFrame, RgbFrame};
pub use ring::{RingSampler, RingSpec};
pub use tone::{adjust_tone, tone_lut, ToneParams};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{filter_directives, init_with_level, level_from_verbosity};
