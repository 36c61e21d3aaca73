//! Frame encoding for storage between the mapping phases.

use graylabel_core::RgbFrame;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};

use crate::{CodecError, FrameFormat};

/// Encode a frame into an in-memory image file.
pub fn encode_frame(frame: &RgbFrame, format: FrameFormat) -> Result<Vec<u8>, CodecError> {
    let img = to_rgb_image(frame)?;
    let mut buf = Vec::new();
    match format {
        FrameFormat::Jpeg { quality } => JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .encode_image(&img)
            .map_err(|e| CodecError::Encode(e.into()))?,
        FrameFormat::Png => PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
            .map_err(|e| CodecError::Encode(e.into()))?,
    }
    Ok(buf)
}

/// Decode an image file of the declared format.
pub fn decode_frame(bytes: &[u8], format: FrameFormat) -> Result<RgbFrame, CodecError> {
    let image_format = match format {
        FrameFormat::Jpeg { .. } => ImageFormat::Jpeg,
        FrameFormat::Png => ImageFormat::Png,
    };
    let img = image::load_from_memory_with_format(bytes, image_format)
        .map_err(|e| CodecError::Decode(e.into()))?
        .to_rgb8();
    from_rgb_image(img)
}

/// Copy a frame into an `image` buffer.
pub fn to_rgb_image(frame: &RgbFrame) -> Result<RgbImage, CodecError> {
    if frame.is_empty() {
        return Err(CodecError::EmptyFrame);
    }
    let expected = frame.width() * frame.height() * 3;
    let got = frame.as_raw().len();
    RgbImage::from_raw(frame.width() as u32, frame.height() as u32, frame.as_raw().to_vec())
        .ok_or(CodecError::BufferSize { expected, got })
}

/// Take over an `image` buffer.
pub fn from_rgb_image(img: RgbImage) -> Result<RgbFrame, CodecError> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let raw = img.into_raw();
    let got = raw.len();
    RgbFrame::from_raw(width, height, raw).ok_or(CodecError::BufferSize {
        expected: width * height * 3,
        got,
    })
}
