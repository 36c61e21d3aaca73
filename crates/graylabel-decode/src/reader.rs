use graylabel_core::{
    gray_from_bits, gray_to_index, required_frames, HsvFrame, PixelCoord, RgbFrame, RingSampler,
};
use log::{debug, info};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{DecodeError, LabelMap, LabelParams};

/// Decode the index broadcast at every coordinate.
///
/// `frames[0]` is the reference frame with all pixels lit, `frames[1..]` are
/// the bit-planes in broadcast order. Coordinates are processed in input
/// order, so on a duplicate index the later coordinate wins.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frames, coords, params), fields(frames = frames.len(), coords = coords.len()))
)]
pub fn read_labels(
    frames: &[RgbFrame],
    total_pixels: usize,
    coords: &[PixelCoord],
    params: &LabelParams,
) -> Result<LabelMap, DecodeError> {
    let bits = read_bits(frames, total_pixels, coords, params)?;

    let map: LabelMap = coords
        .iter()
        .zip(&bits)
        .map(|(&coord, bits)| {
            // Bits arrive least significant first.
            let gray = gray_from_bits(bits.iter().rev().copied());
            (gray_to_index(gray), coord)
        })
        .collect();

    info!(
        "decoded {} distinct labels from {} positions ({} collisions)",
        map.len(),
        coords.len(),
        map.collisions().len()
    );
    Ok(map)
}

/// Raw on/off readings, one vector per coordinate in frame order
/// (bit-plane 1 first).
pub fn read_bits(
    frames: &[RgbFrame],
    total_pixels: usize,
    coords: &[PixelCoord],
    params: &LabelParams,
) -> Result<Vec<Vec<bool>>, DecodeError> {
    if total_pixels == 0 {
        return Err(DecodeError::InvalidPixelCount);
    }
    let expected = required_frames(total_pixels) + 1;
    if frames.len() != expected {
        return Err(DecodeError::FrameCountMismatch {
            expected,
            got: frames.len(),
        });
    }

    let hsv = to_hsv_all(frames);
    let ring = RingSampler::new(&params.ring);
    let margin = params.on_threshold_margin;

    let read_one = |&coord: &PixelCoord| {
        let reference = ring.mean_value(&hsv[0], coord);
        let threshold = reference - margin;
        let bits: Vec<bool> = hsv[1..]
            .iter()
            .map(|frame| ring.mean_value(frame, coord) >= threshold)
            .collect();
        debug!("{coord}: reference {reference:.1}, bits {bits:?}");
        bits
    };

    #[cfg(feature = "rayon")]
    let bits = coords.par_iter().map(read_one).collect();
    #[cfg(not(feature = "rayon"))]
    let bits = coords.iter().map(read_one).collect();

    Ok(bits)
}

fn to_hsv_all(frames: &[RgbFrame]) -> Vec<HsvFrame> {
    #[cfg(feature = "rayon")]
    {
        frames.par_iter().map(RgbFrame::to_hsv).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        frames.iter().map(RgbFrame::to_hsv).collect()
    }
}
