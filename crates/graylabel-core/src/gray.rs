//! Reflected binary (Gray) code arithmetic.
//!
//! Every light pixel broadcasts the Gray code of its sequential index, one
//! bit per pattern frame. Frame `j` (1-based) carries bit `j - 1`, so the
//! last pattern frame carries the most significant bit. Frame `0` is the
//! reference frame in which every pixel is lit.

/// Number of pattern frames needed to give `total_pixels` pixels a unique
/// code: `ceil(log2(total_pixels))`.
///
/// A single pixel needs no pattern frames at all.
pub fn required_frames(total_pixels: usize) -> usize {
    if total_pixels <= 1 {
        return 0;
    }
    (usize::BITS - (total_pixels - 1).leading_zeros()) as usize
}

/// Encode a sequential index as Gray code.
#[inline]
pub fn index_to_gray(index: u64) -> u64 {
    index ^ (index >> 1)
}

/// Decode a Gray code back to the sequential index.
///
/// Each bit is XOR-ed with all the higher bits of the code, starting from
/// the second most significant one.
pub fn gray_to_index(gray: u64) -> u64 {
    let mut decoded = gray;
    let mut shift = 1u32;
    while let Some(higher) = gray.checked_shr(shift).filter(|v| *v != 0) {
        decoded ^= higher;
        shift += 1;
    }
    decoded
}

/// Pack bits, most significant first, into a Gray code value.
pub fn gray_from_bits<I>(bits: I) -> u64
where
    I: IntoIterator<Item = bool>,
{
    bits.into_iter()
        .fold(0u64, |value, bit| (value << 1) | u64::from(bit))
}

/// Whether the pixel with `index` is lit in pattern frame `frame`.
pub fn pattern_bit(index: u64, frame: usize) -> bool {
    if frame == 0 {
        return true;
    }
    let shift = (frame - 1) as u32;
    index_to_gray(index)
        .checked_shr(shift)
        .is_some_and(|v| v & 1 == 1)
}

/// On/off schedule for every frame of the sequence.
///
/// `schedule[frame][pixel]` is `true` when `pixel` must be lit while frame
/// `frame` is held. The outer vector has `required_frames + 1` entries.
pub fn pattern_schedule(total_pixels: usize) -> Vec<Vec<bool>> {
    (0..=required_frames(total_pixels))
        .map(|frame| {
            (0..total_pixels as u64)
                .map(|index| pattern_bit(index, frame))
                .collect()
        })
        .collect()
}
