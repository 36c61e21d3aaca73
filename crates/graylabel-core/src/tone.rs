//! Tone curve used to darken everything except emissive light sources.
//!
//! Reflections of the LEDs on walls and ceilings are bright but low in
//! contrast; pushing shadows and highlights down and raising gamma leaves
//! mostly the LEDs themselves bright, which keeps the corner detector off
//! the reflections.

use crate::RgbFrame;
use serde::{Deserialize, Serialize};

const ADJUSTMENT_SCALE: f64 = 100.0;

/// Tone adjustments, each in `-100..=100`. Values outside the range are
/// clamped when the curve is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParams {
    pub contrast: i32,
    pub highlights: i32,
    pub shadows: i32,
    pub gamma: i32,
}

impl ToneParams {
    /// Preset applied before detection by the mapping service.
    pub const fn darken() -> Self {
        Self {
            contrast: 10,
            highlights: -60,
            shadows: -100,
            gamma: -40,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Evaluate the tone curve for every 8-bit channel value.
///
/// Steps run in a fixed order (contrast, shadows, highlights, gamma) and
/// each one clamps to `[0, 1]` before the next. The result is rounded to the
/// nearest 8-bit value, not truncated.
pub fn tone_lut(params: &ToneParams) -> [u8; 256] {
    let factor = |v: i32| v.clamp(-100, 100) as f64 / ADJUSTMENT_SCALE;
    let c = factor(params.contrast) + 1.0;
    let s = factor(params.shadows);
    let h = factor(params.highlights);
    let g = 1.0 - factor(params.gamma);

    let mut lut = [0u8; 256];
    for (i, out) in lut.iter_mut().enumerate() {
        let mut v = i as f64 / 255.0;
        v = ((v - 0.5) * c + 0.5).clamp(0.0, 1.0);
        v = (v + s * (1.0 - v) * v).clamp(0.0, 1.0);
        v = (v + h * v * (1.0 - v)).clamp(0.0, 1.0);
        v = v.powf(g).clamp(0.0, 1.0);
        *out = (v * 255.0).round() as u8;
    }
    lut
}

/// Apply the tone curve to every channel of `frame`.
pub fn adjust_tone(frame: &RgbFrame, params: &ToneParams) -> RgbFrame {
    let lut = tone_lut(params);
    frame.map_channels(|v| lut[v as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame() -> RgbFrame {
        RgbFrame::from_fn(16, 16, |x, y| {
            let v = (y * 16 + x) as u8;
            [v, v.wrapping_mul(3), 255 - v]
        })
    }

    #[test]
    fn zero_params_are_identity() {
        let frame = gradient_frame();
        let out = adjust_tone(&frame, &ToneParams::default());
        assert_eq!(out, frame);
    }

    #[test]
    fn keeps_dimensions() {
        let frame = RgbFrame::filled(7, 3, [10, 20, 30]);
        let out = adjust_tone(&frame, &ToneParams::darken());
        assert_eq!((out.width(), out.height()), (7, 3));
    }

    #[test]
    fn darken_preserves_extremes_and_darkens_midtones() {
        let lut = tone_lut(&ToneParams::darken());
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        for v in [64usize, 128, 192] {
            assert!(lut[v] < v as u8, "value {v} -> {}", lut[v]);
        }
    }

    #[test]
    fn curve_is_monotonic() {
        let lut = tone_lut(&ToneParams::darken());
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn full_contrast_saturates() {
        let lut = tone_lut(&ToneParams {
            contrast: 100,
            ..ToneParams::default()
        });
        assert_eq!(lut[20], 0);
        assert_eq!(lut[240], 255);
    }

    #[test]
    fn out_of_range_params_are_clamped() {
        let clamped = tone_lut(&ToneParams {
            shadows: -500,
            ..ToneParams::default()
        });
        let bounded = tone_lut(&ToneParams {
            shadows: -100,
            ..ToneParams::default()
        });
        assert_eq!(clamped, bounded);
    }

    #[test]
    fn output_is_rounded_to_nearest() {
        // (101 / 255 - 0.5) * 1.5 + 0.5 lands on 87.75.
        let lut = tone_lut(&ToneParams {
            contrast: 50,
            ..ToneParams::default()
        });
        assert_eq!(lut[101], 88);
    }
}
