//! Ring sampling around a pixel.
//!
//! Local brightness around a light pixel is estimated from samples taken at
//! fixed angular steps over a range of radii, which averages out single
//! pixel noise and small misplacements of the detected point.

use crate::{Hsv, HsvFrame, PixelCoord};
use serde::{Deserialize, Serialize};

/// Ring geometry: radii `radius_min..radius_max` (half-open) sampled every
/// `step_angle_deg` degrees starting at 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSpec {
    pub radius_min: u32,
    pub radius_max: u32,
    pub step_angle_deg: u32,
}

impl RingSpec {
    pub const fn new(radius_min: u32, radius_max: u32, step_angle_deg: u32) -> Self {
        Self {
            radius_min,
            radius_max,
            step_angle_deg,
        }
    }
}

/// Precomputed ring offsets, reusable across points and frames.
#[derive(Clone, Debug)]
pub struct RingSampler {
    offsets: Vec<(f64, f64)>,
}

impl RingSampler {
    pub fn new(spec: &RingSpec) -> Self {
        let mut offsets = Vec::new();
        if spec.step_angle_deg > 0 {
            for radius in spec.radius_min..spec.radius_max {
                let r = radius as f64;
                for angle_deg in (0..360).step_by(spec.step_angle_deg as usize) {
                    let (sin_t, cos_t) = (angle_deg as f64).to_radians().sin_cos();
                    offsets.push((r * cos_t, r * sin_t));
                }
            }
        }
        Self { offsets }
    }

    /// Number of sample positions per point, before bounds filtering.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// In-bounds samples around `center`. Positions are truncated toward zero.
    pub fn samples(&self, frame: &HsvFrame, center: PixelCoord) -> Vec<Hsv> {
        let (cx, cy) = (center.x as f64, center.y as f64);
        self.offsets
            .iter()
            .filter_map(|&(dx, dy)| frame.get((cx + dx) as i64, (cy + dy) as i64))
            .collect()
    }

    /// Mean value channel over the ring; `0.0` when no sample is in bounds.
    pub fn mean_value(&self, frame: &HsvFrame, center: PixelCoord) -> f32 {
        let samples = self.samples(frame, center);
        if samples.is_empty() {
            return 0.0;
        }
        let sum: u32 = samples.iter().map(|s| s.v as u32).sum();
        sum as f32 / samples.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RgbFrame;
    use approx::assert_relative_eq;

    #[test]
    fn offsets_cover_radii_and_angles() {
        let sampler = RingSampler::new(&RingSpec::new(2, 5, 30));
        assert_eq!(sampler.len(), 3 * 12);
        assert!(RingSampler::new(&RingSpec::new(2, 5, 0)).is_empty());
        assert!(RingSampler::new(&RingSpec::new(5, 5, 30)).is_empty());
    }

    #[test]
    fn skips_out_of_bounds_samples() {
        let frame = RgbFrame::filled(10, 10, [255, 255, 255]).to_hsv();
        let sampler = RingSampler::new(&RingSpec::new(1, 4, 30));
        let inside = sampler.samples(&frame, PixelCoord::new(5, 5));
        let corner = sampler.samples(&frame, PixelCoord::new(0, 0));
        assert_eq!(inside.len(), sampler.len());
        assert!(corner.len() < inside.len());
        assert!(!corner.is_empty());
    }

    #[test]
    fn mean_value_is_zero_without_samples() {
        let frame = RgbFrame::filled(4, 4, [200, 200, 200]).to_hsv();
        let sampler = RingSampler::new(&RingSpec::new(20, 22, 30));
        assert_eq!(sampler.mean_value(&frame, PixelCoord::new(1, 1)), 0.0);
    }

    #[test]
    fn mean_value_of_half_lit_ring() {
        let frame = RgbFrame::from_fn(21, 21, |x, _| if x > 10 { [255, 255, 255] } else { [0, 0, 0] })
            .to_hsv();
        let sampler = RingSampler::new(&RingSpec::new(3, 4, 90));
        // Angles 0, 90, 180, 270: only the 0 degree sample lands right of center.
        let mean = sampler.mean_value(&frame, PixelCoord::new(10, 10));
        assert_relative_eq!(mean, 255.0 / 4.0);
    }
}
