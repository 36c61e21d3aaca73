use graylabel_core::{Hsv, RingSpec};
use serde::{Deserialize, Serialize};

/// Parameters of the corner-strength detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectParams {
    /// Maximum number of points returned.
    pub max_candidates: usize,
    /// Minimal accepted response relative to the strongest one (0..1).
    pub quality_level: f32,
    /// Minimal Euclidean distance in pixels between two returned points.
    pub min_distance: f32,
    /// Side of the window the gradient structure tensor is summed over.
    pub block_size: usize,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            max_candidates: 100,
            quality_level: 0.02,
            min_distance: 14.0,
            block_size: 3,
        }
    }
}

/// Hue acceptance band in 8-bit hue units (`0..180`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HueWindow {
    /// Accept hues strictly below `low` or strictly above `high`; this is
    /// the wrap-around band red lives in.
    Outside { low: u8, high: u8 },
    /// Accept hues in `low..=high`.
    Inside { low: u8, high: u8 },
}

impl HueWindow {
    #[inline]
    pub fn contains(&self, hue: u8) -> bool {
        match *self {
            HueWindow::Outside { low, high } => hue < low || hue > high,
            HueWindow::Inside { low, high } => (low..=high).contains(&hue),
        }
    }
}

/// Color predicate deciding whether one ring sample looks like a lit LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPredicate {
    pub hue: HueWindow,
    /// Value must be strictly greater than this.
    pub min_value: u8,
    /// Saturation must be strictly greater than this.
    pub min_saturation: u8,
}

impl SignalPredicate {
    /// Saturated, bright red.
    pub const fn red() -> Self {
        Self {
            hue: HueWindow::Outside { low: 10, high: 170 },
            min_value: 150,
            min_saturation: 100,
        }
    }

    #[inline]
    pub fn matches(&self, sample: Hsv) -> bool {
        self.hue.contains(sample.h) && sample.v > self.min_value && sample.s > self.min_saturation
    }
}

impl Default for SignalPredicate {
    fn default() -> Self {
        Self::red()
    }
}

/// Parameters of the ring scorer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreParams {
    /// Ring sampled around every candidate.
    pub ring: RingSpec,
    /// Predicate for the color part of the score.
    pub signal: SignalPredicate,
    /// Weight of the fraction of ring samples accepted by the predicate.
    pub signal_weight: f32,
    /// Weight of the mean ring value normalized to `0..1`.
    pub brightness_weight: f32,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            ring: RingSpec::new(3, 9, 30),
            signal: SignalPredicate::red(),
            signal_weight: 0.7,
            brightness_weight: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_window_wraps_around() {
        let red = SignalPredicate::red();
        let sample = |h| Hsv { h, s: 255, v: 255 };
        assert!(red.matches(sample(0)));
        assert!(red.matches(sample(9)));
        assert!(red.matches(sample(175)));
        assert!(!red.matches(sample(10)));
        assert!(!red.matches(sample(60)));
        assert!(!red.matches(sample(170)));
    }

    #[test]
    fn thresholds_are_strict() {
        let red = SignalPredicate::red();
        assert!(!red.matches(Hsv { h: 0, s: 255, v: 150 }));
        assert!(!red.matches(Hsv { h: 0, s: 100, v: 255 }));
        assert!(red.matches(Hsv { h: 0, s: 101, v: 151 }));
    }

    #[test]
    fn inside_window_for_other_colors() {
        let green = HueWindow::Inside { low: 50, high: 70 };
        assert!(green.contains(60));
        assert!(green.contains(50));
        assert!(!green.contains(0));
    }

    #[test]
    fn params_fill_missing_fields_from_defaults() {
        let params: ScoreParams =
            serde_json::from_str(r#"{"signal_weight": 1.0}"#).expect("parse");
        assert_eq!(params.signal_weight, 1.0);
        assert_eq!(params.ring, ScoreParams::default().ring);

        let signal: SignalPredicate = serde_json::from_str(
            r#"{"hue": {"mode": "inside", "low": 100, "high": 130}, "min_value": 100, "min_saturation": 80}"#,
        )
        .expect("parse");
        assert_eq!(signal.hue, HueWindow::Inside { low: 100, high: 130 });
    }
}
