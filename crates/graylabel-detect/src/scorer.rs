use crate::ScoreParams;
use graylabel_core::{Hsv, HsvFrame, PixelCoord, RgbFrame, RingSampler};
use log::debug;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Decides whether one ring sample counts as signal.
pub trait SignalClassifier {
    fn is_signal(&self, sample: Hsv) -> bool;
}

impl<F> SignalClassifier for F
where
    F: Fn(Hsv) -> bool,
{
    #[inline]
    fn is_signal(&self, sample: Hsv) -> bool {
        self(sample)
    }
}

impl SignalClassifier for crate::SignalPredicate {
    #[inline]
    fn is_signal(&self, sample: Hsv) -> bool {
        self.matches(sample)
    }
}

/// Candidate together with its score breakdown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub coord: PixelCoord,
    pub score: f32,
    /// Fraction of in-bounds ring samples accepted by the classifier.
    pub signal_fraction: f32,
    /// Mean ring value channel, normalized to `0..1`.
    pub brightness_fraction: f32,
}

/// Score every candidate with the color predicate from `params`.
///
/// Output order matches the input order.
pub fn score_candidates(
    hsv: &HsvFrame,
    candidates: &[PixelCoord],
    params: &ScoreParams,
) -> Vec<ScoredCandidate> {
    score_candidates_with(hsv, candidates, params, &params.signal)
}

/// Score every candidate using a custom classifier.
pub fn score_candidates_with<C>(
    hsv: &HsvFrame,
    candidates: &[PixelCoord],
    params: &ScoreParams,
    classifier: &C,
) -> Vec<ScoredCandidate>
where
    C: SignalClassifier + Sync + ?Sized,
{
    let ring = RingSampler::new(&params.ring);
    let score_one = |&coord: &PixelCoord| score_point(hsv, &ring, coord, params, classifier);

    #[cfg(feature = "rayon")]
    {
        candidates.par_iter().map(score_one).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        candidates.iter().map(score_one).collect()
    }
}

fn score_point<C>(
    hsv: &HsvFrame,
    ring: &RingSampler,
    coord: PixelCoord,
    params: &ScoreParams,
    classifier: &C,
) -> ScoredCandidate
where
    C: SignalClassifier + ?Sized,
{
    let samples = ring.samples(hsv, coord);
    if samples.is_empty() {
        return ScoredCandidate {
            coord,
            score: 0.0,
            signal_fraction: 0.0,
            brightness_fraction: 0.0,
        };
    }

    let n = samples.len() as f32;
    let signal = samples.iter().filter(|s| classifier.is_signal(**s)).count() as f32;
    let value_sum: u32 = samples.iter().map(|s| s.v as u32).sum();

    let signal_fraction = signal / n;
    let brightness_fraction = value_sum as f32 / (n * 255.0);
    ScoredCandidate {
        coord,
        score: signal_fraction * params.signal_weight
            + brightness_fraction * params.brightness_weight,
        signal_fraction,
        brightness_fraction,
    }
}

/// Keep the `max_selected` candidates that look most like lit LEDs.
///
/// Candidates are ranked by decreasing score; ties keep their input order.
/// The result is a subset of `candidates` and never longer than
/// `max_selected`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frame, candidates, params), fields(candidates = candidates.len()))
)]
pub fn score_pixels(
    frame: &RgbFrame,
    max_selected: usize,
    candidates: &[PixelCoord],
    params: &ScoreParams,
) -> Vec<PixelCoord> {
    score_pixels_with(frame, max_selected, candidates, params, &params.signal)
}

/// [`score_pixels`] with a custom classifier.
pub fn score_pixels_with<C>(
    frame: &RgbFrame,
    max_selected: usize,
    candidates: &[PixelCoord],
    params: &ScoreParams,
    classifier: &C,
) -> Vec<PixelCoord>
where
    C: SignalClassifier + Sync + ?Sized,
{
    if candidates.is_empty() || max_selected == 0 {
        return Vec::new();
    }

    let hsv = frame.to_hsv();
    let mut scored = score_candidates_with(&hsv, candidates, params, classifier);
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(max_selected);

    if let (Some(best), Some(worst)) = (scored.first(), scored.last()) {
        debug!(
            "kept {} of {} candidates, scores {:.3}..{:.3}",
            scored.len(),
            candidates.len(),
            worst.score,
            best.score
        );
    }
    scored.into_iter().map(|s| s.coord).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignalPredicate;
    use approx::assert_relative_eq;

    const RED: [u8; 3] = [255, 0, 0];
    const WHITE: [u8; 3] = [255, 255, 255];

    /// Black frame with filled discs of the given colors.
    fn frame_with_discs(w: usize, h: usize, discs: &[(usize, usize, usize, [u8; 3])]) -> RgbFrame {
        RgbFrame::from_fn(w, h, |x, y| {
            for &(cx, cy, r, color) in discs {
                let dx = x as i64 - cx as i64;
                let dy = y as i64 - cy as i64;
                if dx * dx + dy * dy <= (r * r) as i64 {
                    return color;
                }
            }
            [0, 0, 0]
        })
    }

    #[test]
    fn red_disc_scores_full() {
        let frame = frame_with_discs(40, 40, &[(20, 20, 12, RED)]);
        let scored = score_candidates(
            &frame.to_hsv(),
            &[PixelCoord::new(20, 20)],
            &ScoreParams::default(),
        );
        assert_relative_eq!(scored[0].signal_fraction, 1.0);
        assert_relative_eq!(scored[0].brightness_fraction, 1.0);
        assert_relative_eq!(scored[0].score, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn white_disc_only_scores_brightness() {
        let frame = frame_with_discs(40, 40, &[(20, 20, 12, WHITE)]);
        let scored = score_candidates(
            &frame.to_hsv(),
            &[PixelCoord::new(20, 20)],
            &ScoreParams::default(),
        );
        assert_relative_eq!(scored[0].signal_fraction, 0.0);
        assert_relative_eq!(scored[0].score, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn red_beats_white_beats_dark() {
        let frame = frame_with_discs(
            120,
            40,
            &[(20, 20, 12, WHITE), (60, 20, 12, RED)],
        );
        let candidates = [
            PixelCoord::new(100, 20),
            PixelCoord::new(20, 20),
            PixelCoord::new(60, 20),
        ];
        let kept = score_pixels(&frame, 3, &candidates, &ScoreParams::default());
        assert_eq!(
            kept,
            vec![
                PixelCoord::new(60, 20),
                PixelCoord::new(20, 20),
                PixelCoord::new(100, 20)
            ]
        );
    }

    #[test]
    fn result_is_bounded_subset() {
        let frame = frame_with_discs(64, 64, &[(16, 16, 10, RED), (48, 48, 10, RED)]);
        let candidates: Vec<PixelCoord> = (0..10)
            .map(|i| PixelCoord::new(6 * i + 2, 6 * i + 2))
            .collect();
        for max_selected in [0usize, 1, 3, 10, 50] {
            let kept = score_pixels(&frame, max_selected, &candidates, &ScoreParams::default());
            assert_eq!(kept.len(), max_selected.min(candidates.len()));
            assert!(kept.iter().all(|c| candidates.contains(c)));
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let frame = RgbFrame::filled(64, 64, [0, 0, 0]);
        let candidates = [
            PixelCoord::new(30, 30),
            PixelCoord::new(10, 10),
            PixelCoord::new(50, 50),
        ];
        let kept = score_pixels(&frame, 2, &candidates, &ScoreParams::default());
        assert_eq!(kept, candidates[..2].to_vec());
    }

    #[test]
    fn point_with_no_ring_samples_scores_zero() {
        let frame = RgbFrame::filled(4, 4, RED);
        let params = ScoreParams {
            ring: graylabel_core::RingSpec::new(10, 12, 30),
            ..ScoreParams::default()
        };
        let scored = score_candidates(&frame.to_hsv(), &[PixelCoord::new(1, 1)], &params);
        assert_eq!(scored[0].score, 0.0);
    }

    #[test]
    fn custom_classifier_closure() {
        let frame = frame_with_discs(40, 40, &[(20, 20, 12, WHITE)]);
        let bright = |s: Hsv| s.v > 200;
        let scored = score_candidates_with(
            &frame.to_hsv(),
            &[PixelCoord::new(20, 20)],
            &ScoreParams::default(),
            &bright,
        );
        assert_relative_eq!(scored[0].score, 1.0, epsilon = 1e-6);

        let green = SignalPredicate {
            hue: crate::HueWindow::Inside { low: 50, high: 70 },
            min_value: 100,
            min_saturation: 100,
        };
        let kept = score_pixels_with(
            &frame,
            1,
            &[PixelCoord::new(20, 20)],
            &ScoreParams::default(),
            &green,
        );
        assert_eq!(kept.len(), 1);
    }
}
