use crate::DetectParams;
use graylabel_core::{GrayImageView, PixelCoord, RgbFrame};
use kiddo::{KdTree, SquaredEuclidean};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Detected point with its corner response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelCandidate {
    pub coord: PixelCoord,
    pub response: f32,
}

/// Detect candidate light pixels on a color frame.
///
/// Returns at most `params.max_candidates` points ordered by decreasing
/// corner response. An empty vector is a valid result.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frame, params), fields(width = frame.width(), height = frame.height()))
)]
pub fn detect_pixels(frame: &RgbFrame, params: &DetectParams) -> Vec<PixelCoord> {
    detect_candidates(frame, params)
        .into_iter()
        .map(|c| c.coord)
        .collect()
}

/// Same as [`detect_pixels`] but keeps the responses.
pub fn detect_candidates(frame: &RgbFrame, params: &DetectParams) -> Vec<PixelCandidate> {
    let gray = frame.to_gray();
    detect_in_gray(&gray.view(), params)
}

/// Good-features-to-track style detection on a luma image.
///
/// 1. minimum eigenvalue of the gradient structure tensor per pixel,
/// 2. 3x3 local maxima above `quality_level * max_response`
///    (the one-pixel border is never reported),
/// 3. greedy selection by decreasing response, rejecting points closer
///    than `min_distance` to an already selected one.
pub fn detect_in_gray(img: &GrayImageView<'_>, params: &DetectParams) -> Vec<PixelCandidate> {
    if img.width < 3 || img.height < 3 || params.max_candidates == 0 {
        return Vec::new();
    }

    let response = min_eigen_response(img, params.block_size);
    let max_response = response.iter().copied().fold(0.0f32, f32::max);
    if max_response <= 0.0 {
        return Vec::new();
    }
    let threshold = max_response * params.quality_level.max(0.0);

    let mut candidates = local_maxima(&response, img.width, img.height, threshold);
    candidates.sort_by(|a, b| b.response.total_cmp(&a.response));

    let selected = select_spaced(candidates, params.min_distance, params.max_candidates);
    debug!(
        "detected {} candidates (max response {:.3e}, threshold {:.3e})",
        selected.len(),
        max_response,
        threshold
    );
    selected
}

/// Per-pixel minimum eigenvalue of the structure tensor built from 3x3
/// Sobel gradients summed over a `block_size` x `block_size` window.
///
/// Borders are handled by replicating edge pixels.
pub fn min_eigen_response(img: &GrayImageView<'_>, block_size: usize) -> Vec<f32> {
    let (w, h) = (img.width, img.height);
    let n = w * h;
    let mut gxx = vec![0.0f32; n];
    let mut gxy = vec![0.0f32; n];
    let mut gyy = vec![0.0f32; n];

    // Normalizes the Sobel kernel gain so responses stay in a sane range.
    const GRAD_SCALE: f32 = 1.0 / (4.0 * 255.0);

    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let p = |dx: i64, dy: i64| img.get_clamped(x + dx, y + dy) as f32;
            let dx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let dy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            let (dx, dy) = (dx * GRAD_SCALE, dy * GRAD_SCALE);
            let i = y as usize * w + x as usize;
            gxx[i] = dx * dx;
            gxy[i] = dx * dy;
            gyy[i] = dy * dy;
        }
    }

    let block = block_size.max(1);
    let a = box_sum(&gxx, w, h, block);
    let b = box_sum(&gxy, w, h, block);
    let c = box_sum(&gyy, w, h, block);

    a.iter()
        .zip(&b)
        .zip(&c)
        .map(|((&a, &b), &c)| {
            let half_trace = 0.5 * (a + c);
            let half_diff = 0.5 * (a - c);
            (half_trace - (half_diff * half_diff + b * b).sqrt()).max(0.0)
        })
        .collect()
}

/// Separable box sum over a `block` x `block` window with replicated borders.
fn box_sum(src: &[f32], w: usize, h: usize, block: usize) -> Vec<f32> {
    let lo = -((block / 2) as i64);
    let hi = lo + block as i64 - 1;

    let mut tmp = vec![0.0f32; src.len()];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w as i64 {
            tmp[y * w + x as usize] = (lo..=hi)
                .map(|k| row[(x + k).clamp(0, w as i64 - 1) as usize])
                .sum();
        }
    }

    let mut out = vec![0.0f32; src.len()];
    for y in 0..h as i64 {
        for x in 0..w {
            out[y as usize * w + x] = (lo..=hi)
                .map(|k| tmp[(y + k).clamp(0, h as i64 - 1) as usize * w + x])
                .sum();
        }
    }
    out
}

/// Interior pixels above `threshold` that equal the maximum of their 3x3
/// neighbourhood, in raster order.
fn local_maxima(response: &[f32], w: usize, h: usize, threshold: f32) -> Vec<PixelCandidate> {
    let mut out = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let v = response[y * w + x];
            if v <= threshold {
                continue;
            }
            let is_max = (y - 1..=y + 1)
                .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (nx, ny)))
                .all(|(nx, ny)| response[ny * w + nx] <= v);
            if is_max {
                out.push(PixelCandidate {
                    coord: PixelCoord::new(x as u32, y as u32),
                    response: v,
                });
            }
        }
    }
    out
}

/// Greedy minimum-distance filter over candidates sorted by decreasing
/// response.
///
/// Kept points go into a k-d tree stored in a frame rotated by one radian:
/// a bucket cannot split on a repeated axis value, and after the rotation no
/// two integer pixels share one. Tree hits only shortlist neighbours; the
/// decision uses the exact integer squared distance.
fn select_spaced(
    sorted: Vec<PixelCandidate>,
    min_distance: f32,
    max_candidates: usize,
) -> Vec<PixelCandidate> {
    if min_distance < 1.0 {
        return sorted.into_iter().take(max_candidates).collect();
    }

    let min_d2 = f64::from(min_distance) * f64::from(min_distance);
    // Rotation error stays far below one squared pixel.
    let query_d2 = min_d2 + 1.0;
    let (sin, cos) = 1.0f64.sin_cos();
    let rotate = |c: PixelCoord| {
        let (x, y) = (f64::from(c.x), f64::from(c.y));
        [x * cos - y * sin, x * sin + y * cos]
    };

    let mut tree: KdTree<f64, 2> = KdTree::new();
    let mut selected: Vec<PixelCandidate> = Vec::with_capacity(max_candidates.min(sorted.len()));
    for cand in sorted {
        if selected.len() >= max_candidates {
            break;
        }
        let point = rotate(cand.coord);
        let too_close = tree
            .within_unsorted::<SquaredEuclidean>(&point, query_d2)
            .into_iter()
            .any(|nn| {
                let kept = selected[nn.item as usize].coord;
                (kept.distance_sq(&cand.coord) as f64) < min_d2
            });
        if too_close {
            continue;
        }

        tree.add(&point, selected.len() as u64);
        selected.push(cand);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use graylabel_core::GrayImage;

    fn gray_with_squares(w: usize, h: usize, squares: &[(usize, usize, usize)]) -> GrayImage {
        let mut data = vec![0u8; w * h];
        for &(x0, y0, side) in squares {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    data[y * w + x] = 255;
                }
            }
        }
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn flat_image_has_no_candidates() {
        let img = GrayImage {
            width: 32,
            height: 32,
            data: vec![90; 32 * 32],
        };
        assert!(detect_in_gray(&img.view(), &DetectParams::default()).is_empty());
    }

    #[test]
    fn tiny_image_has_no_candidates() {
        let img = GrayImage {
            width: 2,
            height: 2,
            data: vec![0, 255, 255, 0],
        };
        assert!(detect_in_gray(&img.view(), &DetectParams::default()).is_empty());
    }

    #[test]
    fn one_point_per_small_square() {
        let img = gray_with_squares(80, 80, &[(16, 16, 9), (56, 16, 9), (16, 56, 9), (56, 56, 9)]);
        let found = detect_in_gray(&img.view(), &DetectParams::default());
        assert_eq!(found.len(), 4, "{found:?}");

        let centers = [(20, 20), (60, 20), (20, 60), (60, 60)];
        for (cx, cy) in centers {
            let center = PixelCoord::new(cx, cy);
            let near = found
                .iter()
                .filter(|c| c.coord.distance(&center) < 9.0)
                .count();
            assert_eq!(near, 1, "square at {center}");
        }
    }

    #[test]
    fn respects_max_candidates() {
        let img = gray_with_squares(80, 80, &[(16, 16, 9), (56, 16, 9), (16, 56, 9), (56, 56, 9)]);
        let params = DetectParams {
            max_candidates: 2,
            ..DetectParams::default()
        };
        assert_eq!(detect_in_gray(&img.view(), &params).len(), 2);
    }

    #[test]
    fn responses_are_sorted_descending() {
        let img = gray_with_squares(64, 64, &[(10, 10, 5), (40, 12, 12), (20, 40, 3)]);
        let params = DetectParams {
            min_distance: 2.0,
            ..DetectParams::default()
        };
        let found = detect_in_gray(&img.view(), &params);
        assert!(!found.is_empty());
        assert!(found.windows(2).all(|w| w[0].response >= w[1].response));
    }

    #[test]
    fn kept_points_respect_min_distance() {
        // Checkerboard-like clutter produces many corners close to each other.
        let w = 96;
        let h = 96;
        let data = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if ((x / 6) + (y / 6)) % 2 == 0 {
                    230
                } else {
                    20
                }
            })
            .collect();
        let img = GrayImage {
            width: w,
            height: h,
            data,
        };
        for min_distance in [5.0f32, 10.0, 14.0, 21.5] {
            let params = DetectParams {
                max_candidates: 1000,
                quality_level: 0.01,
                min_distance,
                block_size: 3,
            };
            let found = detect_in_gray(&img.view(), &params);
            assert!(!found.is_empty());
            for (i, a) in found.iter().enumerate() {
                for b in &found[i + 1..] {
                    assert!(
                        a.coord.distance(&b.coord) >= min_distance,
                        "{} and {} closer than {min_distance}",
                        a.coord,
                        b.coord
                    );
                }
            }
        }
    }

    fn candidate(x: u32, y: u32, response: f32) -> PixelCandidate {
        PixelCandidate {
            coord: PixelCoord::new(x, y),
            response,
        }
    }

    #[test]
    fn spacing_handles_long_straight_strips() {
        // A column, a row and a diagonal of LEDs one pixel apart: far more
        // points on one axis value than a tree bucket holds.
        let mut cands: Vec<PixelCandidate> = (0..600).map(|y| candidate(40, y, 1.0)).collect();
        cands.extend((0..600).filter(|&x| x != 40).map(|x| candidate(x, 700, 0.9)));
        cands.extend((0..300).map(|i| candidate(100 + i, 100 + i, 0.8)));

        let kept = select_spaced(cands.clone(), 1.0, usize::MAX);
        assert_eq!(kept.len(), cands.len());

        let kept = select_spaced(cands, 2.0, usize::MAX);
        // Every other pixel of the column and the row; the diagonal is
        // already sqrt(2) apart, so again every other point.
        assert_eq!(kept.len(), 300 + 300 + 150);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(a.coord.distance_sq(&b.coord) >= 4, "{} {}", a.coord, b.coord);
            }
        }
    }

    #[test]
    fn spacing_keeps_points_exactly_at_min_distance() {
        let cands = vec![
            candidate(10, 10, 3.0),
            candidate(24, 10, 2.0),
            candidate(10, 23, 1.0),
        ];
        let kept = select_spaced(cands, 14.0, usize::MAX);
        let coords: Vec<PixelCoord> = kept.iter().map(|c| c.coord).collect();
        assert_eq!(coords, vec![PixelCoord::new(10, 10), PixelCoord::new(24, 10)]);
    }

    #[test]
    fn zero_min_distance_keeps_all_local_maxima() {
        let img = gray_with_squares(40, 40, &[(10, 10, 9)]);
        let spaced = detect_in_gray(&img.view(), &DetectParams::default());
        let dense = detect_in_gray(
            &img.view(),
            &DetectParams {
                min_distance: 0.0,
                ..DetectParams::default()
            },
        );
        assert_eq!(spaced.len(), 1);
        assert!(dense.len() >= 4);
    }

    #[test]
    fn detect_pixels_works_on_color_frames() {
        let frame = RgbFrame::from_fn(48, 48, |x, y| {
            if (20..28).contains(&x) && (20..28).contains(&y) {
                [255, 0, 0]
            } else {
                [0, 0, 0]
            }
        });
        let found = detect_pixels(&frame, &DetectParams::default());
        assert_eq!(found.len(), 1);
        assert!(found[0].distance(&PixelCoord::new(24, 24)) < 8.0);
    }
}
