use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graylabel_core::{PixelCoord, RgbFrame};
use graylabel_detect::{detect_pixels, score_pixels, DetectParams, ScoreParams};

/// Dark frame with a grid of small red lights, roughly what a darkened
/// capture of an LED strip looks like.
fn led_grid(width: usize, height: usize, spacing: usize) -> RgbFrame {
    RgbFrame::from_fn(width, height, |x, y| {
        let (dx, dy) = (x % spacing, y % spacing);
        if dx < 4 && dy < 4 && x >= spacing && y >= spacing {
            [250, 30, 20]
        } else {
            [8, 8, 10]
        }
    })
}

fn bench_detect(c: &mut Criterion) {
    let params = DetectParams::default();
    for (w, h) in [(320usize, 240usize), (1280, 720)] {
        let frame = led_grid(w, h, 32);
        c.bench_function(&format!("detect_pixels_{w}x{h}"), |b| {
            b.iter(|| detect_pixels(black_box(&frame), black_box(&params)))
        });
    }
}

fn bench_score(c: &mut Criterion) {
    let frame = led_grid(1280, 720, 32);
    let candidates: Vec<PixelCoord> = (1..40)
        .flat_map(|gx| (1..22).map(move |gy| PixelCoord::new(gx * 32 + 2, gy * 32 + 2)))
        .collect();
    let params = ScoreParams::default();
    c.bench_function("score_pixels_1280x720", |b| {
        b.iter(|| {
            score_pixels(
                black_box(&frame),
                black_box(500),
                black_box(&candidates),
                black_box(&params),
            )
        })
    });
}

criterion_group!(benches, bench_detect, bench_score);
criterion_main!(benches);
