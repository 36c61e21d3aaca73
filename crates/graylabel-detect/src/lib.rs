//! Candidate light-pixel detection and scoring.
//!
//! Detection looks for corner-like points (strong gradients in two
//! directions) on the luma image: a small bright LED on a dark background
//! is exactly such a point. Scoring then re-ranks the candidates on the
//! original color frame by how much of a ring around each point looks like
//! a lit LED, so reflections and other high-contrast clutter fall behind the
//! real light pixels.

mod detector;
mod params;
mod scorer;

pub use detector::{detect_candidates, detect_in_gray, detect_pixels, min_eigen_response, PixelCandidate};
pub use params::{DetectParams, HueWindow, ScoreParams, SignalPredicate};
pub use scorer::{
    score_candidates, score_candidates_with, score_pixels, score_pixels_with, ScoredCandidate,
    SignalClassifier,
};
