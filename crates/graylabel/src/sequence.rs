use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use graylabel_capture::CaptureSource;
use graylabel_core::RgbFrame;
use log::{debug, warn};

use crate::codec::from_rgb_image;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Capture source over a directory of still images, one per video frame.
///
/// Files are ordered by name and decoded only when read, so seeking over
/// frames the sampler skips costs nothing. A file that fails to decode ends
/// the capture.
#[derive(Clone, Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    fps: f64,
    position: u64,
}

impl ImageSequenceSource {
    /// Collect the image files in `dir`.
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> io::Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!(
            "image sequence {}: {} frames at {fps} fps",
            dir.as_ref().display(),
            paths.len()
        );
        Ok(Self::from_paths(paths, fps))
    }

    /// Use the given files in the given order.
    pub fn from_paths(paths: Vec<PathBuf>, fps: f64) -> Self {
        Self {
            paths,
            fps,
            position: 0,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl CaptureSource for ImageSequenceSource {
    fn is_opened(&self) -> bool {
        !self.paths.is_empty() && self.fps.is_finite() && self.fps > 0.0
    }

    fn frame_count(&self) -> u64 {
        self.paths.len() as u64
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, position: u64) {
        self.position = position;
    }

    fn read_frame(&mut self) -> Option<RgbFrame> {
        let path = self.paths.get(usize::try_from(self.position).ok()?)?;
        let frame = image::open(path)
            .map_err(|e| e.to_string())
            .and_then(|img| from_rgb_image(img.to_rgb8()).map_err(|e| e.to_string()));
        match frame {
            Ok(frame) => {
                self.position += 1;
                Some(frame)
            }
            Err(e) => {
                warn!("cannot read {}: {e}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_frame;
    use crate::FrameFormat;

    #[test]
    fn reads_files_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, value) in [("b.png", 20u8), ("a.png", 10), ("c.png", 30)] {
            let bytes =
                encode_frame(&RgbFrame::filled(4, 4, [value, 0, 0]), FrameFormat::Png).expect("encode");
            fs::write(dir.path().join(name), bytes).expect("write");
        }
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut source = ImageSequenceSource::open(dir.path(), 25.0).expect("open");
        assert!(source.is_opened());
        assert_eq!(source.frame_count(), 3);

        source.seek(1);
        assert_eq!(source.read_frame().map(|f| f.pixel(0, 0)[0]), Some(20));
        assert_eq!(source.position(), 2);
        assert_eq!(source.read_frame().map(|f| f.pixel(0, 0)[0]), Some(30));
        assert!(source.read_frame().is_none());
    }

    #[test]
    fn empty_directory_is_not_opened() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = ImageSequenceSource::open(dir.path(), 30.0).expect("open");
        assert!(!source.is_opened());
    }

    #[test]
    fn broken_file_ends_capture() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("0.png"), b"not a png").expect("write");
        let mut source = ImageSequenceSource::open(dir.path(), 30.0).expect("open");
        assert!(source.read_frame().is_none());
    }
}
