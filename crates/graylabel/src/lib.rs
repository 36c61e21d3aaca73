//! LED pixel mapping from a camera capture of Gray-code light patterns.
//!
//! Every LED of an installation broadcasts its own sequential index as a
//! Gray code, one bit per pattern frame, while a camera records the scene.
//! From that recording this crate finds where each LED is in the image.
//!
//! This crate provides:
//! - re-exports of the pipeline crates (`core`, `capture`, `detect`, `decode`),
//! - the two-phase [`MappingService`] that keeps frames and job records in
//!   pluggable storage between the phases (feature `image`),
//! - JSON configuration ([`MappingConfig`]),
//! - a capture source over image sequences and the `graylabel` CLI
//!   (features `image` and `cli`).
//!
//! ## Quickstart
//!
//! ```no_run
//! use graylabel::{FsRepository, FsStorage, ImageSequenceSource, MappingConfig, TryOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MappingConfig::default();
//! let service = config.build_service(FsStorage::new("store/data"), FsRepository::new("store/records"));
//!
//! let source = ImageSequenceSource::open("capture/", 30.0)?;
//! let job = service.init(50, source)?;
//! let proposal = service.try_analyze(job.id, &TryOptions::default())?;
//! let mapped = service.continue_analyze(job.id, &proposal.positions)?;
//! println!("LED 0 is at {}", mapped[0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `graylabel::core`: frames, coordinates, Gray-code math, tone curve, logger.
//! - `graylabel::capture`: capture source trait and the pattern frame sampler.
//! - `graylabel::detect`: candidate detection and ring scoring.
//! - `graylabel::decode`: label reading.
//! - `graylabel::codec` (feature `image`): frame encoding for storage.

pub use graylabel_capture as capture;
pub use graylabel_core as core;
pub use graylabel_decode as decode;
pub use graylabel_detect as detect;

pub use graylabel_core::{PixelCoord, RgbFrame};

mod error;
mod io;
mod params;
mod repository;
mod storage;

pub use error::{CodecError, ConfigError, MappingError, RepositoryError};
pub use io::MappingConfig;
pub use params::{FrameFormat, ServiceConfig, TryOptions};
pub use repository::{
    FsRepository, JobRecord, JobRepository, JobStatus, MemoryRepository, Strategy,
};
pub use storage::{storage_key, ByteStorage, FsStorage, MemoryStorage};

#[cfg(feature = "image")]
pub mod codec;
#[cfg(feature = "image")]
mod sequence;
#[cfg(feature = "image")]
mod service;

#[cfg(feature = "image")]
pub use sequence::ImageSequenceSource;
#[cfg(feature = "image")]
pub use service::{MappingService, TryResult};
