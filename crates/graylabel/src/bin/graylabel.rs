//! graylabel CLI: map LED pixel positions from a recorded Gray-code sequence.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use graylabel::core::{pattern_schedule, required_frames};
use graylabel::{
    FsRepository, FsStorage, ImageSequenceSource, MappingConfig, MappingService, PixelCoord,
    TryResult,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "graylabel")]
#[command(about = "Map LED pixel positions from a camera capture of Gray-code patterns")]
#[command(version)]
struct Cli {
    /// Directory holding job frames and records.
    #[arg(long, global = true, default_value = ".graylabel")]
    store: PathBuf,

    /// JSON config file (missing fields use defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (repeat for more).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a recorded image sequence into a new job.
    Init {
        /// Directory of frames, one image per video frame, ordered by name.
        #[arg(long)]
        frames: PathBuf,

        /// Frame rate the sequence was recorded at.
        #[arg(long)]
        fps: f64,

        /// Number of LEDs that played the pattern.
        #[arg(long)]
        pixels: usize,
    },

    /// Propose pixel positions on the reference frame of a job.
    Try {
        id: Uuid,

        /// Skip the darkening tone curve.
        #[arg(long)]
        no_tone_filter: bool,

        /// Skip ring scoring.
        #[arg(long)]
        no_score_filter: bool,

        /// Minimal distance between two pixels (10..=30).
        #[arg(long)]
        min_distance: Option<u32>,

        /// Relative detector quality level (0.01..=0.3).
        #[arg(long)]
        quality_level: Option<f32>,

        /// Also write the result to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Decode labels for confirmed positions and finish the job.
    Continue {
        id: Uuid,

        /// JSON file with `[[x, y], ...]` or the output of `try`.
        #[arg(long)]
        positions: PathBuf,
    },

    /// Print a job record.
    Show { id: Uuid },

    /// Print the on/off schedule an LED controller must play.
    Schedule {
        /// Number of LEDs.
        pixels: usize,
    },

    /// Print the effective configuration.
    Config,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionsFile {
    Bare(Vec<PixelCoord>),
    Try(TryResult),
}

#[derive(Serialize)]
struct Schedule {
    total_pixels: usize,
    pattern_frames: usize,
    /// `frames[f][i]`: LED `i` is lit during frame `f`; frame 0 lights all.
    frames: Vec<Vec<bool>>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(verbose: u8, quiet: bool) {
    let _ = tracing_log::LogTracer::init();
    let level = graylabel::core::level_from_verbosity(verbose, quiet);
    graylabel::core::init_tracing(level, false);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8, quiet: bool) {
    let level = graylabel::core::level_from_verbosity(verbose, quiet);
    let _ = graylabel::core::init_with_level(level);
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => MappingConfig::load_json(path)?,
        None => MappingConfig::default(),
    };

    match cli.command {
        Commands::Init {
            frames,
            fps,
            pixels,
        } => {
            let service = open_service(&cli.store, &config);
            let source = ImageSequenceSource::open(&frames, fps)?;
            let record = service.init(pixels, source)?;
            print_json(&record)
        }
        Commands::Try {
            id,
            no_tone_filter,
            no_score_filter,
            min_distance,
            quality_level,
            out,
        } => {
            let service = open_service(&cli.store, &config);
            let mut options = config.try_options.clone();
            options.use_tone_filter &= !no_tone_filter;
            options.use_score_filter &= !no_score_filter;
            if let Some(min_distance) = min_distance {
                options.min_distance = min_distance;
            }
            if let Some(quality_level) = quality_level {
                options.quality_level = quality_level;
            }
            let result = service.try_analyze(id, &options)?;
            if let Some(out) = out {
                std::fs::write(&out, serde_json::to_string_pretty(&result)?)?;
                log::info!("proposal written to {}", out.display());
            }
            print_json(&result)
        }
        Commands::Continue { id, positions } => {
            let service = open_service(&cli.store, &config);
            let positions = read_positions(&positions)?;
            let mapped = service.continue_analyze(id, &positions)?;
            print_json(&mapped)
        }
        Commands::Show { id } => {
            let service = open_service(&cli.store, &config);
            print_json(&service.read(id)?)
        }
        Commands::Schedule { pixels } => {
            if pixels == 0 {
                return Err("pixel count must be at least 1".into());
            }
            print_json(&Schedule {
                total_pixels: pixels,
                pattern_frames: required_frames(pixels),
                frames: pattern_schedule(pixels),
            })
        }
        Commands::Config => print_json(&config),
    }
}

fn open_service(store: &Path, config: &MappingConfig) -> MappingService<FsStorage, FsRepository> {
    config.build_service(
        FsStorage::new(store.join("data")),
        FsRepository::new(store.join("records")),
    )
}

fn read_positions(path: &Path) -> CliResult<Vec<PixelCoord>> {
    let raw = std::fs::read_to_string(path).map_err(|e| -> CliError {
        format!("failed to read positions {}: {e}", path.display()).into()
    })?;
    Ok(match serde_json::from_str(&raw)? {
        PositionsFile::Bare(positions) => positions,
        PositionsFile::Try(result) => result.positions,
    })
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
