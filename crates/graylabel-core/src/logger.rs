//! Process-wide logging for graylabel binaries.
//!
//! Records from the `graylabel*` crates pass at the requested level. Every
//! other crate (image decoders, ...) is capped at `Warn`, so `-vv` shows the
//! pipeline and not the PNG inflater. `init_with_level` installs a small
//! stderr logger printing `[elapsed LEVEL crate] message`; `init_tracing` is
//! the structured alternative with the same filtering.

use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_PREFIX: &str = "graylabel";

/// Level applied to crates outside the workspace.
fn dependency_level(own: LevelFilter) -> LevelFilter {
    own.min(LevelFilter::Warn)
}

fn level_for(target: &str, own: LevelFilter) -> LevelFilter {
    if target.starts_with(OWN_PREFIX) {
        own
    } else {
        dependency_level(own)
    }
}

fn format_record(
    elapsed: Duration,
    level: Level,
    target: &str,
    args: &std::fmt::Arguments<'_>,
) -> String {
    let krate = target.split("::").next().unwrap_or_default();
    format!(
        "[{:7.3}s {:>5} {}] {}",
        elapsed.as_secs_f64(),
        level,
        krate,
        args
    )
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= level_for(metadata.target(), self.level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(
            self.started.elapsed(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Map CLI verbosity flags to a level: warnings by default, each `-v`
/// one step noisier, `quiet` only errors.
pub fn level_from_verbosity(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `EnvFilter` directives equivalent to the stderr logger's filtering,
/// e.g. `warn,graylabel=debug`.
pub fn filter_directives(level: LevelFilter) -> String {
    format!(
        "{},{OWN_PREFIX}={}",
        dependency_level(level).as_str().to_ascii_lowercase(),
        level.as_str().to_ascii_lowercase()
    )
}

/// Install a `tracing` subscriber. `RUST_LOG` overrides `level` when set.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
