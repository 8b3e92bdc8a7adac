//! Logger setup for the autonomy executables
//!
//! Lines go to stdout with coloured level tags and to the session log file as plain text, so the
//! log file can be grepped after a replay.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Crates pulled in by the image decoders, capped at `WARN` so per-frame decoding doesn't flood
/// debug logs.
const QUIET_CRATES: [&str; 3] = ["png", "jpeg_decoder", "gif"];

/// Prefix stripped from record targets, every module of the autonomy library lives under it.
const LIB_TARGET_PREFIX: &str = "rov_lib::";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must let `INFO` through, the replay summary is logged at that level.
///
/// Must only be called once per process.
pub fn logger_init(
    min_level: self::LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new().level(min_level);
    for name in QUIET_CRATES.iter() {
        dispatch = dispatch.level_for(*name, LevelFilter::Warn);
    }

    dispatch
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} {}",
                        prefix(record, level_tag(record.level())),
                        message
                    ))
                })
                .chain(std::io::stdout()),
        )
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} {}",
                        prefix(record, plain_level_tag(record.level())),
                        message
                    ))
                })
                .chain(log_file),
        )
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {:?}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Time, level and (for debug and trace records only) the shortened target.
fn prefix<T: std::fmt::Display>(record: &log::Record, tag: T) -> String {
    if record.level() > log::Level::Info {
        format!(
            "[{:10.6} {}] {}:",
            session::get_elapsed_seconds(),
            tag,
            short_target(record.target())
        )
    } else {
        format!("[{:10.6} {}]", session::get_elapsed_seconds(), tag)
    }
}

fn short_target(target: &str) -> &str {
    target.strip_prefix(LIB_TARGET_PREFIX).unwrap_or(target)
}

fn plain_level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}

/// Coloured version of [`plain_level_tag`] for the terminal.
fn level_tag(level: log::Level) -> ColoredString {
    let tag = plain_level_tag(level);

    match level {
        log::Level::Trace => tag.dimmed().italic(),
        log::Level::Debug => tag.dimmed(),
        log::Level::Info => tag.normal(),
        log::Level::Warn => tag.yellow(),
        log::Level::Error => tag.red().bold(),
    }
}
