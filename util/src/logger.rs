//! Logger setup
//!
//! Records go to two outputs: the terminal, with coloured level tags, and the session log file as
//! plain text. Each line is stamped with the session time and the emitting thread, e.g.
//!
//! ```text
//! [  12.304511 INF     ctrl] Stop request consumed, holding for 3.0 s
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::Colorize;
use log::{self, info, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of `INFO` or more verbose, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be `Info` or more verbose, warnings and errors are never filtered out.
///
/// # Safety
///
/// - This function must only be called once, a second call fails with `FernInitError`.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < LevelFilter::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let term = fern::Dispatch::new()
        .format(|out, message, record| {
            let tag = match record.level() {
                log::Level::Trace => "TRC".dimmed().italic(),
                log::Level::Debug => "DBG".dimmed(),
                log::Level::Info => "INF".normal(),
                log::Level::Warn => "WRN".yellow(),
                log::Level::Error => "ERR".red().bold(),
            };
            out.finish(format_args!("{}", Line::new(&tag, message, record)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            let tag = level_tag(record.level());
            out.finish(format_args!("{}", Line::new(&tag, message, record)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .chain(term)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// One formatted log line.
struct Line<'a> {
    tag: &'a dyn fmt::Display,
    message: &'a fmt::Arguments<'a>,
    level: log::Level,
    target: &'a str,
}

impl<'a> Line<'a> {
    fn new(tag: &'a dyn fmt::Display, message: &'a fmt::Arguments<'a>, record: &'a Record) -> Self {
        Self {
            tag,
            message,
            level: record.level(),
            target: record.target(),
        }
    }
}

impl<'a> fmt::Display for Line<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let thread = std::thread::current();

        write!(
            f,
            "[{:10.6} {} {:>8}] ",
            session::get_elapsed_seconds(),
            self.tag,
            thread.name().unwrap_or("-")
        )?;

        // Debug and trace records carry their target
        if self.level > log::Level::Info {
            write!(f, "{}: ", self.target)?;
        }

        write!(f, "{}", self.message)
    }
}

fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_tags_are_aligned() {
        let levels = [
            log::Level::Trace,
            log::Level::Debug,
            log::Level::Info,
            log::Level::Warn,
            log::Level::Error,
        ];

        for l in levels.iter() {
            assert_eq!(level_tag(*l).len(), 3);
        }
    }
}
