//! Logging infrastructure for the stepwise library.
//!
//! The library reports progress through the `log` facade. This module
//! provides a stderr-based backend with three verbosity levels that binaries
//! can install with [`init_logger`].

use std::env;
use std::fmt;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Environment variable selecting the log level when no flag is given.
pub const LOG_MODE_ENV: &str = "STEPWISE_LOG_MODE";

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use stepwise::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Only errors.
    Quiet,
    /// Errors, warnings and per-migration progress.
    Normal,
    /// Everything, including view transitions and ledger queries.
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepwise::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }

    /// The `log` crate filter matching this level.
    #[must_use]
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Error,
            Self::Normal => LevelFilter::Info,
            Self::Verbose => LevelFilter::Debug,
        }
    }
}

/// A simple stderr-based logger.
///
/// The logger only outputs records at or above its configured level.
///
/// # Examples
///
/// ```
/// use stepwise::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// assert!(logger.accepts(log::Level::Warn));
/// assert!(!logger.accepts(log::Level::Debug));
/// ```
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a new logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether a record of the given level would be written.
    #[must_use]
    pub fn accepts(&self, level: Level) -> bool {
        level <= self.level.filter()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.accepts(metadata.level())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => eprintln!("{}", record.args()),
            level => eprintln!("{level}: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

/// Resolves the log level from CLI flags and the environment.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet, verbose wins when both are set)
/// 2. `STEPWISE_LOG_MODE` environment variable
/// 3. Default (Normal)
#[must_use]
pub fn resolve_level(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        return LogLevel::Verbose;
    }
    if quiet {
        return LogLevel::Quiet;
    }

    if let Ok(env_value) = env::var(LOG_MODE_ENV) {
        if let Ok(level) = LogLevel::parse(&env_value) {
            return level;
        }
    }

    LogLevel::Normal
}

/// Installs the stderr logger as the global `log` backend.
///
/// Returns the level that was selected. Installing twice is harmless: the
/// first logger stays in place and only the max level is updated.
///
/// # Examples
///
/// ```
/// use stepwise::{init_logger, LogLevel};
///
/// let level = init_logger(false, true);
/// assert_eq!(level, LogLevel::Quiet);
/// ```
pub fn init_logger(verbose: bool, quiet: bool) -> LogLevel {
    let level = resolve_level(verbose, quiet);
    // a logger may already be installed (tests, embedding applications)
    let _ = log::set_boxed_logger(Box::new(Logger::new(level)));
    log::set_max_level(level.filter());
    level
}
