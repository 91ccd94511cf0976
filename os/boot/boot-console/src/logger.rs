use crate::console_fmt;
use crate::console_trace;
use core::sync::atomic::{AtomicBool, Ordering};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Whether informational output is wanted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Verbosity {
    /// Warnings and errors only.
    #[default]
    Quiet,
    /// Everything.
    Verbose,
}

impl Verbosity {
    /// Verbose iff `command_line` has a whitespace-separated `-v` token.
    ///
    /// The slice may carry a trailing NUL; everything from the first NUL on
    /// is ignored.
    #[must_use]
    pub fn from_command_line(command_line: &[u8]) -> Self {
        let end = command_line
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(command_line.len());
        let verbose = command_line[..end]
            .split(u8::is_ascii_whitespace)
            .any(|token| token == b"-v");
        if verbose { Self::Verbose } else { Self::Quiet }
    }

    #[must_use]
    pub const fn max_level(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Warn,
            Self::Verbose => LevelFilter::Trace,
        }
    }
}

pub struct ConsoleLogger {
    verbose: AtomicBool,
}

static LOGGER: ConsoleLogger = ConsoleLogger::new();

impl ConsoleLogger {
    const fn new() -> Self {
        Self {
            verbose: AtomicBool::new(false),
        }
    }

    /// Routes the `log` facade to `port`. Call this once during early init.
    ///
    /// # Errors
    /// Fails if a logger was already installed.
    pub fn init(port: u16, verbosity: Verbosity) -> Result<&'static Self, SetLoggerError> {
        console_fmt::set_port(port);
        LOGGER.set_verbosity(verbosity);
        log::set_logger(&LOGGER)?;
        log::set_max_level(verbosity.max_level());
        Ok(&LOGGER)
    }

    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.verbose
            .store(verbosity == Verbosity::Verbose, Ordering::Relaxed);
    }

    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose.load(Ordering::Relaxed) {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn || self.verbosity() == Verbosity::Verbose
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Format: "(file:line) LEVEL: message\n"
        console_trace!(
            "({}:{}) {}: {}\n",
            record.file().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}
