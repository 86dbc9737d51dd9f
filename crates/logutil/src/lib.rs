//! Utilities for logging.
//!
//! Logs always go to stderr so they never mix with data written to stdout.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// How verbose the default log filter should be.
///
/// `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<u8> for Verbosity {
    fn from(value: u8) -> Self {
        match value {
            0 => Verbosity::Info,
            1 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }
}

impl From<Verbosity> for Level {
    fn from(value: Verbosity) -> Self {
        match value {
            Verbosity::Info => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Trace => Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingMode {
    #[default]
    Pretty,
    Json,
    Compact,
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Initialize a global tracing subscriber writing to stderr.
///
/// Calling this more than once is harmless, subsequent calls are no-ops.
pub fn init(verbosity: impl Into<Verbosity>, mode: LoggingMode) {
    let level: Level = verbosity.into().into();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr);

    let result = match mode {
        LoggingMode::Json => builder.json().try_init(),
        LoggingMode::Pretty => builder.pretty().try_init(),
        LoggingMode::Compact => builder.compact().try_init(),
    };

    if result.is_ok() {
        tracing::trace!(?level, ?mode, "logging initialized");
    }
}

/// Initialize logging for tests. Output is captured by the test harness.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(Level::DEBUG))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_count() {
        assert_eq!(Verbosity::Info, Verbosity::from(0));
        assert_eq!(Verbosity::Debug, Verbosity::from(1));
        assert_eq!(Verbosity::Trace, Verbosity::from(2));
        assert_eq!(Verbosity::Trace, Verbosity::from(9));
    }

    #[test]
    fn init_twice_is_noop() {
        init_test();
        init_test();
    }
}
