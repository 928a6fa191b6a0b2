//! Logging setup for `kbank` and the backend server.
//!
//! Log lines are written to stderr so that command output on stdout can be
//! piped. `RUST_LOG` replaces the verbosity-derived filter when it is set.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets that follow the verbosity flags; everything else stays at `warn`
/// or quieter.
const LOG_TARGETS: [&str; 2] = ["knowledgebank", "tower_http"];

/// How much the command line asked to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: errors only.
    Quiet,
    /// No flag: info and above.
    #[default]
    Normal,
    /// `-v`: debug, including one line per served request.
    Verbose,
    /// `-vv` and beyond: everything.
    Trace,
}

impl Verbosity {
    /// Map the `-q` switch and the `-v` count onto a verbosity. `-q` wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Level applied to this crate and to request tracing.
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::ERROR,
            Self::Normal => LevelFilter::INFO,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is not set.
    #[must_use]
    pub fn directives(self) -> Vec<String> {
        let level = self.level();
        let mut directives = vec![level.min(LevelFilter::WARN).to_string().to_lowercase()];
        directives.extend(
            LOG_TARGETS
                .iter()
                .map(|target| format!("{target}={level}").to_lowercase()),
        );
        directives
    }
}

/// Build the event filter: `RUST_LOG` if set and non-empty, otherwise the
/// directives for `verbosity`.
fn env_filter(verbosity: Verbosity, rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => EnvFilter::builder().parse_lossy(raw),
        None => EnvFilter::new(verbosity.directives().join(",")),
    }
}

/// Install the global subscriber. Later calls are ignored.
///
/// ```no_run
/// use knowledgebank::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(verbosity, rust_log.as_deref());

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity != Verbosity::Normal)
        .with_file(verbosity == Verbosity::Trace)
        .with_line_number(verbosity == Verbosity::Trace);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

/// Quiet subscriber for tests: warnings and errors through the test writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 2), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(false, 9), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
    }

    #[test]
    fn test_level() {
        assert_eq!(Verbosity::Quiet.level(), LevelFilter::ERROR);
        assert_eq!(Verbosity::default().level(), LevelFilter::INFO);
        assert_eq!(Verbosity::Trace.level(), LevelFilter::TRACE);
    }

    #[test]
    fn test_directives_keep_dependencies_at_warn() {
        assert_eq!(
            Verbosity::Verbose.directives(),
            vec!["warn", "knowledgebank=debug", "tower_http=debug"]
        );
        assert_eq!(
            Verbosity::Quiet.directives(),
            vec!["error", "knowledgebank=error", "tower_http=error"]
        );
    }

    #[test]
    fn test_env_filter_prefers_rust_log() {
        let filter = env_filter(Verbosity::Quiet, Some("hyper=trace"));
        assert_eq!(filter.to_string().to_lowercase(), "hyper=trace");
    }

    #[test]
    fn test_env_filter_ignores_blank_rust_log() {
        let filter = env_filter(Verbosity::Trace, Some("  "));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let filter = env_filter(Verbosity::Quiet, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }
}
