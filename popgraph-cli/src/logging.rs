//! Logging initialisation for the popgraph CLI.
//!
//! Events go to `stderr` so the summary on `stdout` stays parseable. By
//! default only the popgraph crates log at `info`; everything else is held
//! at `warn`. Closing `geometry.*` and `layout.*` spans report their busy
//! time, which is how generation and layout cost shows up in the log.

use std::{env, str::FromStr, sync::OnceLock};

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::ParseError, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FORMAT_ENV: &str = "POPGRAPH_LOG_FORMAT";
const LOG_FILTER_ENV: &str = EnvFilter::DEFAULT_ENV;

/// Directives applied when `RUST_LOG` is unset or blank.
pub const DEFAULT_DIRECTIVES: &str = "warn,popgraph_core=info,popgraph_cli=info,popgraph=info";

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Errors raised while initialising structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Environment variable contained invalid UTF-8 data.
    #[error("environment variable `{name}` contained invalid UTF-8: {source}")]
    InvalidUnicode {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Underlying parse failure.
        #[source]
        source: env::VarError,
    },
    /// Unsupported log format requested via `POPGRAPH_LOG_FORMAT`.
    #[error("unsupported log format `{provided}`; expected `human` or `json`")]
    UnsupportedFormat {
        /// Raw value supplied by the user.
        provided: String,
    },
    /// `RUST_LOG` held a directive that does not parse.
    #[error("invalid log filter `{provided}`: {source}")]
    InvalidFilter {
        /// Raw value supplied by the user.
        provided: String,
        /// Directive parse failure.
        #[source]
        source: ParseError,
    },
    /// Failed to install the global tracing subscriber.
    #[error("failed to install tracing subscriber: {source}")]
    InstallFailed {
        /// Error raised by `tracing_subscriber`.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
}

/// Output format of the log stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line text.
    #[default]
    Human,
    /// One JSON object per event, carrying the enclosing span list.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnsupportedFormat {
                provided: other.to_owned(),
            }),
        }
    }
}

/// Install global structured logging if it has not already been configured.
///
/// `POPGRAPH_LOG_FORMAT` selects [`LogFormat`] and `RUST_LOG` overrides
/// [`DEFAULT_DIRECTIVES`].
///
/// # Errors
/// Returns [`LoggingError`] if either variable holds invalid Unicode or an
/// unsupported value. A subscriber installed elsewhere is reported on
/// `stderr` and otherwise tolerated.
pub fn init_logging() -> Result<(), LoggingError> {
    if INITIALISED.get().is_some() {
        return Ok(());
    }

    let format = match read_env(LOG_FORMAT_ENV)? {
        Some(raw) => raw.parse()?,
        None => LogFormat::default(),
    };
    let filter = env_filter(read_env(LOG_FILTER_ENV)?.as_deref())?;

    match install_subscriber(format, filter) {
        Ok(()) => {}
        Err(LoggingError::InstallFailed { source }) => {
            eprintln!("structured logging already configured elsewhere: {source}");
        }
        Err(err) => return Err(err),
    }
    let _ = INITIALISED.set(());
    Ok(())
}

fn read_env(name: &'static str) -> Result<Option<String>, LoggingError> {
    match env::var(name) {
        Ok(raw) => Ok(Some(raw)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(LoggingError::InvalidUnicode { name, source }),
    }
}

/// Builds the filter from a raw `RUST_LOG` value, using
/// [`DEFAULT_DIRECTIVES`] when it is absent or blank.
fn env_filter(raw: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directives = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => DEFAULT_DIRECTIVES,
    };
    EnvFilter::try_new(directives).map_err(|source| LoggingError::InvalidFilter {
        provided: directives.to_owned(),
        source,
    })
}

fn install_subscriber(format: LogFormat, filter: EnvFilter) -> Result<(), LoggingError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let fmt_layer = match format {
        LogFormat::Human => fmt_layer.compact().boxed(),
        LogFormat::Json => fmt_layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    };

    // another logger may already own the `log` slot
    let _ = LogTracer::init();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|source| LoggingError::InstallFailed { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("human", LogFormat::Human)]
    #[case("HUMAN", LogFormat::Human)]
    #[case(" json ", LogFormat::Json)]
    fn log_format_accepts_supported_values(#[case] raw: &str, #[case] expected: LogFormat) {
        let format: LogFormat = raw.parse().expect("format must parse");
        assert_eq!(format, expected);
    }

    #[test]
    fn log_format_rejects_unknown_values() {
        let err = "xml".parse::<LogFormat>().expect_err("xml is not supported");
        match err {
            LoggingError::UnsupportedFormat { provided } => assert_eq!(provided, "xml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_directives_target_popgraph_crates() {
        for target in ["popgraph_core=info", "popgraph_cli=info"] {
            assert!(DEFAULT_DIRECTIVES.split(',').any(|d| d == target));
        }
        assert!(DEFAULT_DIRECTIVES.starts_with("warn,"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[case(Some("popgraph_core=debug"))]
    #[case(Some("popgraph_core[layout.run]=trace"))]
    fn env_filter_accepts_defaults_and_overrides(#[case] raw: Option<&str>) {
        assert!(env_filter(raw).is_ok());
    }

    #[test]
    fn env_filter_reports_unparseable_directives() {
        match env_filter(Some("popgraph_core=loud")) {
            Err(LoggingError::InvalidFilter { provided, .. }) => {
                assert_eq!(provided, "popgraph_core=loud");
            }
            other => panic!("expected an invalid filter, got {other:?}"),
        }
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging().expect("logging must initialise");
        init_logging().expect("subsequent calls must be no-ops");
    }
}
