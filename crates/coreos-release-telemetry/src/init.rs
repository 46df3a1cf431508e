//! Subscriber installation for the release tooling.
//!
//! # Design
//! - Events go to stderr; stdout carries command output that scripts parse.
//! - `RUST_LOG` overrides the configured directive when it is set and valid.
//! - The build SHA is captured on first use and reported on every init.

use std::env;
use std::io;

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Filter used when neither `RUST_LOG` nor a flag selects one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Install the global tracing subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when `config.level` is not a valid
/// filter directive and [`TelemetryError::SubscriberInstall`] when a global
/// subscriber already exists.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let sha = BUILD_SHA.get_or_init(|| config.build_sha.to_owned());
    let filter = resolve_filter(config.level, env::var("RUST_LOG").ok().as_deref())?;

    let json = (config.format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_target(false)
    });
    let pretty = (config.format == LogFormat::Pretty).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })?;
    tracing::debug!(build_sha = %sha, format = ?config.format, "logging initialised");
    Ok(())
}

/// Build SHA captured by the first [`init_logging`] call, or `dev`.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

fn resolve_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(filter) = rust_log
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
    {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| TelemetryError::InvalidFilter {
        directive: level.to_string(),
        source,
    })
}

/// Logging settings gathered from flags and the environment.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive such as `info` or `coreos_release_core=debug`.
    pub level: &'a str,
    /// Event encoding.
    pub format: LogFormat,
    /// Build identifier attached to the initialisation event.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::Pretty,
            build_sha: option_env!("COREOS_RELEASE_BUILD_SHA").unwrap_or("dev"),
        }
    }
}

/// Event encodings supported on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for CI log collectors.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Parse a format name; anything other than `json` is human-readable.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}
