//! Error types for logging setup.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The requested filter directive could not be parsed.
    #[error("invalid log filter '{directive}'")]
    InvalidFilter {
        /// Directive as supplied by the caller.
        directive: String,
        /// Parser failure from `tracing-subscriber`.
        source: ParseError,
    },
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: TryInitError,
    },
}

impl TelemetryError {
    /// Whether the failure was caused by caller-supplied settings.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidFilter { .. })
    }
}
