//! # Design
//!
//! - One error type for every release-version operation, grouped by cause:
//!   malformed input, invalid configuration, and IO on the version file.
//! - Carry the offending input as fields so callers can render or match on it.
//! - Preserve source errors instead of flattening them into strings.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::version::{DayIndex, VersionParseError};

/// Result alias for release-version operations.
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Errors produced while computing, parsing, or persisting release versions.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A version-like string could not be parsed.
    #[error("invalid version string: {source}")]
    VersionParse {
        /// Structured parser failure.
        #[from]
        source: VersionParseError,
    },
    /// A required configuration value was not supplied.
    #[error("missing required configuration '{name}'")]
    MissingConfig {
        /// Name of the missing setting (environment variable name).
        name: &'static str,
    },
    /// A configuration value was present but unusable.
    #[error("invalid value '{value}' for '{name}': {reason}")]
    InvalidConfig {
        /// Name of the offending setting.
        name: &'static str,
        /// Raw value supplied by the caller.
        value: String,
        /// Human-readable reason for the rejection.
        reason: &'static str,
    },
    /// The SDK version resolved for a release equals the release itself.
    #[error("sdk version '{sdk_version}' must differ from the release version {version}")]
    SdkVersionMatchesRelease {
        /// Release version being planned.
        version: String,
        /// SDK version that collided with it.
        sdk_version: String,
    },
    /// The computed release major precedes the epoch.
    #[error("day index {day_index} precedes the release epoch")]
    BeforeEpoch {
        /// Day index that was computed or requested.
        day_index: DayIndex,
    },
    /// The minor component cannot be incremented further.
    #[error("minor version overflow for build {major}")]
    MinorExhausted {
        /// Major the minor counter belongs to.
        major: DayIndex,
    },
    /// A timestamp fell outside the calendar range chrono supports.
    #[error("timestamp {timestamp} is outside the supported calendar range")]
    TimestampOutOfRange {
        /// Offending timestamp in seconds since the Unix epoch.
        timestamp: i64,
    },
    /// A strftime-style format string contained an invalid directive.
    #[error("invalid date format '{format}'")]
    InvalidDateFormat {
        /// Format string supplied by the caller.
        format: String,
    },
    /// A date expression could not be interpreted.
    #[error("invalid date '{value}': {reason}")]
    InvalidDate {
        /// Raw date expression.
        value: String,
        /// Human-readable reason for the rejection.
        reason: &'static str,
    },
    /// A build identifier contained characters unsafe for the version file.
    #[error("invalid build id '{value}'")]
    InvalidBuildId {
        /// Rejected build identifier.
        value: String,
    },
    /// A version file line could not be interpreted.
    #[error("version file line {line}: {reason}")]
    VersionFileSyntax {
        /// One-based line number.
        line: usize,
        /// Human-readable reason for the rejection.
        reason: String,
    },
    /// A required key was absent from the version file.
    #[error("version file is missing '{key}'")]
    VersionFileMissingKey {
        /// Name of the missing key.
        key: &'static str,
    },
    /// The stored version id disagrees with its build/branch/patch keys.
    #[error("version file records '{found}' but its components describe '{expected}'")]
    VersionFileInconsistent {
        /// Version id derived from the component keys.
        expected: String,
        /// Version id stored in the file.
        found: String,
    },
    /// Filesystem access to the version file failed.
    #[error("version file {operation} failed for {path}")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ReleaseError {
    /// Whether the error stems from caller input or configuration rather than
    /// an environmental failure.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}
