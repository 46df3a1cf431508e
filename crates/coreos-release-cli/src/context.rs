//! Shared context, error types, and configuration loading for the CLI.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use coreos_release_core::{Clock, ReleaseConfig, ReleaseError, VersionRecord};
use tracing::debug;

use crate::cli::{Cli, OutputFormat};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ReleaseError> for CliError {
    fn from(err: ReleaseError) -> Self {
        if err.is_usage() {
            Self::Validation(err.to_string())
        } else {
            Self::Failure(err.into())
        }
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext<'a> {
    pub(crate) config: ReleaseConfig,
    pub(crate) clock: &'a dyn Clock,
    pub(crate) output: OutputFormat,
    pub(crate) version_file: Option<PathBuf>,
}

impl<'a> AppContext<'a> {
    /// Resolve configuration from parsed flags, which already carry their
    /// environment fallbacks. The version file is not read here.
    pub(crate) fn from_cli(cli: &Cli, clock: &'a dyn Clock) -> CliResult<Self> {
        let config = ReleaseConfig::from_values(
            cli.epoch.as_deref(),
            cli.current_version.as_deref(),
            cli.tz.as_deref(),
        )?;

        Ok(Self {
            config,
            clock,
            output: cli.output,
            version_file: cli.version_file.clone(),
        })
    }

    /// Configuration whose current version falls back to the version file.
    ///
    /// An explicit current version wins; the file is only read when none was
    /// given, and a missing file leaves the current version unset.
    pub(crate) fn release_config(&self) -> CliResult<Cow<'_, ReleaseConfig>> {
        if self.config.current_version_str().is_some() {
            return Ok(Cow::Borrowed(&self.config));
        }
        let Some(path) = self.version_file.as_deref() else {
            return Ok(Cow::Borrowed(&self.config));
        };
        match VersionRecord::load_optional(path)? {
            Some(record) => {
                debug!(path = %path.display(), version = %record.version, "loaded version file");
                Ok(Cow::Owned(
                    self.config
                        .clone()
                        .with_current_version(record.version.to_string()),
                ))
            }
            None => Ok(Cow::Borrowed(&self.config)),
        }
    }
}
