//! Explicit configuration for the codec and release planner.
//!
//! Values that the build scripts historically read from the environment are
//! collected once into [`ReleaseConfig`] and passed down by reference.

use crate::date::{DateCodec, TimeZoneSpec};
use crate::error::{ReleaseError, ReleaseResult};
use crate::version::{DayIndex, Version, day_index_from_version};

/// Environment variable holding the epoch in seconds.
pub const EPOCH_ENV: &str = "COREOS_EPOCH";
/// Environment variable holding the current version.
pub const VERSION_ENV: &str = "COREOS_VERSION";
/// Environment variable selecting the display time zone.
pub const TZ_ENV: &str = "TZ";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    epoch: i64,
    current_version: Option<String>,
    time_zone: TimeZoneSpec,
}

impl ReleaseConfig {
    /// Configuration with only an epoch; UTC and no current version.
    #[must_use]
    pub const fn new(epoch: i64) -> Self {
        Self {
            epoch,
            current_version: None,
            time_zone: TimeZoneSpec::Utc,
        }
    }

    /// Set the version used when callers do not name one.
    #[must_use]
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = Some(version.into());
        self
    }

    /// Set the display time zone.
    #[must_use]
    pub fn with_time_zone(mut self, zone: TimeZoneSpec) -> Self {
        self.time_zone = zone;
        self
    }

    /// Build from raw string values, typically flags or environment entries.
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MissingConfig`] without an epoch and
    /// [`ReleaseError::InvalidConfig`] when the epoch is not an integer or the
    /// time zone is not recognised.
    pub fn from_values(
        epoch: Option<&str>,
        current_version: Option<&str>,
        time_zone: Option<&str>,
    ) -> ReleaseResult<Self> {
        let raw_epoch = non_blank(epoch).ok_or(ReleaseError::MissingConfig { name: EPOCH_ENV })?;
        let epoch = raw_epoch
            .parse::<i64>()
            .map_err(|_| ReleaseError::InvalidConfig {
                name: EPOCH_ENV,
                value: raw_epoch.to_string(),
                reason: "expected integer seconds since the Unix epoch",
            })?;

        Ok(Self {
            epoch,
            current_version: non_blank(current_version).map(str::to_string),
            time_zone: TimeZoneSpec::parse(time_zone)?,
        })
    }

    /// Build from a key lookup such as the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`ReleaseConfig::from_values`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ReleaseResult<Self> {
        let epoch = lookup(EPOCH_ENV);
        let version = lookup(VERSION_ENV);
        let zone = lookup(TZ_ENV);
        Self::from_values(epoch.as_deref(), version.as_deref(), zone.as_deref())
    }

    /// Build from the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`ReleaseConfig::from_values`].
    pub fn from_env() -> ReleaseResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Epoch in seconds since the Unix epoch.
    #[must_use]
    pub const fn epoch(&self) -> i64 {
        self.epoch
    }

    /// Display time zone.
    #[must_use]
    pub const fn time_zone(&self) -> TimeZoneSpec {
        self.time_zone
    }

    /// Raw current version, if configured.
    #[must_use]
    pub fn current_version_str(&self) -> Option<&str> {
        self.current_version.as_deref()
    }

    /// Codec bound to the configured epoch.
    #[must_use]
    pub const fn codec(&self) -> DateCodec {
        DateCodec::new(self.epoch)
    }

    /// Parse the configured current version as a full triple.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::VersionParse`] when it is not `major.minor.patch`.
    pub fn current_version(&self) -> ReleaseResult<Option<Version>> {
        self.current_version
            .as_deref()
            .map(str::parse::<Version>)
            .transpose()
            .map_err(ReleaseError::from)
    }

    /// Day index of `explicit`, or of the configured current version when no
    /// explicit version is given.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MissingConfig`] when neither is available and
    /// [`ReleaseError::VersionParse`] when the chosen text is malformed.
    pub fn resolve_day_index(&self, explicit: Option<&str>) -> ReleaseResult<DayIndex> {
        let source = non_blank(explicit)
            .or_else(|| self.current_version_str())
            .ok_or(ReleaseError::MissingConfig { name: VERSION_ENV })?;
        Ok(day_index_from_version(source)?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
