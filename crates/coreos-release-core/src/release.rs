//! Next-version rules and the release plan handed to the tagging tooling.
//!
//! # Design
//! - `next_version` is a pure function of today's day index, the last recorded
//!   version and caller overrides.
//! - Every check runs before a plan exists, so a rejected release never
//!   reaches the version file or source control.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::date::DateCodec;
use crate::error::{ReleaseError, ReleaseResult};
use crate::version::{DayIndex, Version};
use crate::version_file::VersionRecord;

/// Components a caller may pin instead of deriving them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionOverrides {
    /// Replaces today's day index as the major.
    pub major: Option<DayIndex>,
    /// Replaces the same-day counter.
    pub minor: Option<u32>,
    /// Replaces the default patch level of zero.
    pub patch: Option<u32>,
}

/// Compute the version for a new release.
///
/// The minor continues the current version's counter when that version was
/// cut today and restarts at zero otherwise. Overrides replace the computed
/// components afterwards; pinning the major does not change which counter the
/// minor continues.
///
/// # Errors
///
/// Returns [`ReleaseError::BeforeEpoch`] for a negative major and
/// [`ReleaseError::MinorExhausted`] when the counter cannot advance.
pub fn next_version(
    today: DayIndex,
    current: Option<&Version>,
    overrides: &VersionOverrides,
) -> ReleaseResult<Version> {
    let major = overrides.major.unwrap_or(today);
    if major.is_negative() {
        return Err(ReleaseError::BeforeEpoch { day_index: major });
    }
    let minor = match (overrides.minor, current) {
        (Some(minor), _) => minor,
        (None, Some(current)) if current.major == today => current
            .minor
            .checked_add(1)
            .ok_or(ReleaseError::MinorExhausted { major: today })?,
        (None, _) => 0,
    };
    Ok(Version::new(major, minor, overrides.patch.unwrap_or(0)))
}

/// Reject an SDK version that names the release being cut.
///
/// The comparison is made on parsed versions when possible so `v12.0.0` and
/// `12.0.0+ci` both collide with `12.0.0`.
///
/// # Errors
///
/// Returns [`ReleaseError::SdkVersionMatchesRelease`] on a collision.
pub fn check_sdk_version(version: &Version, sdk_version: &str) -> ReleaseResult<()> {
    let literal = version.to_string();
    let collides = sdk_version.trim() == literal
        || sdk_version
            .parse::<Version>()
            .is_ok_and(|parsed| parsed == *version);
    if collides {
        return Err(ReleaseError::SdkVersionMatchesRelease {
            version: literal,
            sdk_version: sdk_version.to_string(),
        });
    }
    Ok(())
}

/// Opaque identifier of a CI build, appended to the version as metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    /// Validate a raw build identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidBuildId`] when the value is empty or
    /// contains whitespace, quotes or `+`.
    pub fn parse(raw: impl Into<String>) -> ReleaseResult<Self> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|ch| !ch.is_whitespace() && !matches!(ch, '"' | '\'' | '+' | '='));
        if valid {
            Ok(Self(raw))
        } else {
            Err(ReleaseError::InvalidBuildId { value: raw })
        }
    }

    /// Build id combining a CI branch name with its build counter.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidBuildId`] when the branch name is not
    /// usable inside an identifier.
    pub fn from_counter(branch: &str, counter: u64) -> ReleaseResult<Self> {
        Self::parse(format!("{branch}-{counter}"))
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BuildId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Caller inputs for a release beyond the persisted state.
#[derive(Debug, Clone, Default)]
pub struct ReleaseRequest {
    /// Pinned version components.
    pub overrides: VersionOverrides,
    /// Explicit SDK version; defaults to the current version when absent.
    pub sdk_version: Option<String>,
    /// Build metadata recorded alongside the version.
    pub build_id: Option<BuildId>,
}

/// Everything the tagging tooling needs to cut a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleasePlan {
    /// Version being released.
    pub version: Version,
    /// Release branch name, `build-<major>`.
    pub branch: String,
    /// Release tag name, `v<major>.<minor>.<patch>`.
    pub tag: String,
    /// SDK the release builds against.
    pub sdk_version: Option<String>,
    /// Build metadata, if any.
    pub build_id: Option<BuildId>,
    /// Version the plan supersedes.
    pub previous: Option<Version>,
}

impl ReleasePlan {
    /// Plan the next release from the clock, the last recorded version and the
    /// caller's request.
    ///
    /// # Errors
    ///
    /// Propagates [`next_version`] failures and rejects SDK versions equal to
    /// the new release.
    pub fn compute(
        codec: &DateCodec,
        clock: &(impl Clock + ?Sized),
        current: Option<&Version>,
        request: &ReleaseRequest,
    ) -> ReleaseResult<Self> {
        let today = codec.today(clock);
        let version = next_version(today, current, &request.overrides)?;
        let sdk_version = request
            .sdk_version
            .clone()
            .or_else(|| current.map(ToString::to_string));
        if let Some(sdk_version) = &sdk_version {
            check_sdk_version(&version, sdk_version)?;
        }

        let plan = Self {
            branch: version.branch_name(),
            tag: version.tag_name(),
            version,
            sdk_version,
            build_id: request.build_id.clone(),
            previous: current.copied(),
        };
        info!(
            version = %plan.version,
            branch = %plan.branch,
            tag = %plan.tag,
            previous = ?plan.previous.map(|previous| previous.to_string()),
            "planned release"
        );
        Ok(plan)
    }

    /// Version file contents describing this release.
    #[must_use]
    pub fn record(&self) -> VersionRecord {
        VersionRecord {
            version: self.version,
            build_id: self.build_id.clone(),
            sdk_version: self.sdk_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::date::SECONDS_PER_DAY;

    const EPOCH: i64 = 1_400_000_000;

    fn version(major: i64, minor: u32, patch: u32) -> Version {
        Version::new(DayIndex::new(major), minor, patch)
    }

    #[test]
    fn same_day_increments_minor() -> ReleaseResult<()> {
        let next = next_version(
            DayIndex::new(40),
            Some(&version(40, 3, 2)),
            &VersionOverrides::default(),
        )?;
        assert_eq!(next, version(40, 4, 0));
        Ok(())
    }

    #[test]
    fn new_day_resets_minor() -> ReleaseResult<()> {
        let next = next_version(
            DayIndex::new(41),
            Some(&version(40, 9, 0)),
            &VersionOverrides::default(),
        )?;
        assert_eq!(next, version(41, 0, 0));
        let first = next_version(DayIndex::new(41), None, &VersionOverrides::default())?;
        assert_eq!(first, version(41, 0, 0));
        Ok(())
    }

    #[test]
    fn overrides_pin_components() -> ReleaseResult<()> {
        let overrides = VersionOverrides {
            major: Some(DayIndex::new(40)),
            minor: None,
            patch: Some(7),
        };
        let next = next_version(DayIndex::new(45), Some(&version(40, 1, 0)), &overrides)?;
        assert_eq!(next, version(40, 0, 7));

        let next = next_version(DayIndex::new(45), Some(&version(45, 1, 0)), &overrides)?;
        assert_eq!(next, version(40, 2, 7));

        let overrides = VersionOverrides {
            minor: Some(9),
            ..VersionOverrides::default()
        };
        let next = next_version(DayIndex::new(45), Some(&version(45, 1, 0)), &overrides)?;
        assert_eq!(next, version(45, 9, 0));
        Ok(())
    }

    #[test]
    fn rejects_majors_before_epoch() {
        let err = next_version(DayIndex::new(-1), None, &VersionOverrides::default())
            .expect_err("negative major");
        assert!(matches!(err, ReleaseError::BeforeEpoch { .. }));
    }

    #[test]
    fn rejects_exhausted_minor() {
        let err = next_version(
            DayIndex::new(5),
            Some(&version(5, u32::MAX, 0)),
            &VersionOverrides::default(),
        )
        .expect_err("overflow");
        assert!(matches!(err, ReleaseError::MinorExhausted { .. }));
    }

    #[test]
    fn sdk_guard_matches_literal_and_prefixed_forms() {
        let release = version(12, 0, 0);
        for sdk in ["12.0.0", "v12.0.0", "12.0.0+ci-4"] {
            assert!(matches!(
                check_sdk_version(&release, sdk),
                Err(ReleaseError::SdkVersionMatchesRelease { .. })
            ));
        }
        assert!(check_sdk_version(&release, "11.2.0").is_ok());
        assert!(check_sdk_version(&release, "nightly").is_ok());
    }

    #[test]
    fn build_ids_reject_unsafe_characters() -> ReleaseResult<()> {
        assert_eq!(BuildId::from_counter("master", 1234)?.as_str(), "master-1234");
        for raw in ["", "has space", "quote\"", "a+b", "k=v"] {
            assert!(BuildId::parse(raw).is_err(), "{raw:?} should be rejected");
        }
        Ok(())
    }

    #[test]
    fn plan_derives_names_and_sdk_default() -> ReleaseResult<()> {
        let codec = DateCodec::new(EPOCH);
        let clock = FixedClock(EPOCH + 40 * SECONDS_PER_DAY + 100);
        let current = version(40, 3, 0);
        let plan = ReleasePlan::compute(&codec, &clock, Some(&current), &ReleaseRequest::default())?;
        assert_eq!(plan.version, version(40, 4, 0));
        assert_eq!(plan.branch, "build-40");
        assert_eq!(plan.tag, "v40.4.0");
        assert_eq!(plan.sdk_version.as_deref(), Some("40.3.0"));
        assert_eq!(plan.previous, Some(current));

        let record = plan.record();
        assert_eq!(record.version, plan.version);
        assert_eq!(record.sdk_version.as_deref(), Some("40.3.0"));
        Ok(())
    }

    #[test]
    fn plan_rejects_sdk_equal_to_release() {
        let codec = DateCodec::new(EPOCH);
        let clock = FixedClock(EPOCH + 2 * SECONDS_PER_DAY);
        let request = ReleaseRequest {
            sdk_version: Some("2.0.0".to_string()),
            ..ReleaseRequest::default()
        };
        let err = ReleasePlan::compute(&codec, &clock, None, &request).expect_err("collision");
        assert!(matches!(
            err,
            ReleaseError::SdkVersionMatchesRelease { ref version, .. } if version == "2.0.0"
        ));
    }
}
