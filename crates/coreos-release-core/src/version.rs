//! Typed version triple and the parser for version-like strings.
//!
//! Accepted shapes: an optional leading `v`, dot-separated decimal components,
//! and optional `+<build-id>` metadata which is ignored for comparison
//! (`v1010.2.0`, `1010.2.0+2016-05-26-1829`).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whole days elapsed since the release epoch; doubles as the major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayIndex(i64);

impl DayIndex {
    /// Wrap a raw day count.
    #[must_use]
    pub const fn new(days: i64) -> Self {
        Self(days)
    }

    /// Raw day count.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether the index lies before the epoch.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Display for DayIndex {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, formatter)
    }
}

/// Position of a component within a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComponent {
    /// Day index / build number.
    Major,
    /// Same-day release counter.
    Minor,
    /// Patch level.
    Patch,
}

impl VersionComponent {
    const ORDER: [Self; 3] = [Self::Major, Self::Minor, Self::Patch];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        }
    }
}

impl Display for VersionComponent {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Structured failure from the version parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// Nothing remained after stripping the prefix and build metadata.
    #[error("version string is empty")]
    Empty,
    /// The string did not have the expected number of components.
    #[error("version '{input}' has {found} component(s), expected {expected}")]
    ComponentCount {
        /// Raw input.
        input: String,
        /// Number of dot-separated components found.
        found: usize,
        /// Description of the accepted count.
        expected: &'static str,
    },
    /// A component was not a non-negative decimal integer.
    #[error("version '{input}' has invalid {position} component '{component}'")]
    InvalidComponent {
        /// Raw input.
        input: String,
        /// Which component failed.
        position: VersionComponent,
        /// Offending component text.
        component: String,
    },
}

/// Release version: `major.minor.patch` with the major measured in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Day index of the build.
    pub major: DayIndex,
    /// Counter distinguishing releases cut on the same day.
    pub minor: u32,
    /// Patch level on top of the release branch.
    pub patch: u32,
}

impl Version {
    /// Construct a version from its components.
    #[must_use]
    pub const fn new(major: DayIndex, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Source-control branch carrying every release of this major.
    #[must_use]
    pub fn branch_name(&self) -> String {
        format!("build-{}", self.major)
    }

    /// Source-control tag naming this exact release.
    #[must_use]
    pub fn tag_name(&self) -> String {
        format!("v{self}")
    }
}

impl Display for Version {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let components = split_components(input)?;
        if components.len() != 3 {
            return Err(VersionParseError::ComponentCount {
                input: input.to_string(),
                found: components.len(),
                expected: "exactly 3",
            });
        }
        let major = parse_major(input, components[0])?;
        let minor = parse_component(input, VersionComponent::Minor, components[1])?;
        let patch = parse_component(input, VersionComponent::Patch, components[2])?;
        Ok(Self::new(major, minor, patch))
    }
}

/// Extract the day index from a version-like string.
///
/// Takes the component before the first `.` after stripping a leading `v`.
/// Between one and three components are accepted so bare build numbers
/// (`1010`) and partial versions (`v1010.2`) resolve, but every component that
/// is present must be a valid integer.
///
/// # Errors
///
/// Returns [`VersionParseError`] when the string is empty, has more than three
/// components, or any component is not a non-negative integer.
pub fn day_index_from_version(input: &str) -> Result<DayIndex, VersionParseError> {
    let components = split_components(input)?;
    if components.len() > 3 {
        return Err(VersionParseError::ComponentCount {
            input: input.to_string(),
            found: components.len(),
            expected: "1 to 3",
        });
    }
    let major = parse_major(input, components[0])?;
    for (position, text) in VersionComponent::ORDER.iter().zip(&components).skip(1) {
        parse_component::<u32>(input, *position, text)?;
    }
    Ok(major)
}

fn split_components(input: &str) -> Result<Vec<&str>, VersionParseError> {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let core = body.split_once('+').map_or(body, |(core, _metadata)| core);
    if core.is_empty() {
        return Err(VersionParseError::Empty);
    }
    Ok(core.split('.').collect())
}

fn parse_major(input: &str, text: &str) -> Result<DayIndex, VersionParseError> {
    parse_component::<i64>(input, VersionComponent::Major, text).map(DayIndex::new)
}

pub(crate) fn parse_component<T: FromStr>(
    input: &str,
    position: VersionComponent,
    text: &str,
) -> Result<T, VersionParseError> {
    let invalid = || VersionParseError::InvalidComponent {
        input: input.to_string(),
        position,
        component: text.to_string(),
    };
    // `str::parse` would also take a sign; components are bare digits.
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    text.parse::<T>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_triples() -> Result<(), VersionParseError> {
        let version: Version = "v123.5.0".parse()?;
        assert_eq!(version, Version::new(DayIndex::new(123), 5, 0));
        assert_eq!(version.to_string(), "123.5.0");
        Ok(())
    }

    #[test]
    fn ignores_build_metadata() -> Result<(), VersionParseError> {
        let version: Version = "1010.2.1+2016-05-26-1829".parse()?;
        assert_eq!(version, Version::new(DayIndex::new(1010), 2, 1));
        Ok(())
    }

    #[test]
    fn rejects_wrong_component_count() {
        let err = "123.5".parse::<Version>().expect_err("two components");
        assert!(matches!(
            err,
            VersionParseError::ComponentCount { found: 2, .. }
        ));
        let err = "1.2.3.4".parse::<Version>().expect_err("four components");
        assert!(matches!(
            err,
            VersionParseError::ComponentCount { found: 4, .. }
        ));
    }

    #[test]
    fn rejects_signed_and_empty_components() {
        for input in ["-1.0.0", "1.+2.0", "1..0", "1.0.", " "] {
            assert!(input.parse::<Version>().is_err(), "{input} should fail");
        }
        assert_eq!("v".parse::<Version>(), Err(VersionParseError::Empty));
    }

    #[test]
    fn names_the_failing_component() {
        let err = "12.x.0".parse::<Version>().expect_err("bad minor");
        assert_eq!(
            err,
            VersionParseError::InvalidComponent {
                input: "12.x.0".to_string(),
                position: VersionComponent::Minor,
                component: "x".to_string(),
            }
        );
    }

    #[test]
    fn day_index_accepts_partial_versions() -> Result<(), VersionParseError> {
        assert_eq!(day_index_from_version("v123.5.0")?, DayIndex::new(123));
        assert_eq!(day_index_from_version("123")?, DayIndex::new(123));
        assert_eq!(day_index_from_version("v77.1")?, DayIndex::new(77));
        assert_eq!(day_index_from_version("99.0.0+build-7")?, DayIndex::new(99));
        Ok(())
    }

    #[test]
    fn day_index_rejects_non_numeric_text() {
        let err = day_index_from_version("abc.5.0").expect_err("non-numeric major");
        assert!(matches!(
            err,
            VersionParseError::InvalidComponent {
                position: VersionComponent::Major,
                ..
            }
        ));
        assert!(day_index_from_version("12.q").is_err());
        assert!(day_index_from_version("1.2.3.4").is_err());
        assert!(day_index_from_version("").is_err());
    }

    #[test]
    fn branch_and_tag_names_follow_the_major() {
        let version = Version::new(DayIndex::new(1010), 2, 0);
        assert_eq!(version.branch_name(), "build-1010");
        assert_eq!(version.tag_name(), "v1010.2.0");
    }

    #[test]
    fn versions_order_by_component() {
        let older = Version::new(DayIndex::new(10), 9, 9);
        let newer = Version::new(DayIndex::new(11), 0, 0);
        assert!(older < newer);
    }
}
