//! The `KEY=value` version file sourced by the build scripts.
//!
//! Rendered layout, one key per line in this order:
//!
//! ```text
//! COREOS_BUILD=1010
//! COREOS_BRANCH=2
//! COREOS_PATCH=0
//! COREOS_VERSION=1010.2.0+master-1234
//! COREOS_VERSION_ID=1010.2.0
//! COREOS_BUILD_ID=master-1234
//! COREOS_SDK_VERSION=1009.0.0
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ReleaseError, ReleaseResult};
use crate::release::BuildId;
use crate::version::{DayIndex, Version, VersionComponent, parse_component};

/// Keys understood in the version file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKey {
    /// Major / day index.
    Build,
    /// Minor counter.
    Branch,
    /// Patch level.
    Patch,
    /// Version id with optional `+build-id` metadata.
    Version,
    /// Bare `major.minor.patch`.
    VersionId,
    /// CI build identifier.
    BuildId,
    /// SDK version the release builds against.
    SdkVersion,
}

impl VersionKey {
    /// Every key in rendering order.
    pub const ALL: [Self; 7] = [
        Self::Build,
        Self::Branch,
        Self::Patch,
        Self::Version,
        Self::VersionId,
        Self::BuildId,
        Self::SdkVersion,
    ];

    /// Name as written in the file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "COREOS_BUILD",
            Self::Branch => "COREOS_BRANCH",
            Self::Patch => "COREOS_PATCH",
            Self::Version => "COREOS_VERSION",
            Self::VersionId => "COREOS_VERSION_ID",
            Self::BuildId => "COREOS_BUILD_ID",
            Self::SdkVersion => "COREOS_SDK_VERSION",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// Typed contents of a version file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    /// Recorded release version.
    pub version: Version,
    /// Build metadata, if any.
    pub build_id: Option<BuildId>,
    /// SDK version the release builds against.
    pub sdk_version: Option<String>,
}

#[derive(Default)]
struct RawRecord {
    build: Option<String>,
    branch: Option<String>,
    patch: Option<String>,
    version_id: Option<String>,
    build_id: Option<String>,
    sdk_version: Option<String>,
}

impl VersionRecord {
    /// `COREOS_VERSION`: the version id plus `+<build-id>` when one is set.
    #[must_use]
    pub fn version_string(&self) -> String {
        match &self.build_id {
            Some(build_id) => format!("{}+{build_id}", self.version),
            None => self.version.to_string(),
        }
    }

    /// Parse version file text.
    ///
    /// Blank lines and `#` comments are skipped, a leading `export` is
    /// tolerated, matching surrounding quotes are stripped and unknown keys are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Fails on lines without `=`, missing build/branch/patch keys, invalid
    /// numbers, or a `COREOS_VERSION_ID` that disagrees with the components.
    pub fn parse(text: &str) -> ReleaseResult<Self> {
        let mut raw = RawRecord::default();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").map_or(line, str::trim_start);
            let (name, value) =
                line.split_once('=')
                    .ok_or_else(|| ReleaseError::VersionFileSyntax {
                        line: index + 1,
                        reason: format!("expected KEY=value, found '{line}'"),
                    })?;
            let value = unquote(value.trim()).to_string();
            let Some(key) = VersionKey::from_name(name.trim()) else {
                debug!(key = name.trim(), line = index + 1, "ignoring unknown version file key");
                continue;
            };
            let slot = match key {
                VersionKey::Build => &mut raw.build,
                VersionKey::Branch => &mut raw.branch,
                VersionKey::Patch => &mut raw.patch,
                VersionKey::VersionId => &mut raw.version_id,
                VersionKey::BuildId => &mut raw.build_id,
                VersionKey::SdkVersion => &mut raw.sdk_version,
                // Derived from the id and build id; never authoritative.
                VersionKey::Version => continue,
            };
            *slot = Some(value);
        }
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawRecord) -> ReleaseResult<Self> {
        let build = required(raw.build, VersionKey::Build)?;
        let branch = required(raw.branch, VersionKey::Branch)?;
        let patch = required(raw.patch, VersionKey::Patch)?;

        let major = parse_component::<i64>(&build, VersionComponent::Major, &build)?;
        let minor = parse_component::<u32>(&branch, VersionComponent::Minor, &branch)?;
        let patch = parse_component::<u32>(&patch, VersionComponent::Patch, &patch)?;
        let version = Version::new(DayIndex::new(major), minor, patch);

        if let Some(found) = raw.version_id.filter(|id| !id.is_empty()) {
            let expected = version.to_string();
            if found != expected {
                return Err(ReleaseError::VersionFileInconsistent { expected, found });
            }
        }

        let build_id = raw
            .build_id
            .filter(|id| !id.is_empty())
            .map(BuildId::parse)
            .transpose()?;
        let sdk_version = raw.sdk_version.filter(|sdk| !sdk.is_empty());

        Ok(Self {
            version,
            build_id,
            sdk_version,
        })
    }

    /// Render the file contents, every key present in fixed order.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for key in VersionKey::ALL {
            let value = match key {
                VersionKey::Build => self.version.major.to_string(),
                VersionKey::Branch => self.version.minor.to_string(),
                VersionKey::Patch => self.version.patch.to_string(),
                VersionKey::Version => self.version_string(),
                VersionKey::VersionId => self.version.to_string(),
                VersionKey::BuildId => self
                    .build_id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                VersionKey::SdkVersion => self.sdk_version.clone().unwrap_or_default(),
            };
            out.push_str(key.as_str());
            out.push('=');
            out.push_str(&value);
            out.push('\n');
        }
        out
    }

    /// Read and parse a version file.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Io`] when the file cannot be read, otherwise
    /// any [`VersionRecord::parse`] failure.
    pub fn load(path: &Path) -> ReleaseResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ReleaseError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Like [`VersionRecord::load`], but a missing file yields `None`.
    ///
    /// # Errors
    ///
    /// Same as [`VersionRecord::load`] for every failure except `NotFound`.
    pub fn load_optional(path: &Path) -> ReleaseResult<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).map(Some),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ReleaseError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the rendered record, replacing any existing file.
    ///
    /// The contents go to a sibling temporary file first and are renamed into
    /// place so readers never observe a partial file.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Io`] when writing or renaming fails.
    pub fn store(&self, path: &Path) -> ReleaseResult<()> {
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = Path::new(&staging);

        fs::write(staging, self.render()).map_err(|source| ReleaseError::Io {
            operation: "write",
            path: staging.to_path_buf(),
            source,
        })?;
        if let Err(source) = fs::rename(staging, path) {
            if let Err(err) = fs::remove_file(staging) {
                debug!(path = %staging.display(), error = %err, "staging file not removed");
            }
            return Err(ReleaseError::Io {
                operation: "rename",
                path: path.to_path_buf(),
                source,
            });
        }
        info!(path = %path.display(), version = %self.version_string(), "version file written");
        Ok(())
    }
}

fn required(value: Option<String>, key: VersionKey) -> ReleaseResult<String> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ReleaseError::VersionFileMissingKey { key: key.as_str() })
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
