//! Test fixtures and filesystem helpers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Epoch used throughout the test suites: 2014-05-13T16:53:20Z.
pub const TEST_EPOCH: i64 = 1_400_000_000;

/// Seconds in one day bucket.
pub const DAY: i64 = 86_400;

/// First second of `day` relative to [`TEST_EPOCH`].
#[must_use]
pub const fn day_start(day: i64) -> i64 {
    TEST_EPOCH + day * DAY
}

/// Render a version file in the canonical key order.
#[must_use]
pub fn version_file_text(
    build: i64,
    branch: u32,
    patch: u32,
    build_id: &str,
    sdk_version: &str,
) -> String {
    let id = format!("{build}.{branch}.{patch}");
    let version = if build_id.is_empty() {
        id.clone()
    } else {
        format!("{id}+{build_id}")
    };
    format!(
        "COREOS_BUILD={build}\nCOREOS_BRANCH={branch}\nCOREOS_PATCH={patch}\n\
         COREOS_VERSION={version}\nCOREOS_VERSION_ID={id}\nCOREOS_BUILD_ID={build_id}\n\
         COREOS_SDK_VERSION={sdk_version}\n"
    )
}

/// Scratch directory holding a version file.
pub struct VersionFileFixture {
    dir: TempDir,
    path: PathBuf,
}

impl VersionFileFixture {
    /// Create an empty scratch directory; the version file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn empty() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("version.txt");
        Ok(Self { dir, path })
    }

    /// Create a scratch directory with `contents` written to the version file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn with_contents(contents: &str) -> io::Result<Self> {
        let fixture = Self::empty()?;
        fs::write(&fixture.path, contents)?;
        Ok(fixture)
    }

    /// Path of the version file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the version file.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Current file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}
