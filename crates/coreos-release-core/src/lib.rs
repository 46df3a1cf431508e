#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

//! Release version arithmetic for the `CoreOS` build pipeline.
//!
//! Every build's major version is the number of whole days elapsed since a
//! fixed epoch. This crate owns that encoding and the bookkeeping built on it.
//!
//! Layout: `clock.rs` (injectable wall clock), `date.rs` (day-index codec and
//! calendar formatting), `version.rs` (typed version triple and parser),
//! `release.rs` (next-version rules, branch/tag naming, release plans),
//! `version_file.rs` (`KEY=value` persisted state), `config.rs` (explicit
//! configuration replacing process-wide environment lookups).

pub mod clock;
pub mod config;
pub mod date;
pub mod error;
pub mod release;
pub mod version;
pub mod version_file;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EPOCH_ENV, ReleaseConfig, TZ_ENV, VERSION_ENV};
pub use date::{
    DEFAULT_DATE_FORMAT, DateCodec, SECONDS_PER_DAY, TimeZoneSpec, format_timestamp,
    parse_date_expression,
};
pub use error::{ReleaseError, ReleaseResult};
pub use release::{
    BuildId, ReleasePlan, ReleaseRequest, VersionOverrides, check_sdk_version, next_version,
};
pub use version::{DayIndex, Version, VersionComponent, VersionParseError, day_index_from_version};
pub use version_file::{VersionKey, VersionRecord};
