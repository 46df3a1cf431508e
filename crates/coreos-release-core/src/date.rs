//! Day-index codec and calendar helpers.
//!
//! # Design
//! - `encode` floors toward negative infinity so instants before the epoch map
//!   to negative indices instead of collapsing onto day zero.
//! - Arithmetic is widened to `i128`; no input can overflow.
//! - Time zones are resolved once into [`TimeZoneSpec`] and passed explicitly;
//!   an unknown zone name is a configuration error, never a silent fallback.

use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::clock::Clock;
use crate::config::TZ_ENV;
use crate::error::{ReleaseError, ReleaseResult};
use crate::version::{DayIndex, day_index_from_version};

/// Length of one day index bucket.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Output format matching the `date(1)` default rendering.
pub const DEFAULT_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// Converts between timestamps and day indices relative to a fixed epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCodec {
    epoch: i64,
}

impl DateCodec {
    /// Build a codec for the given epoch (seconds since the Unix epoch).
    #[must_use]
    pub const fn new(epoch: i64) -> Self {
        Self { epoch }
    }

    /// Epoch the codec measures from.
    #[must_use]
    pub const fn epoch(&self) -> i64 {
        self.epoch
    }

    /// Whole days between the epoch and `timestamp`, floored.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn encode(&self, timestamp: i64) -> DayIndex {
        let delta = timestamp as i128 - self.epoch as i128;
        // |delta| <= 2^64, so the quotient always fits back into i64.
        DayIndex::new(delta.div_euclid(SECONDS_PER_DAY as i128) as i64)
    }

    /// First second of the given day index, saturating at the `i64` bounds.
    #[must_use]
    pub const fn decode(&self, day: DayIndex) -> i64 {
        day.get()
            .saturating_mul(SECONDS_PER_DAY)
            .saturating_add(self.epoch)
    }

    /// Day index of the clock's current instant.
    pub fn today(&self, clock: &(impl Clock + ?Sized)) -> DayIndex {
        let now = clock.now();
        let day = self.encode(now);
        debug!(now, epoch = self.epoch, day_index = day.get(), "encoded current time");
        day
    }

    /// Start-of-day timestamp for the major of a version-like string.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::VersionParse`] when the string does not carry an
    /// integer day index.
    pub fn decode_version(&self, version: &str) -> ReleaseResult<i64> {
        let day = day_index_from_version(version)?;
        Ok(self.decode(day))
    }
}

/// Time zone used to render and interpret calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneSpec {
    /// Coordinated Universal Time.
    #[default]
    Utc,
    /// Fixed offset east of UTC.
    Fixed(FixedOffset),
    /// IANA zone such as `Asia/Tokyo`.
    Named(Tz),
    /// The system zone, for `TZ` values that point at `/etc/localtime`.
    Local,
}

impl TimeZoneSpec {
    /// Interpret a `TZ`-style value. Unset and blank values mean UTC.
    ///
    /// Accepts UTC aliases, `±HH:MM`/`±HHMM` offsets, IANA names (optionally
    /// prefixed with `:` or given as a path under `zoneinfo/`), and
    /// `/etc/localtime`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidConfig`] for any other value.
    pub fn parse(value: Option<&str>) -> ReleaseResult<Self> {
        let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(Self::Utc);
        };
        let name = raw.strip_prefix(':').unwrap_or(raw);
        if ["UTC", "UTC0", "GMT", "GMT0", "Z", "Etc/UTC", "Etc/GMT", "Universal"]
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(name))
        {
            return Ok(Self::Utc);
        }
        if let Some(offset) = parse_fixed_offset(name) {
            return Ok(Self::Fixed(offset));
        }
        if name == "/etc/localtime" {
            return Ok(Self::Local);
        }
        let zone_name = name
            .split_once("zoneinfo/")
            .map_or(name, |(_, zone_name)| zone_name);
        zone_name
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ReleaseError::InvalidConfig {
                name: TZ_ENV,
                value: raw.to_string(),
                reason: "expected UTC, a ±HH:MM offset or an IANA zone name",
            })
    }
}

fn parse_fixed_offset(value: &str) -> Option<FixedOffset> {
    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|ch| *ch != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3_600 + minutes * 60))
}

/// Render `timestamp` in `zone` using a strftime-style `format`.
///
/// # Errors
///
/// Returns [`ReleaseError::InvalidDateFormat`] for unknown directives and
/// [`ReleaseError::TimestampOutOfRange`] when chrono cannot represent the
/// instant.
pub fn format_timestamp(timestamp: i64, zone: TimeZoneSpec, format: &str) -> ReleaseResult<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ReleaseError::InvalidDateFormat {
            format: format.to_string(),
        });
    }
    let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .ok_or(ReleaseError::TimestampOutOfRange { timestamp })?;
    let rendered = match zone {
        TimeZoneSpec::Utc => render(&utc, &items),
        TimeZoneSpec::Fixed(offset) => render(&utc.with_timezone(&offset), &items),
        TimeZoneSpec::Named(zone) => render(&utc.with_timezone(&zone), &items),
        TimeZoneSpec::Local => render(&utc.with_timezone(&Local), &items),
    };
    rendered.map_err(|_| ReleaseError::InvalidDateFormat {
        format: format.to_string(),
    })
}

fn render<Z>(moment: &DateTime<Z>, items: &[Item<'_>]) -> Result<String, fmt::Error>
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", moment.format_with_items(items.iter()))?;
    Ok(out)
}

/// Interpret a date expression as a timestamp.
///
/// Accepted forms: `@<seconds>`, RFC 3339 (`2014-05-14T16:53:20Z`),
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`. Forms
/// without an explicit offset are read as wall time in `zone`.
///
/// # Errors
///
/// Returns [`ReleaseError::InvalidDate`] when no form matches or the wall
/// time does not exist in `zone`.
pub fn parse_date_expression(value: &str, zone: TimeZoneSpec) -> ReleaseResult<i64> {
    let trimmed = value.trim();
    let invalid = |reason| ReleaseError::InvalidDate {
        value: value.to_string(),
        reason,
    };

    if let Some(seconds) = trimmed.strip_prefix('@') {
        return seconds
            .parse::<i64>()
            .map_err(|_| invalid("expected integer seconds after '@'"));
    }
    if let Ok(moment) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(moment.timestamp());
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| invalid("unrecognised date format"))?;

    let localized = match zone {
        TimeZoneSpec::Utc => localize(&Utc, &naive),
        TimeZoneSpec::Fixed(offset) => localize(&offset, &naive),
        TimeZoneSpec::Named(zone) => localize(&zone, &naive),
        TimeZoneSpec::Local => localize(&Local, &naive),
    };
    localized.ok_or_else(|| invalid("wall time does not exist in the configured zone"))
}

// Ambiguous wall times (DST fall-back) resolve to the earlier instant.
fn localize<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> Option<i64> {
    zone.from_local_datetime(naive)
        .earliest()
        .map(|moment| moment.timestamp())
}
