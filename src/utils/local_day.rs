//! Local calendar-day bucketing and timestamp formatting.
//!
//! A "local day" is always resolved in the viewer's timezone at the time of
//! computation. Recomputing from another timezone can move sets between days.

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::{AppError, AppResult};

/// Hours probed past midnight when midnight itself falls into a DST gap.
const MAX_GAP_PROBE_HOURS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerTimezone {
    /// The host's local timezone.
    #[default]
    System,
    Named(Tz),
}

impl ViewerTimezone {
    pub fn parse(value: Option<&str>) -> AppResult<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(ViewerTimezone::System),
            Some(name) => name
                .parse::<Tz>()
                .map(ViewerTimezone::Named)
                .map_err(|_| AppError::validation(format!("unknown timezone: {name}"))),
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        match self {
            ViewerTimezone::System => None,
            ViewerTimezone::Named(tz) => Some(tz.name()),
        }
    }

    pub fn local_date(&self, at: &DateTime<Utc>) -> NaiveDate {
        match self {
            ViewerTimezone::System => at.with_timezone(&Local).date_naive(),
            ViewerTimezone::Named(tz) => at.with_timezone(tz).date_naive(),
        }
    }

    /// First instant of `day` in this timezone, normally local midnight.
    pub fn day_start(&self, day: NaiveDate) -> DateTime<Utc> {
        match self {
            ViewerTimezone::System => first_instant_of_day(&Local, day),
            ViewerTimezone::Named(tz) => first_instant_of_day(tz, day),
        }
    }

    /// Half-open `[start, end)` interval covering `day`.
    pub fn day_bounds(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.day_start(day);
        let end = match day.succ_opt() {
            Some(next) => self.day_start(next),
            None => start + Duration::days(1),
        };
        (start, end)
    }
}

fn first_instant_of_day<Z: TimeZone>(zone: &Z, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    for hours in 0..=MAX_GAP_PROBE_HOURS {
        let candidate = midnight + Duration::hours(hours);
        match zone.from_local_datetime(&candidate) {
            LocalResult::Single(at) => return at.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => continue,
        }
    }
    Utc.from_utc_datetime(&midnight)
}

/// Canonical storage format: UTC, millisecond precision, `Z` suffix.
/// Strings in this format sort chronologically.
pub fn to_iso(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_iso(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| AppError::validation(format!("invalid timestamp '{value}': {err}")))
}
