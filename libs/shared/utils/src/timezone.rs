//! UTC <-> wall-clock conversions on top of the IANA database.
//!
//! Stored instants are always UTC. Local values carry their offset
//! (`DateTime<Tz>`), which is what makes `to_utc(to_local(t, z)) == t` hold even
//! inside the repeated hour of a fall-back transition. Only naive wall-clock
//! input (a date picked in a calendar, midnight of a day) needs a resolution rule:
//!
//! - ambiguous (fall-back overlap): the earliest instant, i.e. the pre-transition offset;
//! - nonexistent (spring-forward gap): read with the offset in force before the gap,
//!   which lands the instant just after the transition.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

use shared_models::error::{AppError, SchedulingError, ValidationKind};
use shared_models::time_window::TimeWindow;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimezoneError {
    #[error("Unknown timezone: '{0}'")]
    UnknownZone(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(NaiveDate),

    #[error("Date {0} does not exist in this zone")]
    SkippedDay(NaiveDate),
}

impl From<TimezoneError> for AppError {
    fn from(err: TimezoneError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<TimezoneError> for SchedulingError {
    fn from(_: TimezoneError) -> Self {
        SchedulingError::Validation(ValidationKind::InvalidRange)
    }
}

/// A window rendered for display in one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRange {
    pub start: String,
    pub end: String,
    pub label: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TimezoneTranslator;

impl TimezoneTranslator {
    pub fn parse_zone(zone_id: &str) -> Result<Tz, TimezoneError> {
        zone_id
            .trim()
            .parse::<Tz>()
            .map_err(|_| TimezoneError::UnknownZone(zone_id.to_string()))
    }

    pub fn to_local(instant: DateTime<Utc>, zone: Tz) -> DateTime<Tz> {
        instant.with_timezone(&zone)
    }

    pub fn to_utc(local: &DateTime<Tz>) -> DateTime<Utc> {
        local.with_timezone(&Utc)
    }

    /// Pins a naive wall-clock time in `zone` using the module-level rules.
    pub fn resolve_local(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Tz>, TimezoneError> {
        match zone.from_local_datetime(&naive) {
            LocalResult::Single(local) => Ok(local),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest),
            LocalResult::None => {
                let out_of_range = || TimezoneError::DateOutOfRange(naive.date());
                let day_before = naive
                    .checked_sub_signed(Duration::hours(24))
                    .ok_or_else(out_of_range)?;
                let before_gap = zone.offset_from_utc_datetime(&day_before);
                let utc = naive
                    .checked_sub_signed(Duration::seconds(before_gap.fix().local_minus_utc() as i64))
                    .ok_or_else(out_of_range)?;
                Ok(Utc.from_utc_datetime(&utc).with_timezone(&zone))
            }
        }
    }

    pub fn local_to_utc(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Utc>, TimezoneError> {
        Self::resolve_local(naive, zone).map(|local| Self::to_utc(&local))
    }

    /// `[local midnight, next local midnight)` of `date`; 23h or 25h on transition days.
    ///
    /// A date the zone jumped over entirely (Pacific/Apia, 2011-12-30) is `SkippedDay`.
    pub fn day_window(date: NaiveDate, zone: Tz) -> Result<TimeWindow, TimezoneError> {
        let next = date.succ_opt().ok_or(TimezoneError::DateOutOfRange(date))?;
        let start = Self::local_to_utc(date.and_time(NaiveTime::MIN), zone)?;
        let end = Self::local_to_utc(next.and_time(NaiveTime::MIN), zone)?;
        if end <= start {
            return Err(TimezoneError::SkippedDay(date));
        }
        TimeWindow::new(start, end).map_err(|_| TimezoneError::DateOutOfRange(date))
    }

    pub fn format_range(start: DateTime<Utc>, end: DateTime<Utc>, zone: Tz) -> DisplayRange {
        let local_start = Self::to_local(start, zone);
        let local_end = Self::to_local(end, zone);

        let label = if local_start.date_naive() == local_end.date_naive() {
            format!(
                "{} {}-{} {}",
                local_start.format("%Y-%m-%d"),
                local_start.format("%H:%M"),
                local_end.format("%H:%M"),
                local_end.format("%Z"),
            )
        } else {
            format!(
                "{} - {}",
                local_start.format("%Y-%m-%d %H:%M %Z"),
                local_end.format("%Y-%m-%d %H:%M %Z"),
            )
        };

        DisplayRange {
            start: local_start.to_rfc3339(),
            end: local_end.to_rfc3339(),
            label,
        }
    }
}
