//! Rollover search for the next launch time.
//!
//! The reference time is decomposed into calendar fields and compared with the
//! pattern from the coarsest field down. The first field that does not match is
//! moved to the closest greater allowed value; when there is none it wraps and
//! carries into the next coarser field, exactly like digits of an odometer.
//! Fields finer than the one that moved are left unset and resolved to the
//! smallest allowed value at the end.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::trace;

use crate::component::{Field, FieldSet, Rollover};
use crate::errors::CronError;
use crate::pattern::CronPattern;

// Months whose day set is empty (for example `31 2`) are skipped; give up after 400 years of them.
const MONTH_SKIP_LIMIT: u32 = 400 * 12;

// Fields the rollover walks through, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Minute,
    Hour,
    Day,
    Month,
}

impl Level {
    fn coarser(self) -> Level {
        match self {
            Level::Minute => Level::Hour,
            Level::Hour => Level::Day,
            Level::Day | Level::Month => Level::Month,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Minute => "minute",
            Level::Hour => "hour",
            Level::Day => "day",
            Level::Month => "month",
        };
        f.write_str(name)
    }
}

/// A launch time under construction.
///
/// `None` marks a field that was reset by a carry and still has to be filled
/// with its smallest allowed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub year: i32,
    pub month: u32,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
}

impl Candidate {
    fn from_seed(seed: &NaiveDateTime) -> Self {
        Self {
            year: seed.year(),
            month: seed.month(),
            day: Some(seed.day()),
            hour: Some(seed.hour()),
            minute: Some(seed.minute()),
        }
    }

    // Sets `level` and unsets everything finer.
    fn settle(&mut self, level: Level, value: u32) {
        match level {
            Level::Month => {
                self.month = value;
                self.day = None;
                self.hour = None;
                self.minute = None;
            }
            Level::Day => {
                self.day = Some(value);
                self.hour = None;
                self.minute = None;
            }
            Level::Hour => {
                self.hour = Some(value);
                self.minute = None;
            }
            Level::Minute => self.minute = Some(value),
        }
    }

    // Moves the month forward, wrapping into the next year.
    fn advance_month(&mut self, months: &FieldSet) -> Result<(), CronError> {
        match months.closest_next(self.month) {
            Rollover::Next(month) => self.settle(Level::Month, month),
            Rollover::Carry => {
                trace!("month carried into year {}", self.year);
                let first = months.first().ok_or(CronError::EmptyField(Field::Month))?;
                self.year = self.year.checked_add(1).ok_or(CronError::InvalidDate)?;
                self.settle(Level::Month, first);
            }
        }
        Ok(())
    }

    /// Fills unset fields with the smallest allowed values and composes the wall time.
    pub fn resolve(mut self, pattern: &CronPattern) -> Result<NaiveDateTime, CronError> {
        let day = match self.day {
            Some(day) => day,
            None => self.first_day(pattern)?,
        };
        let hour = match self.hour {
            Some(hour) => hour,
            None => pattern.hours.first().ok_or(CronError::EmptyField(Field::Hour))?,
        };
        let minute = match self.minute {
            Some(minute) => minute,
            None => pattern
                .minutes
                .first()
                .ok_or(CronError::EmptyField(Field::Minute))?,
        };

        NaiveDate::from_ymd_opt(self.year, self.month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .ok_or(CronError::InvalidDate)
    }

    // First allowed day of the candidate month, moving on to later months while
    // the month has no allowed day at all.
    fn first_day(&mut self, pattern: &CronPattern) -> Result<u32, CronError> {
        for _ in 0..MONTH_SKIP_LIMIT {
            if let Some(day) = pattern.days_of(self.year, self.month)?.first() {
                return Ok(day);
            }
            trace!("no matching day in {}-{:02}", self.year, self.month);
            self.advance_month(&pattern.months)?;
        }
        Err(CronError::TimeSearchLimitExceeded)
    }
}

/// Smallest wall time, at minute resolution, that is not earlier than the
/// minute of `seed` and matches `pattern`.
///
/// When `seed` itself falls on a matching minute the result is that minute with
/// seconds truncated, which can be earlier than `seed`; callers needing a
/// strictly later time retry from the following minute.
pub(crate) fn next_candidate(
    pattern: &CronPattern,
    seed: &NaiveDateTime,
) -> Result<NaiveDateTime, CronError> {
    let mut candidate = Candidate::from_seed(seed);

    if !pattern.month_match(candidate.month) {
        candidate.advance_month(&pattern.months)?;
        return candidate.resolve(pattern);
    }

    // Day set of the seed month; months reached by a carry get theirs in `resolve`
    let days = pattern.days_of(candidate.year, candidate.month)?;

    let mut level = if !days.contains(seed.day()) {
        Level::Day
    } else if !pattern.hour_match(seed.hour()) {
        Level::Hour
    } else if !pattern.minute_match(seed.minute()) {
        Level::Minute
    } else {
        return candidate.resolve(pattern);
    };

    // Carry upwards until some field can move forward without wrapping
    loop {
        let (set, current) = match level {
            Level::Minute => (&pattern.minutes, seed.minute()),
            Level::Hour => (&pattern.hours, seed.hour()),
            Level::Day => (&days, seed.day()),
            Level::Month => {
                candidate.advance_month(&pattern.months)?;
                break;
            }
        };

        match set.closest_next(current) {
            Rollover::Next(value) => {
                candidate.settle(level, value);
                break;
            }
            Rollover::Carry => {
                trace!("{level} wrapped at {current}");
                level = level.coarser();
            }
        }
    }

    candidate.resolve(pattern)
}
