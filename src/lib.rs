//! # cronlaunch
//!
//! Computes the next launch time of a classic five-field cron expression.
//!
//! ## Features
//! - Parses the Vixie cron column syntax: lists, ranges, steps and `*`.
//! - Finds the next matching minute with a field-by-field rollover search
//!   instead of scanning minute by minute.
//! - Combines day of month and day of week the way cron does: either column
//!   may match when both are restricted.
//! - Works with any `chrono` time zone, defaulting to the host's local time.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use cronlaunch::Cron;
//!
//! // Every Wednesday at midnight
//! let cron: Cron = "0 0 * * 3".parse().expect("Successful parsing");
//!
//! let reference = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
//! let next = cron.find_next_launch(&reference).unwrap();
//!
//! assert_eq!(next, Utc.with_ymd_and_hms(2013, 1, 2, 0, 0, 0).unwrap());
//! ```
//!
//! The result is always strictly later than the reference time, so feeding each
//! result back in walks through the schedule; [`Cron::iter_after`] does exactly that.
//!
//! ## Pattern
//!
//! ```text
//! ┌────────────── minute (0 - 59)
//! │ ┌──────────── hour (0 - 23)
//! │ │ ┌────────── day of month (1 - 31)
//! │ │ │ ┌──────── month (1 - 12)
//! │ │ │ │ ┌────── day of week (0 - 7, 0 and 7 are Sunday)
//! │ │ │ │ │
//! * * * * *
//! ```
//!
//! Each column is a comma separated list of `*`, `N` or `N-M`, each optionally
//! followed by `/step`. A single number with a step (`1/2`) is just that number.
//! By default the parser is lenient: tokens it cannot read add nothing to their
//! column. See [`parser::CronParser`] for the strict alternative. A column that
//! ends up matching nothing is rejected with [`errors::CronError::EmptyField`].

pub mod clock;
pub mod component;
pub mod errors;
pub mod iterator;
pub mod parser;
pub mod pattern;
mod search;

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Timelike,
};
use log::trace;

use clock::{Clock, SystemClock};
use errors::CronError;
use iterator::LaunchIterator;
use parser::CronParser;
use pattern::CronPattern;

// The Cron struct represents a parsed cron schedule and provides methods to
// find launch times and check whether a time matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cron {
    pub pattern: CronPattern, // Parsed cron pattern
}

impl Cron {
    /// Parses `pattern` with the default, lenient parser.
    pub fn parse(pattern: &str) -> Result<Cron, CronError> {
        CronParser::new().parse(pattern)
    }

    /// Evaluates if a given `DateTime` falls on a minute matched by the pattern.
    ///
    /// Seconds are ignored. The day is checked against the combined day of
    /// month and day of week columns for the month of `time`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use cronlaunch::Cron;
    ///
    /// let cron = Cron::parse("30 9 * * 1-5").unwrap();
    ///
    /// // Monday the 7th of January 2013
    /// let monday = Utc.with_ymd_and_hms(2013, 1, 7, 9, 30, 15).unwrap();
    /// let sunday = Utc.with_ymd_and_hms(2013, 1, 6, 9, 30, 0).unwrap();
    ///
    /// assert!(cron.is_time_matching(&monday).unwrap());
    /// assert!(!cron.is_time_matching(&sunday).unwrap());
    /// ```
    pub fn is_time_matching<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> Result<bool, CronError> {
        let naive_time = time.naive_local();

        Ok(self.pattern.minute_match(naive_time.minute())
            && self.pattern.hour_match(naive_time.hour())
            && self.pattern.month_match(naive_time.month())
            && self
                .pattern
                .day_match(naive_time.year(), naive_time.month(), naive_time.day())?)
    }

    /// Finds the next launch time strictly after `reference`.
    ///
    /// The search runs on the wall-clock fields of `reference` in its own time
    /// zone and the result carries the same zone, with seconds set to zero.
    /// If `reference` already lies on a matching minute, the following match
    /// is returned. When clocks are turned back, matching wall times inside
    /// the repeated span launch in both passes.
    ///
    /// # Errors
    ///
    /// - `CronError::TimeSearchLimitExceeded`: the pattern has no matching day
    ///   within four centuries, e.g. `0 0 30 2 *`.
    /// - `CronError::InvalidDate`: the search ran past the dates chrono can represent.
    /// - `CronError::InvalidTime`: the launch time cannot be placed in the time zone.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use cronlaunch::Cron;
    ///
    /// let cron = Cron::parse("5 * * * *").unwrap();
    /// let reference = Utc.with_ymd_and_hms(2013, 1, 1, 0, 5, 0).unwrap();
    ///
    /// assert_eq!(
    ///     cron.find_next_launch(&reference).unwrap(),
    ///     Utc.with_ymd_and_hms(2013, 1, 1, 1, 5, 0).unwrap()
    /// );
    /// ```
    pub fn find_next_launch<Tz: TimeZone>(
        &self,
        reference: &DateTime<Tz>,
    ) -> Result<DateTime<Tz>, CronError> {
        let mut seed = reference.clone();
        let mut launch = self.launch_from(&seed)?;
        if launch <= *reference {
            // The reference minute itself matched; search again from the next minute
            seed = reference
                .clone()
                .checked_add_signed(Duration::minutes(1))
                .ok_or(CronError::InvalidTime)?;
            trace!("'{}' matched the reference minute, retrying", self.pattern);
            launch = self.launch_from(&seed)?;
        }

        // Wall times behind the seed come around again once clocks are turned back
        if let Some(replay) = replay_start(&seed) {
            let replayed = self.launch_from(&replay)?;
            if replayed > *reference && (launch <= *reference || replayed < launch) {
                trace!("'{}' launches again in the repeated hour", self.pattern);
                launch = replayed;
            }
        }

        if launch > *reference {
            Ok(launch)
        } else {
            Err(CronError::TimeSearchLimitExceeded)
        }
    }

    /// Finds the next launch time after the current time of `clock`.
    pub fn next_launch_now<C: Clock>(&self, clock: &C) -> Result<DateTime<C::Tz>, CronError> {
        self.find_next_launch(&clock.now())
    }

    /// Creates a `LaunchIterator` yielding the launch times after `start_after`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use cronlaunch::Cron;
    ///
    /// let cron = Cron::parse("0 0 1 * *").unwrap();
    /// let start = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
    ///
    /// let months: Vec<u32> = cron.iter_after(start).take(3).map(|t| chrono::Datelike::month(&t)).collect();
    /// assert_eq!(months, vec![2, 3, 4]);
    /// ```
    pub fn iter_after<Tz: TimeZone>(&self, start_after: DateTime<Tz>) -> LaunchIterator<Tz> {
        LaunchIterator::new(self.clone(), start_after)
    }

    fn launch_from<Tz: TimeZone>(
        &self,
        seed: &DateTime<Tz>,
    ) -> Result<DateTime<Tz>, CronError> {
        let naive = search::next_candidate(&self.pattern, &seed.naive_local())?;
        from_naive(naive, seed)
    }
}

// Enables creating a Cron instance from a string slice, returning a CronError if parsing fails.
impl FromStr for Cron {
    type Err = CronError;

    fn from_str(pattern: &str) -> Result<Cron, CronError> {
        Cron::parse(pattern)
    }
}

impl std::fmt::Display for Cron {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Cron {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.pattern.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Cron {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CronVisitor;

        impl serde::de::Visitor<'_> for CronVisitor {
            type Value = Cron;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a five-field cron pattern")
            }

            fn visit_str<E>(self, value: &str) -> Result<Cron, E>
            where
                E: serde::de::Error,
            {
                Cron::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(CronVisitor)
    }
}

/// Next launch time of `pattern` as seconds since the Unix epoch.
///
/// Calendar fields are taken in the host's local time zone. Without a
/// `reference` the current time of the system clock is used.
///
/// ```
/// let reference = 1_357_000_000; // 2012-12-31T00:26:40Z
/// let next = cronlaunch::next_launch("* * * * *", Some(reference)).unwrap();
///
/// assert_eq!(next, reference - reference % 60 + 60);
/// ```
pub fn next_launch(pattern: &str, reference: Option<i64>) -> Result<i64, CronError> {
    let cron = Cron::parse(pattern)?;
    let launch = match reference {
        Some(seconds) => {
            let reference = Local
                .timestamp_opt(seconds, 0)
                .single()
                .ok_or(CronError::InvalidTime)?;
            cron.find_next_launch(&reference)?
        }
        None => cron.next_launch_now(&SystemClock)?,
    };
    Ok(launch.timestamp())
}

// Convert `NaiveDateTime` back to `DateTime<Tz>` in the zone of `seed`.
// A wall time repeated by a backward shift resolves to the pass that is not
// before the minute of `seed`; a wall time skipped by a forward shift moves
// one hour later.
fn from_naive<Tz: TimeZone>(
    naive_time: NaiveDateTime,
    seed: &DateTime<Tz>,
) -> Result<DateTime<Tz>, CronError> {
    let timezone = seed.timezone();
    match timezone.from_local_datetime(&naive_time) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, latest) => {
            if earliest.naive_utc() + Duration::minutes(1) > seed.naive_utc() {
                Ok(earliest)
            } else {
                Ok(latest)
            }
        }
        LocalResult::None => {
            let shifted = naive_time
                .checked_add_signed(Duration::hours(1))
                .ok_or(CronError::InvalidTime)?;
            match timezone.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => Ok(dt),
                LocalResult::Ambiguous(earliest, _) => Ok(earliest),
                LocalResult::None => Err(CronError::InvalidTime),
            }
        }
    }
}

// Instant at which the wall clock starts repeating, when `seed` lies in the
// first pass of a span that is repeated by a backward shift.
fn replay_start<Tz: TimeZone>(seed: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let timezone = seed.timezone();
    let LocalResult::Ambiguous(earliest, latest) =
        timezone.from_local_datetime(&seed.naive_local())
    else {
        return None;
    };
    if seed.offset().fix() != earliest.offset().fix() {
        return None;
    }

    // The offset changes somewhere between the two passes of the seed's wall time
    let repeated = latest.offset().fix();
    let mut before = seed.naive_utc();
    let mut after = latest.naive_utc();
    while after - before > Duration::seconds(1) {
        let middle = before + (after - before) / 2;
        if timezone.offset_from_utc_datetime(&middle).fix() == repeated {
            after = middle;
        } else {
            before = middle;
        }
    }
    Some(timezone.from_utc_datetime(&after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{FixedOffset, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_is_time_matching() -> Result<(), CronError> {
        let cron = Cron::parse("0 9 1 1 *")?;
        assert!(cron.is_time_matching(&utc(2023, 1, 1, 9, 0, 0))?);
        assert!(cron.is_time_matching(&utc(2023, 1, 1, 9, 0, 59))?);
        assert!(!cron.is_time_matching(&utc(2023, 1, 1, 10, 0, 0))?);
        assert!(!cron.is_time_matching(&utc(2023, 1, 2, 9, 0, 0))?);
        Ok(())
    }

    #[test]
    fn test_is_time_matching_union_of_day_columns() -> Result<(), CronError> {
        // The 1st, and every Monday
        let cron = Cron::parse("0 12 1 * 1")?;
        assert!(cron.is_time_matching(&utc(2025, 7, 1, 12, 0, 0))?); // a Tuesday
        assert!(cron.is_time_matching(&utc(2025, 7, 14, 12, 0, 0))?); // a Monday
        assert!(!cron.is_time_matching(&utc(2025, 7, 15, 12, 0, 0))?);
        Ok(())
    }

    #[test]
    fn test_find_next_minute() -> Result<(), CronError> {
        let cron = Cron::parse("* * * * *")?;
        let next = cron.find_next_launch(&utc(2023, 1, 1, 0, 0, 29))?;
        assert_eq!(next, utc(2023, 1, 1, 0, 1, 0));
        Ok(())
    }

    #[test]
    fn test_exact_match_is_excluded() -> Result<(), CronError> {
        let cron = Cron::parse("59 23 * * *")?;
        let next = cron.find_next_launch(&utc(2023, 3, 14, 23, 59, 0))?;
        assert_eq!(next, utc(2023, 3, 15, 23, 59, 0));
        Ok(())
    }

    #[test]
    fn test_wrap_month_and_year() -> Result<(), CronError> {
        let cron = Cron::parse("0 15 * * *")?;
        let next = cron.find_next_launch(&utc(2023, 12, 31, 16, 0, 0))?;
        assert_eq!(next, utc(2024, 1, 1, 15, 0, 0));
        Ok(())
    }

    #[test]
    fn test_time_overflow() -> Result<(), CronError> {
        let cron_match = Cron::parse("59 23 31 12 *")?;
        let cron_next = Cron::parse("0 0 1 1 *")?;
        let time_matching = utc(2023, 12, 31, 23, 59, 0);

        assert!(cron_match.is_time_matching(&time_matching)?);
        assert_eq!(cron_next.find_next_launch(&time_matching)?, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(
            cron_match.find_next_launch(&time_matching)?,
            utc(2024, 12, 31, 23, 59, 0)
        );
        Ok(())
    }

    #[test]
    fn test_weekday_pattern_alone() -> Result<(), CronError> {
        let cron = Cron::parse("15 9 * * 1")?;
        let runs: Vec<_> = cron.iter_after(utc(2022, 2, 28, 23, 59, 0)).take(3).collect();
        assert_eq!(
            runs,
            vec![
                utc(2022, 3, 7, 9, 15, 0),
                utc(2022, 3, 14, 9, 15, 0),
                utc(2022, 3, 21, 9, 15, 0),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_weekday_pattern_combined_with_day_of_month() -> Result<(), CronError> {
        // The 2nd of every month, and every Saturday
        let cron = Cron::parse("59 23 2 * 6")?;
        let runs: Vec<_> = cron.iter_after(utc(2022, 1, 31, 0, 0, 0)).take(6).collect();
        let days: Vec<(u32, u32)> = runs.iter().map(|t| (t.month(), t.day())).collect();
        assert_eq!(days, vec![(2, 2), (2, 5), (2, 12), (2, 19), (2, 26), (3, 2)]);
        Ok(())
    }

    #[test]
    fn test_non_standard_intervals_with_offset() -> Result<(), CronError> {
        let cron = Cron::parse("7-59/29 2-23/13 * * *")?;
        let mut iter = cron.iter_after(utc(2023, 1, 1, 0, 0, 0));
        assert_eq!(iter.next(), Some(utc(2023, 1, 1, 2, 7, 0)));
        assert_eq!(iter.next(), Some(utc(2023, 1, 1, 2, 36, 0)));
        assert_eq!(iter.next(), Some(utc(2023, 1, 1, 15, 7, 0)));
        Ok(())
    }

    #[test]
    fn test_large_time_jump() -> Result<(), CronError> {
        let cron = Cron::parse("0 0 * * *")?;
        let next_run = cron.iter_after(utc(2020, 1, 1, 0, 0, 0)).nth(365 * 5); // 2020 is a leap year
        assert_eq!(next_run, Some(utc(2025, 1, 1, 0, 0, 0)));
        Ok(())
    }

    #[test]
    fn test_fixed_offset_keeps_zone() -> Result<(), CronError> {
        let east = FixedOffset::east_opt(3600).unwrap();
        let cron = Cron::parse("0 12 * * *")?;
        let reference = east.with_ymd_and_hms(2023, 1, 1, 12, 30, 0).unwrap();
        let next = cron.find_next_launch(&reference)?;
        assert_eq!(next, east.with_ymd_and_hms(2023, 1, 2, 12, 0, 0).unwrap());
        assert_eq!(next.offset(), &east);
        Ok(())
    }

    #[test]
    fn test_first_pass_of_repeated_hour() -> Result<(), CronError> {
        use chrono_tz::Europe::Stockholm;

        // 00:59:30 UTC is 02:59:30 CEST; at 01:00 UTC the wall clock shows 02:00 again
        let reference = utc(2013, 10, 27, 0, 59, 30).with_timezone(&Stockholm);
        let every_minute = Cron::parse("* * * * *")?;
        assert_eq!(every_minute.find_next_launch(&reference)?, utc(2013, 10, 27, 1, 0, 0));

        let quarterly = Cron::parse("*/15 * * * *")?;
        let reference = utc(2013, 10, 27, 0, 45, 10).with_timezone(&Stockholm);
        let launches: Vec<_> = quarterly.iter_after(reference).take(4).collect();
        assert_eq!(
            launches,
            vec![
                utc(2013, 10, 27, 1, 0, 0),
                utc(2013, 10, 27, 1, 15, 0),
                utc(2013, 10, 27, 1, 30, 0),
                utc(2013, 10, 27, 1, 45, 0),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_repeated_hour_launches_in_both_passes() -> Result<(), CronError> {
        use chrono_tz::Europe::Stockholm;

        let cron = Cron::parse("30 2 * * *")?;
        let start = utc(2013, 10, 26, 12, 0, 0).with_timezone(&Stockholm);
        let launches: Vec<_> = cron.iter_after(start).take(3).collect();
        assert_eq!(
            launches,
            vec![
                utc(2013, 10, 27, 0, 30, 0),
                utc(2013, 10, 27, 1, 30, 0),
                utc(2013, 10, 28, 1, 30, 0),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_next_launch_now_uses_clock() -> Result<(), CronError> {
        let clock = FixedClock::new(utc(2013, 1, 1, 0, 0, 0));
        let cron = Cron::parse("0 0 2 1 *")?;
        assert_eq!(cron.next_launch_now(&clock)?, utc(2013, 1, 2, 0, 0, 0));
        Ok(())
    }

    #[test]
    fn test_never_matching_pattern() {
        let cron = Cron::parse("0 0 31 4 *").unwrap();
        assert_eq!(
            cron.find_next_launch(&utc(2023, 1, 1, 0, 0, 0)),
            Err(CronError::TimeSearchLimitExceeded)
        );
    }

    #[test]
    fn test_next_launch_epoch_seconds() -> Result<(), CronError> {
        // 2013-01-15T10:20:30Z; whole-minute offsets keep the minute grid aligned
        let reference = 1_358_245_230;
        assert_eq!(next_launch("* * * * *", Some(reference))?, 1_358_245_260);
        Ok(())
    }

    #[test]
    fn test_next_launch_without_reference_is_in_the_future() -> Result<(), CronError> {
        let before = Local::now().timestamp();
        assert!(next_launch("* * * * *", None)? > before);
        Ok(())
    }

    #[test]
    fn test_display_round_trip() {
        let cron = Cron::parse(" 10  0 2 1/2,7,5,3 * ").unwrap();
        assert_eq!(cron.to_string(), "10 0 2 1/2,7,5,3 *");
        assert_eq!(Cron::parse(&cron.to_string()).unwrap(), cron);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_tokens() {
        use serde_test::{assert_de_tokens_error, assert_tokens, Token};

        let cron = Cron::parse("*/5 * * * *").unwrap();
        assert_tokens(&cron, &[Token::Str("*/5 * * * *")]);
        assert_de_tokens_error::<Cron>(
            &[Token::Str("* * *")],
            "Invalid pattern: Pattern must consist of five fields (minute, hour, day of month, month, day of week), found 3.",
        );
    }
}
