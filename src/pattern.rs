use chrono::{Datelike, Duration, NaiveDate};

use crate::component::{Field, FieldSet};
use crate::errors::CronError;

// Parsed form of a five-field cron pattern.
// Day of week is stored with Sunday as 0 only; a 7 in the pattern is folded into 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CronPattern {
    pattern: String, // The five fields as written, single-space separated
    //
    pub minutes: FieldSet,      // -
    pub hours: FieldSet,        // --- Each column of the expression
    pub days: FieldSet,         // --- expanded into its sorted
    pub months: FieldSet,       // --- set of values
    pub days_of_week: FieldSet, // -

    // True when the column covers its whole domain, which makes it neutral
    // when combined with the other day column.
    dom_unrestricted: bool,
    dow_unrestricted: bool,
}

impl CronPattern {
    /// Builds a pattern from already expanded field sets.
    ///
    /// Fails with [`CronError::EmptyField`] when any set is empty.
    pub fn new(
        pattern: &str,
        minutes: FieldSet,
        hours: FieldSet,
        days: FieldSet,
        months: FieldSet,
        mut days_of_week: FieldSet,
    ) -> Result<Self, CronError> {
        // Sunday can be written as either 0 or 7
        if days_of_week.remove(7) {
            days_of_week.insert(0);
        }

        for (field, set) in [
            (Field::Minute, &minutes),
            (Field::Hour, &hours),
            (Field::DayOfMonth, &days),
            (Field::Month, &months),
            (Field::DayOfWeek, &days_of_week),
        ] {
            if set.is_empty() {
                return Err(CronError::EmptyField(field));
            }
        }

        let dom_unrestricted = days.is_full();
        let dow_unrestricted = (0..=6).all(|weekday| days_of_week.contains(weekday));

        Ok(Self {
            pattern: pattern.to_string(),
            minutes,
            hours,
            days,
            months,
            days_of_week,
            dom_unrestricted,
            dow_unrestricted,
        })
    }

    /// Days of `month` in `year` on which the pattern may fire.
    ///
    /// When both day columns are restricted a day qualifies through either of
    /// them. A column covering its whole domain contributes nothing, so the
    /// other column decides alone; if both are unrestricted every day qualifies.
    pub fn days_of(&self, year: i32, month: u32) -> Result<FieldSet, CronError> {
        let count = days_in_month(year, month)?;
        let mut result = FieldSet::new(1, count);

        if self.dom_unrestricted && self.dow_unrestricted {
            for day in 1..=count {
                result.insert(day);
            }
            return Ok(result);
        }

        if !self.dom_unrestricted {
            // 29-31 silently drop out of shorter months
            result.extend(&self.days);
        }

        if !self.dow_unrestricted {
            let first_weekday = first_weekday_of_month(year, month)?;
            for day in 1..=count {
                if self.days_of_week.contains((first_weekday + day - 1) % 7) {
                    result.insert(day);
                }
            }
        }

        Ok(result)
    }

    // This method checks if a given year, month, and day match the day part of the cron pattern.
    pub fn day_match(&self, year: i32, month: u32, day: u32) -> Result<bool, CronError> {
        Ok(self.days_of(year, month)?.contains(day))
    }

    pub fn month_match(&self, month: u32) -> bool {
        self.months.contains(month)
    }

    pub fn hour_match(&self, hour: u32) -> bool {
        self.hours.contains(hour)
    }

    pub fn minute_match(&self, minute: u32) -> bool {
        self.minutes.contains(minute)
    }

    // Get a reference to the original pattern
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl std::fmt::Display for CronPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// Number of days in the given month, leap years included.
pub fn days_in_month(year: i32, month: u32) -> Result<u32, CronError> {
    if month == 0 || month > 12 {
        return Err(CronError::InvalidDate);
    }

    // Create a date that should be the first day of the next month
    let next_month_year = if month == 12 { year + 1 } else { year };
    let next_month = if month == 12 { 1 } else { month + 1 };

    let next_month_date =
        NaiveDate::from_ymd_opt(next_month_year, next_month, 1).ok_or(CronError::InvalidDate)?;

    let last_day_date = next_month_date
        .checked_sub_signed(Duration::days(1))
        .ok_or(CronError::InvalidDate)?;

    Ok(last_day_date.day())
}

/// Weekday of the first day of the month, 0 = Sunday through 6 = Saturday.
pub fn first_weekday_of_month(year: i32, month: u32) -> Result<u32, CronError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(CronError::InvalidDate)?;
    Ok(first.weekday().num_days_from_sunday())
}
