use crate::component::Field;

/// Represents errors that can occur while parsing cron patterns and computing launch times.
///
/// `CronError` is used throughout the `cronlaunch` crate to indicate failures
/// and is exported for consuming programs to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronError {
    /// The pattern string provided was empty or contained only whitespace.
    EmptyPattern,

    /// The pattern does not have the expected shape.
    ///
    /// Includes a message such as "Pattern must consist of five fields."
    InvalidPattern(String),

    /// A field expanded to no values at all.
    ///
    /// A cron field that matches nothing can never produce a launch time, so such
    /// patterns are rejected when parsed rather than when searched.
    EmptyField(Field),

    /// A token of a field was rejected by the strict parser.
    ///
    /// Includes a message such as "Value 61 is out of bounds for the current range (0-59)."
    ComponentError(String),

    /// A composed calendar date could not be represented.
    InvalidDate,

    /// A composed wall-clock time does not exist in the time zone of the reference.
    InvalidTime,

    /// The search gave up without finding a later launch time.
    ///
    /// Happens when no day within the search horizon satisfies the pattern, for
    /// example `0 0 31 2 *`.
    TimeSearchLimitExceeded,
}

impl std::fmt::Display for CronError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CronError::EmptyPattern => write!(f, "Cron pattern cannot be an empty string."),
            CronError::InvalidPattern(msg) => write!(f, "Invalid pattern: {msg}"),
            CronError::EmptyField(field) => {
                write!(f, "The {field} field does not match any value.")
            }
            CronError::ComponentError(msg) => write!(f, "Component error: {msg}"),
            CronError::InvalidDate => write!(f, "Launch search encountered an invalid date."),
            CronError::InvalidTime => write!(f, "Launch search encountered an invalid time."),
            CronError::TimeSearchLimitExceeded => {
                write!(f, "Launch search limit exceeded.")
            }
        }
    }
}

impl std::error::Error for CronError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_field() {
        let err = CronError::EmptyField(Field::DayOfWeek);
        assert_eq!(err.to_string(), "The day-of-week field does not match any value.");
    }

    #[test]
    fn test_display_invalid_pattern() {
        let err = CronError::InvalidPattern("Pattern must consist of five fields.".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid pattern: Pattern must consist of five fields."
        );
    }
}
