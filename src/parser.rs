//! Parser for cron patterns.
//!
//! `cronlaunch` uses [`CronParser`] to parse the cron expression. Invoking
//!
//! ```rust
//! # use std::str::FromStr as _;
//! #
//! # use cronlaunch::Cron;
//! #
//! Cron::from_str("*/5 * * * *");
//! ```
//!
//! is equivalent to
//!
//! ```rust
//! # use cronlaunch::parser::CronParser;
//! #
//! CronParser::new().parse("*/5 * * * *");
//! ```
//!
//! The default parser is lenient: a malformed or out-of-range token simply adds
//! no values to its field, and columns after the fifth (the command of a
//! crontab line) are ignored. Use [`CronParser::builder`] to ask for strict
//! validation instead:
//!
//! ```rust
//! use cronlaunch::parser::CronParser;
//!
//! let parser = CronParser::builder().strict(true).build();
//!
//! assert!(parser.parse("*/10 * * * *").is_ok());
//! assert!(parser.parse("*/10 * * * * /usr/bin/backup").is_err());
//! assert!(parser.parse("75 * * * *").is_err());
//! ```

use derive_builder::Builder;
use log::debug;

use crate::{
    component::{Field, FieldSet},
    errors::CronError,
    pattern::CronPattern,
    Cron,
};

/// Parser for cron patterns.
///
/// In order to build a custom cron parser use [`CronParser::builder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Builder)]
#[builder(default, build_fn(skip), pattern = "owned")]
pub struct CronParser {
    /// Reject malformed tokens, out-of-range values and extra columns.
    strict: bool,
}

impl CronParser {
    /// Create a new parser.
    ///
    /// You should probably be using [`Cron`]'s implementation of
    /// [`FromStr`][std::str::FromStr] instead of invoking this.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a builder for custom parsing.
    ///
    /// Equivalent to [`CronParserBuilder::default`].
    pub fn builder() -> CronParserBuilder {
        CronParserBuilder::default()
    }

    /// Parses the cron pattern string.
    pub fn parse(&self, pattern: &str) -> Result<Cron, CronError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(CronError::EmptyPattern);
        }

        let parts: Vec<&str> = pattern.split_whitespace().collect();
        if parts.len() < 5 {
            return Err(CronError::InvalidPattern(format!(
                "Pattern must consist of five fields (minute, hour, day of month, month, day of week), found {}.",
                parts.len()
            )));
        }
        if parts.len() > 5 && self.strict {
            return Err(CronError::InvalidPattern(format!(
                "Pattern must consist of exactly five fields, found {}.",
                parts.len()
            )));
        }

        let mut sets = Field::ALL.map(FieldSet::for_field);
        for (set, part) in sets.iter_mut().zip(&parts) {
            if self.strict {
                set.parse_strict(part)?;
            } else {
                set.parse(part);
            }
        }
        let [minutes, hours, days, months, days_of_week] = sets;

        let normalized = parts[..5].join(" ");
        let pattern = CronPattern::new(&normalized, minutes, hours, days, months, days_of_week)?;
        debug!(
            "parsed {:?}: minutes {} hours {} days {} months {} weekdays {}",
            normalized,
            pattern.minutes,
            pattern.hours,
            pattern.days,
            pattern.months,
            pattern.days_of_week
        );

        Ok(Cron { pattern })
    }
}

impl CronParserBuilder {
    pub fn build(self) -> CronParser {
        let CronParserBuilder { strict } = self;
        CronParser {
            strict: strict.unwrap_or_default(),
        }
    }
}
