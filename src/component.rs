use strum::{Display, EnumIs};

use crate::errors::CronError;

/// The five columns of a cron pattern, in pattern order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIs)]
pub enum Field {
    #[strum(serialize = "minute")]
    Minute,
    #[strum(serialize = "hour")]
    Hour,
    #[strum(serialize = "day-of-month")]
    DayOfMonth,
    #[strum(serialize = "month")]
    Month,
    #[strum(serialize = "day-of-week")]
    DayOfWeek,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Minute,
        Field::Hour,
        Field::DayOfMonth,
        Field::Month,
        Field::DayOfWeek,
    ];

    /// Inclusive domain of the field. Day of week accepts both 0 and 7 for Sunday.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            Field::Minute => (0, 59),
            Field::Hour => (0, 23),
            Field::DayOfMonth => (1, 31),
            Field::Month => (1, 12),
            Field::DayOfWeek => (0, 7),
        }
    }
}

/// Outcome of looking up the closest member after a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum Rollover {
    /// A member strictly greater than the value exists.
    Next(u32),
    /// No greater member; the next coarser field has to advance.
    Carry,
}

/// Sorted set of distinct values within `min..=max`, stored as a bitmask.
///
/// Every cron domain fits in 64 bits, so membership and "next greater"
/// lookups are single mask operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldSet {
    bits: u64,
    pub min: u32,
    pub max: u32,
}

impl FieldSet {
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            bits: 0,
            min,
            max: max.min(63),
        }
    }

    /// Empty set for the domain of `field`.
    pub fn for_field(field: Field) -> Self {
        let (min, max) = field.bounds();
        Self::new(min, max)
    }

    /// Adds `value`; values outside the domain are ignored.
    pub fn insert(&mut self, value: u32) -> bool {
        if value < self.min || value > self.max {
            return false;
        }
        self.bits |= 1u64 << value;
        true
    }

    pub fn remove(&mut self, value: u32) -> bool {
        let present = self.contains(value);
        if present {
            self.bits &= !(1u64 << value);
        }
        present
    }

    pub fn contains(&self, value: u32) -> bool {
        value <= 63 && self.bits & (1u64 << value) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Smallest member.
    pub fn first(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(self.bits.trailing_zeros())
        }
    }

    /// Smallest member strictly greater than `value`, or `Carry` when there is none.
    ///
    /// On `Carry` the field wraps to `first()`; callers reset it together with
    /// every finer field, so the wrapped value itself is not returned.
    pub fn closest_next(&self, value: u32) -> Rollover {
        let above = match 1u64.checked_shl(value.saturating_add(1)) {
            Some(lowest) => self.bits & !(lowest - 1),
            None => 0,
        };
        if above == 0 {
            Rollover::Carry
        } else {
            Rollover::Next(above.trailing_zeros())
        }
    }

    /// True when every value of `min..=max` is a member.
    pub fn is_full(&self) -> bool {
        (self.min..=self.max).all(|value| self.contains(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (self.min..=self.max).filter(move |&value| self.contains(value))
    }

    /// Adds every member of `other` that lies in this set's domain.
    pub fn extend(&mut self, other: &FieldSet) {
        for value in other.iter() {
            self.insert(value);
        }
    }

    /// Parses a comma separated list of `range[/step]` expressions.
    ///
    /// Malformed or out-of-domain expressions contribute no values.
    pub fn parse(&mut self, spec: &str) {
        for part in spec.split(',') {
            if let Some((start, end, step)) = self.lenient_range(part) {
                self.fill(start, end, step);
            }
        }
    }

    /// Like [`FieldSet::parse`], but every expression must be well formed and in bounds.
    pub fn parse_strict(&mut self, spec: &str) -> Result<(), CronError> {
        for part in spec.split(',') {
            let (start, end, step) = self.strict_range(part)?;
            self.fill(start, end, step);
        }
        Ok(())
    }

    fn fill(&mut self, start: u32, end: u32, step: u32) {
        let mut value = start;
        while value <= end {
            self.insert(value);
            value = match value.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    }

    // Start clamped up to min and end clamped down to max. A step that is
    // missing, unreadable or below one counts as one.
    fn lenient_range(&self, part: &str) -> Option<(u32, u32, u32)> {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, step.trim().parse::<i64>().unwrap_or(1).max(1)),
            None => (part, 1),
        };
        let (start, end) = if range == "*" {
            (i64::from(self.min), i64::from(self.max))
        } else {
            match range.split_once('-') {
                Some((start, end)) => (parse_number(start)?, parse_number(end)?),
                None => {
                    let single = parse_number(range)?;
                    (single, single)
                }
            }
        };
        let start = start.max(i64::from(self.min));
        let end = end.min(i64::from(self.max));
        if start > end {
            return None;
        }
        let step = u32::try_from(step).unwrap_or(u32::MAX);
        Some((u32::try_from(start).ok()?, u32::try_from(end).ok()?, step))
    }

    fn strict_range(&self, part: &str) -> Result<(u32, u32, u32), CronError> {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step = parse_number(step)
                    .and_then(|s| u32::try_from(s).ok())
                    .ok_or_else(|| {
                        CronError::ComponentError(format!("Invalid step in '{part}'."))
                    })?;
                if step == 0 {
                    return Err(CronError::ComponentError(format!(
                        "Step cannot be zero in '{part}'."
                    )));
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range == "*" {
            (self.min, self.max)
        } else {
            let bound = |text: &str| -> Result<u32, CronError> {
                let value = parse_number(text)
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        CronError::ComponentError(format!("Invalid number in '{part}'."))
                    })?;
                if value < self.min || value > self.max {
                    return Err(CronError::ComponentError(format!(
                        "Value {} is out of bounds for the current range ({}-{}).",
                        value, self.min, self.max
                    )));
                }
                Ok(value)
            };
            match range.split_once('-') {
                Some((start, end)) => (bound(start)?, bound(end)?),
                None => {
                    let single = bound(range)?;
                    (single, single)
                }
            }
        };

        if start > end {
            return Err(CronError::ComponentError(format!(
                "Range '{part}' is empty."
            )));
        }
        Ok((start, end, step))
    }
}

impl std::fmt::Display for FieldSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.iter().map(|value| value.to_string()).collect();
        write!(f, "{{{}}}", values.join(","))
    }
}

// Plain unsigned decimal; anything else is malformed.
fn parse_number(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i64>().ok()
}
