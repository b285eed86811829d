use crate::Cron;
use chrono::{DateTime, TimeZone};
use log::debug;

/// Successive launch times of a [`Cron`], each strictly after the previous one.
///
/// Created by [`Cron::iter_after`]. Iteration ends at the first error, such as
/// a pattern that never matches again.
#[derive(Debug, Clone)]
pub struct LaunchIterator<Tz>
where
    Tz: TimeZone,
{
    cron: Cron,
    current_time: Option<DateTime<Tz>>,
}

impl<Tz> LaunchIterator<Tz>
where
    Tz: TimeZone,
{
    /// Creates a new `LaunchIterator`.
    ///
    /// # Arguments
    ///
    /// * `cron` - The `Cron` schedule instance.
    /// * `start_after` - Only launch times strictly after this instant are yielded.
    pub fn new(cron: Cron, start_after: DateTime<Tz>) -> Self {
        LaunchIterator {
            cron,
            current_time: Some(start_after),
        }
    }
}

impl<Tz> Iterator for LaunchIterator<Tz>
where
    Tz: TimeZone,
{
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current_time.take()?;
        match self.cron.find_next_launch(&current) {
            Ok(next) => {
                self.current_time = Some(next.clone());
                Some(next)
            }
            Err(e) => {
                debug!("launch iteration of '{}' stopped: {}", self.cron, e);
                None
            }
        }
    }
}

impl<Tz> std::iter::FusedIterator for LaunchIterator<Tz> where Tz: TimeZone {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_yields_increasing_times() {
        let cron: Cron = "*/20 * * * *".parse().unwrap();
        let start = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        let launches: Vec<_> = cron.iter_after(start).take(4).collect();
        assert_eq!(
            launches,
            vec![
                Utc.with_ymd_and_hms(2013, 1, 1, 0, 20, 0).unwrap(),
                Utc.with_ymd_and_hms(2013, 1, 1, 0, 40, 0).unwrap(),
                Utc.with_ymd_and_hms(2013, 1, 1, 1, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2013, 1, 1, 1, 20, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_stops_when_pattern_never_matches() {
        let cron: Cron = "0 0 30 2 *".parse().unwrap();
        let start = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        let mut iter = cron.iter_after(start);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }
}
