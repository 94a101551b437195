//! Weekday and weekend day selection for a recording period.
//!
//! Study metadata lists which calendar dates of a participant's recording
//! were Saturdays and Sundays. The recording's days run from its start date
//! up to, but not including, its end date; any of them not listed is a
//! weekday. Each day is identified by its start instant: the recording start
//! for the first day, local midnight for the rest.

use crate::core::days::{next_local_midnight, start_of_day};
use crate::core::error::BiomarkerError;
use crate::series::{SeriesError, SeriesView, TimeSeries};
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Recording bounds and weekend dates for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub saturdays: Vec<NaiveDate>,
    #[serde(default)]
    pub sundays: Vec<NaiveDate>,
}

/// Which kinds of days to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySelection {
    pub weekdays: bool,
    pub weekends: bool,
}

impl Default for DaySelection {
    fn default() -> Self {
        Self {
            weekdays: false,
            weekends: true,
        }
    }
}

impl DaySelection {
    pub fn all() -> Self {
        Self {
            weekdays: true,
            weekends: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.weekdays && !self.weekends
    }
}

/// Day starts split into weekdays and weekends, each in time order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPartition {
    pub weekdays: Vec<DateTime<Utc>>,
    pub weekends: Vec<DateTime<Utc>>,
}

impl DayPartition {
    /// Day starts matching `selection`, merged in time order.
    pub fn select(&self, selection: DaySelection) -> Result<Vec<DateTime<Utc>>, BiomarkerError> {
        if selection.is_empty() {
            return Err(BiomarkerError::EmptyDaySelection);
        }
        let mut days = Vec::new();
        if selection.weekdays {
            days.extend_from_slice(&self.weekdays);
        }
        if selection.weekends {
            days.extend_from_slice(&self.weekends);
        }
        days.sort();
        Ok(days)
    }
}

impl RecordingPeriod {
    /// A period with no weekend dates listed.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            saturdays: Vec::new(),
            sundays: Vec::new(),
        }
    }

    /// Fill Saturdays and Sundays from the calendar in `tz`.
    pub fn with_calendar_weekends(mut self, tz: Tz) -> Self {
        self.saturdays.clear();
        self.sundays.clear();
        for date in self.dates(tz) {
            match date.weekday() {
                Weekday::Sat => self.saturdays.push(date),
                Weekday::Sun => self.sundays.push(date),
                _ => {}
            }
        }
        self
    }

    /// Local dates of the period, in order. The end date is not included.
    pub fn dates(&self, tz: Tz) -> Vec<NaiveDate> {
        let first = self.start.with_timezone(&tz).date_naive();
        let last = self.end.with_timezone(&tz).date_naive();
        first.iter_days().take_while(|date| *date < last).collect()
    }

    /// Classify every date of the period as weekday or weekend.
    pub fn partition(&self, tz: Tz) -> DayPartition {
        let mut partition = DayPartition::default();
        for date in self.dates(tz) {
            let start = self.day_start(date, tz);
            if self.saturdays.contains(&date) || self.sundays.contains(&date) {
                partition.weekends.push(start);
            } else {
                partition.weekdays.push(start);
            }
        }
        partition
    }

    fn day_start(&self, date: NaiveDate, tz: Tz) -> DateTime<Utc> {
        start_of_day(date, tz).max(self.start)
    }
}

/// Concatenate the parts of `series` that fall on the given days.
///
/// Each day runs to the next local midnight or `recording_end`, whichever
/// comes first; the day ending at `recording_end` keeps a sample taken
/// exactly then.
pub fn select_days(
    series: SeriesView<'_>,
    day_starts: &[DateTime<Utc>],
    recording_end: DateTime<Utc>,
) -> Result<TimeSeries, SeriesError> {
    let mut days = day_starts.to_vec();
    days.sort();
    days.dedup();

    let mut samples = Vec::new();
    for day_start in days {
        let day_end = next_local_midnight(day_start, series.tz()).min(recording_end);
        let day = if day_end == recording_end {
            series.between_inclusive(day_start, day_end)
        } else {
            series.between(day_start, day_end)
        };
        samples.extend_from_slice(day.samples());
    }
    TimeSeries::new(samples, series.tz())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    // 2024-01-05 is a Friday.
    fn period() -> RecordingPeriod {
        RecordingPeriod::new(utc(5, 8, 35), utc(8, 12, 0)).with_calendar_weekends(Tz::UTC)
    }

    #[test]
    fn test_calendar_weekends() {
        let period = period();
        assert_eq!(period.saturdays, vec![date(6)]);
        assert_eq!(period.sundays, vec![date(7)]);
        assert_eq!(period.dates(Tz::UTC), vec![date(5), date(6), date(7)]);
    }

    #[test]
    fn test_partition_day_starts() {
        let partition = period().partition(Tz::UTC);
        assert_eq!(partition.weekdays, vec![utc(5, 8, 35)]);
        assert_eq!(partition.weekends, vec![utc(6, 0, 0), utc(7, 0, 0)]);
    }

    #[test]
    fn test_end_date_is_not_a_day() {
        // Monday 08:35 to Wednesday 12:00: Wednesday is left out.
        let period =
            RecordingPeriod::new(utc(8, 8, 35), utc(10, 12, 0)).with_calendar_weekends(Tz::UTC);
        assert_eq!(period.dates(Tz::UTC), vec![date(8), date(9)]);

        let partition = period.partition(Tz::UTC);
        assert_eq!(partition.weekdays, vec![utc(8, 8, 35), utc(9, 0, 0)]);
        assert!(partition.weekends.is_empty());
    }

    #[test]
    fn test_end_date_in_local_zone() {
        // 23:30 UTC on the 9th is already the 10th in Berlin.
        let tz = chrono_tz::Europe::Berlin;
        let period = RecordingPeriod::new(utc(8, 8, 0), utc(9, 23, 30));
        assert_eq!(period.dates(tz), vec![date(8), date(9)]);
        assert_eq!(period.dates(Tz::UTC), vec![date(8)]);
    }

    #[test]
    fn test_period_ending_at_midnight_excludes_that_date() {
        let period = RecordingPeriod::new(utc(5, 8, 0), utc(7, 0, 0));
        assert_eq!(period.dates(Tz::UTC), vec![date(5), date(6)]);
    }

    #[test]
    fn test_selection() {
        let partition = period().partition(Tz::UTC);

        let all = partition.select(DaySelection::all()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));

        assert_eq!(partition.select(DaySelection::default()).unwrap().len(), 2);

        let none = DaySelection {
            weekdays: false,
            weekends: false,
        };
        assert_eq!(
            partition.select(none),
            Err(BiomarkerError::EmptyDaySelection)
        );
    }

    #[test]
    fn test_select_days_concatenates() {
        let start = utc(5, 8, 35);
        let series = TimeSeries::from_pairs(
            (0..80).map(|h| (start + Duration::hours(h), h as f64)),
            Tz::UTC,
        )
        .unwrap();
        let end = series.view().last().unwrap();
        let weekends = period().partition(Tz::UTC).weekends;

        let selected = select_days(series.view(), &weekends, end).unwrap();
        assert_eq!(selected.len(), 48);
        assert_eq!(selected.samples()[0].timestamp, utc(6, 0, 35));
    }
}
