//! Splitting multi-day recordings at local midnight.
//!
//! [`day_segments`] walks a series one calendar day at a time: the first
//! segment starts at the first sample (not at midnight) and the last one ends
//! at the final sample. Segments are half-open except the last, which is
//! closed so the final sample is not lost.
//!
//! [`aggregate_by_day`] reduces per-day instants by averaging them as epoch
//! microseconds. The result is a "typical time" across days, not a global
//! search over the whole record. Averaging 23:00 and 01:00 of consecutive
//! days gives midnight, while averaging their times of day would give noon.

use crate::series::SeriesView;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// First instant of a local calendar date.
///
/// Zones that start DST at midnight (America/Santiago, for one) have no
/// 00:00 on that date; the day then begins at the first valid local time.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=8)
        .find_map(|quarter| {
            tz.from_local_datetime(&(midnight + Duration::minutes(15 * quarter)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// The next local midnight strictly after `instant`.
pub fn next_local_midnight(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    match instant.with_timezone(&tz).date_naive().succ_opt() {
        Some(next) => start_of_day(next, tz),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Arithmetic mean of instants, computed on epoch microseconds.
pub fn mean_instant(instants: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    if instants.is_empty() {
        return None;
    }
    let total: i128 = instants.iter().map(|t| t.timestamp_micros() as i128).sum();
    let mean = total / instants.len() as i128;
    DateTime::from_timestamp_micros(mean as i64)
}

/// One calendar day of a series.
#[derive(Debug, Clone, Copy)]
pub struct DaySegment<'a> {
    /// Local date this segment belongs to
    pub date: NaiveDate,
    /// Segment start (series start or local midnight)
    pub start: DateTime<Utc>,
    /// Segment end (next local midnight or series end)
    pub end: DateTime<Utc>,
    /// Samples of the day
    pub samples: SeriesView<'a>,
}

/// Iterator over the calendar days of a series.
pub struct DaySegments<'a> {
    series: SeriesView<'a>,
    cursor: Option<DateTime<Utc>>,
}

/// Split `series` into local calendar days.
pub fn day_segments(series: SeriesView<'_>) -> DaySegments<'_> {
    DaySegments {
        series,
        cursor: series.first(),
    }
}

impl<'a> Iterator for DaySegments<'a> {
    type Item = DaySegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor.take()?;
        let last = self.series.last()?;
        let tz = self.series.tz();
        let midnight = next_local_midnight(start, tz);

        let (end, samples) = if midnight >= last {
            (last, self.series.between_inclusive(start, last))
        } else {
            self.cursor = Some(midnight);
            (midnight, self.series.between(start, midnight))
        };

        Some(DaySegment {
            date: start.with_timezone(&tz).date_naive(),
            start,
            end,
            samples,
        })
    }
}

/// Apply `per_day` to each calendar day and average the resulting instants.
///
/// Series spanning one day or less are handed to `per_day` whole. Days for
/// which `per_day` returns `None` are left out of the average; `None` is
/// returned only when no day produced a value.
pub fn aggregate_by_day<F>(series: SeriesView<'_>, mut per_day: F) -> Option<DateTime<Utc>>
where
    F: FnMut(SeriesView<'_>) -> Option<DateTime<Utc>>,
{
    let (first, last) = (series.first()?, series.last()?);
    if first + Duration::days(1) >= last {
        return per_day(series);
    }

    let mut results = Vec::new();
    for day in day_segments(series) {
        match per_day(day.samples) {
            Some(instant) => results.push(instant),
            None => debug!(
                date = %day.date,
                samples = day.samples.len(),
                "day segment produced no result; excluded from average"
            ),
        }
    }
    mean_instant(&results)
}
