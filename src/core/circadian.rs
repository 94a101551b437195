//! L5 and M10: midpoints of the least and most active stretches of the day.
//!
//! Both markers run the same pipeline: an extremum search over sliding
//! windows, done per calendar day when the recording is longer than a day,
//! with the per-day midpoints averaged into one instant (see
//! [`crate::core::days`] for why the average is taken on epoch time).
//!
//! Both markers refuse series shorter than their window.

use crate::core::days::aggregate_by_day;
use crate::core::error::BiomarkerError;
use crate::core::windowing::{find_extremum, Extremum};
use crate::series::SeriesView;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default L5 window length in hours.
pub const L5_WINDOW_HOURS: i64 = 5;

/// Default M10 window length in hours.
pub const M10_WINDOW_HOURS: i64 = 10;

/// Window lengths for the two markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircadianConfig {
    pub l5_window: Duration,
    pub m10_window: Duration,
}

impl Default for CircadianConfig {
    fn default() -> Self {
        Self {
            l5_window: Duration::hours(L5_WINDOW_HOURS),
            m10_window: Duration::hours(M10_WINDOW_HOURS),
        }
    }
}

/// Result of an L5/M10 style search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremumTime {
    /// Midpoint of the selected window (averaged across days)
    pub timestamp: DateTime<Utc>,
    /// Number of day segments that contributed
    pub days: usize,
    /// Direction of the search
    pub extremum: Extremum,
}

impl ExtremumTime {
    /// The instant in the recording's zone.
    pub fn local(&self, tz: Tz) -> DateTime<Tz> {
        self.timestamp.with_timezone(&tz)
    }

    /// Wall-clock time of day in the recording's zone.
    pub fn time_of_day(&self, tz: Tz) -> NaiveTime {
        self.local(tz).time()
    }
}

/// L5 with the default five hour window.
pub fn compute_l5(series: SeriesView<'_>) -> Result<ExtremumTime, BiomarkerError> {
    extremum_time(series, Duration::hours(L5_WINDOW_HOURS), Extremum::Min)
}

/// M10 with the default ten hour window.
pub fn compute_m10(series: SeriesView<'_>) -> Result<ExtremumTime, BiomarkerError> {
    extremum_time(series, Duration::hours(M10_WINDOW_HOURS), Extremum::Max)
}

/// L5 with the window configured in `config`.
pub fn least_active(
    series: SeriesView<'_>,
    config: &CircadianConfig,
) -> Result<ExtremumTime, BiomarkerError> {
    extremum_time(series, config.l5_window, Extremum::Min)
}

/// M10 with the window configured in `config`.
pub fn most_active(
    series: SeriesView<'_>,
    config: &CircadianConfig,
) -> Result<ExtremumTime, BiomarkerError> {
    extremum_time(series, config.m10_window, Extremum::Max)
}

/// Midpoint of the lowest or highest mean window, averaged across days.
pub fn extremum_time(
    series: SeriesView<'_>,
    window: Duration,
    extremum: Extremum,
) -> Result<ExtremumTime, BiomarkerError> {
    let actual = series.span();
    if series.is_empty() || actual < window {
        return Err(BiomarkerError::InsufficientSpan {
            required: window,
            actual,
        });
    }

    let mut days = 0;
    let timestamp = aggregate_by_day(series, |day| {
        let found = find_extremum(day, window, extremum)?;
        days += 1;
        Some(found.midpoint)
    })
    // Every day segment was shorter than the window.
    .ok_or(BiomarkerError::InsufficientSpan {
        required: window,
        actual,
    })?;

    debug!(
        ?extremum,
        window_minutes = window.num_minutes(),
        days,
        %timestamp,
        "extremum window located"
    );

    Ok(ExtremumTime {
        timestamp,
        days,
        extremum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;
    use chrono::TimeZone;

    fn hourly(start: DateTime<Utc>, values: &[f64]) -> TimeSeries {
        TimeSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Duration::hours(i as i64), v)),
            Tz::UTC,
        )
        .unwrap()
    }

    #[test]
    fn test_l5_lowest_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = hourly(start, &[10.0, 10.0, 10.0, 1.0, 1.0, 1.0, 1.0]);

        let l5 = compute_l5(series.view()).unwrap();
        assert_eq!(l5.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 3, 30, 0).unwrap());
        assert_eq!(l5.days, 1);
        assert_eq!(l5.extremum, Extremum::Min);
    }

    #[test]
    fn test_l5_too_short() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = hourly(start, &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let err = compute_l5(series.view()).unwrap_err();
        assert_eq!(
            err,
            BiomarkerError::InsufficientSpan {
                required: Duration::hours(5),
                actual: Duration::hours(4),
            }
        );
    }

    #[test]
    fn test_m10_guard_matches_l5() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = hourly(start, &[1.0; 8]);
        assert!(matches!(
            compute_m10(series.view()),
            Err(BiomarkerError::InsufficientSpan { .. })
        ));
        assert!(compute_l5(series.view()).is_ok());
    }

    #[test]
    fn test_empty_series() {
        let empty = TimeSeries::empty(Tz::UTC);
        assert!(compute_l5(empty.view()).is_err());
        assert!(compute_m10(empty.view()).is_err());
    }

    #[test]
    fn test_m10_highest_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut values = vec![0.0; 20];
        for v in values.iter_mut().skip(8).take(10) {
            *v = 5.0;
        }
        let series = hourly(start, &values);

        let m10 = compute_m10(series.view()).unwrap();
        assert_eq!(m10.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_custom_windows() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = hourly(start, &[4.0, 0.0, 6.0, 8.0]);
        let config = CircadianConfig {
            l5_window: Duration::hours(1),
            m10_window: Duration::hours(2),
        };

        let low = least_active(series.view(), &config).unwrap();
        assert_eq!(low.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 1, 30, 0).unwrap());
        let high = most_active(series.view(), &config).unwrap();
        assert_eq!(high.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap());
    }
}
