//! Sliding windows anchored at sample timestamps.
//!
//! Every sample starts a candidate window `[t, t + duration)`. Windows whose
//! end would pass the last sample are never evaluated, and scanning stops at
//! the first one that overflows. The scan keeps a running sum between two
//! cursors, so a whole pass is linear in the number of samples regardless of
//! the window length.

use crate::series::{Sample, SeriesView};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Mean of the samples inside one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAverage {
    /// Left edge (the anchoring sample's timestamp)
    pub start: DateTime<Utc>,
    /// Exclusive right edge
    pub end: DateTime<Utc>,
    /// `start + duration / 2`
    pub midpoint: DateTime<Utc>,
    /// Mean of the finite values in the window, `None` if there are none
    pub mean: Option<f64>,
    /// Number of finite values that contributed to `mean`
    pub sample_count: usize,
}

/// Lazy iterator over the windows of a series.
pub struct WindowScan<'a> {
    samples: &'a [Sample],
    duration: Duration,
    last: Option<DateTime<Utc>>,
    anchor: usize,
    end: usize,
    sum: f64,
    count: usize,
    finished: bool,
}

/// Scan `series` with windows of the given duration.
pub fn scan(series: SeriesView<'_>, duration: Duration) -> WindowScan<'_> {
    WindowScan {
        samples: series.samples(),
        duration,
        last: series.last(),
        anchor: 0,
        end: 0,
        sum: 0.0,
        count: 0,
        finished: duration <= Duration::zero(),
    }
}

impl WindowScan<'_> {
    fn include(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    fn exclude(&mut self, value: f64) {
        if value.is_finite() {
            self.count -= 1;
            // Reset instead of subtracting so rounding error cannot accumulate
            // across empty stretches.
            if self.count == 0 {
                self.sum = 0.0;
            } else {
                self.sum -= value;
            }
        }
    }
}

impl Iterator for WindowScan<'_> {
    type Item = WindowAverage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let last = self.last?;
        let start = self.samples.get(self.anchor)?.timestamp;
        let end = start + self.duration;
        if end > last {
            self.finished = true;
            return None;
        }

        while let Some(sample) = self.samples.get(self.end) {
            if sample.timestamp >= end {
                break;
            }
            self.include(sample.value);
            self.end += 1;
        }

        let average = WindowAverage {
            start,
            end,
            midpoint: start + self.duration / 2,
            mean: (self.count > 0).then(|| self.sum / self.count as f64),
            sample_count: self.count,
        };

        // The anchor always lies inside its own window, so it has been
        // included above and can be dropped before the next anchor.
        let anchor_value = self.samples[self.anchor].value;
        self.exclude(anchor_value);
        self.anchor += 1;

        Some(average)
    }
}

/// Which end of the window means to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extremum {
    /// Lowest mean (L5)
    Min,
    /// Highest mean (M10)
    Max,
}

impl Extremum {
    /// Strict comparison, so the first window wins a tie.
    fn prefers(self, candidate: f64, current: f64) -> bool {
        match self {
            Extremum::Min => candidate < current,
            Extremum::Max => candidate > current,
        }
    }
}

/// Find the window with the lowest or highest mean.
///
/// Windows without data are skipped. Returns `None` when no window fits in
/// the series.
pub fn find_extremum(
    series: SeriesView<'_>,
    duration: Duration,
    extremum: Extremum,
) -> Option<WindowAverage> {
    let mut best: Option<(WindowAverage, f64)> = None;

    for window in scan(series, duration) {
        let Some(mean) = window.mean else {
            continue;
        };
        let replace = match best {
            Some((_, current)) => extremum.prefers(mean, current),
            None => true,
        };
        if replace {
            best = Some((window, mean));
        }
    }

    best.map(|(window, _)| window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn hourly(values: &[f64]) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
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
    fn test_scan_drops_overflowing_windows() {
        let series = hourly(&[10.0, 10.0, 10.0, 1.0, 1.0, 1.0]);
        let windows: Vec<_> = scan(series.view(), Duration::hours(5)).collect();

        // Only the window anchored at 00:00 ends at or before 05:00.
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].sample_count, 5);
        assert!((windows[0].mean.unwrap() - 6.4).abs() < 1e-12);
        assert_eq!(
            windows[0].midpoint,
            Utc.with_ymd_and_hms(2024, 1, 1, 2, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_scan_matches_direct_means() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
        let series = hourly(&values);
        let windows: Vec<_> = scan(series.view(), Duration::hours(3)).collect();

        assert_eq!(windows.len(), values.len() - 3);
        for (i, window) in windows.iter().enumerate() {
            let expected = values[i..i + 3].iter().sum::<f64>() / 3.0;
            assert!((window.mean.unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scan_skips_missing_values() {
        let series = hourly(&[f64::NAN, 2.0, 4.0, 0.0]);
        let first = scan(series.view(), Duration::hours(3)).next().unwrap();
        assert_eq!(first.sample_count, 2);
        assert_eq!(first.mean, Some(3.0));

        let all_missing = hourly(&[f64::NAN, f64::NAN, f64::NAN]);
        let window = scan(all_missing.view(), Duration::hours(1)).next().unwrap();
        assert_eq!(window.mean, None);
    }

    #[test]
    fn test_scan_irregular_spacing() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = TimeSeries::from_pairs(
            [
                (start, 1.0),
                (start + Duration::minutes(10), 3.0),
                (start + Duration::minutes(95), 8.0),
                (start + Duration::minutes(200), 0.0),
            ],
            Tz::UTC,
        )
        .unwrap();

        let windows: Vec<_> = scan(series.view(), Duration::hours(1)).collect();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].mean, Some(2.0));
        assert_eq!(windows[1].mean, Some(3.0));
        assert_eq!(windows[2].mean, Some(8.0));
    }

    #[test]
    fn test_scan_empty_and_zero_duration() {
        let empty = TimeSeries::empty(Tz::UTC);
        assert_eq!(scan(empty.view(), Duration::hours(1)).count(), 0);

        let series = hourly(&[1.0, 2.0]);
        assert_eq!(scan(series.view(), Duration::zero()).count(), 0);
    }

    #[test]
    fn test_extremum_first_tie_wins() {
        let series = hourly(&[1.0, 1.0, 1.0, 1.0]);
        let low = find_extremum(series.view(), Duration::hours(1), Extremum::Min).unwrap();
        let high = find_extremum(series.view(), Duration::hours(1), Extremum::Max).unwrap();
        assert_eq!(low.start, series.samples()[0].timestamp);
        assert_eq!(high.start, series.samples()[0].timestamp);
    }

    #[test]
    fn test_extremum_directions() {
        let series = hourly(&[5.0, 1.0, 7.0, 2.0, 0.0]);
        let low = find_extremum(series.view(), Duration::hours(1), Extremum::Min).unwrap();
        let high = find_extremum(series.view(), Duration::hours(1), Extremum::Max).unwrap();
        assert_eq!(low.mean, Some(1.0));
        assert_eq!(high.mean, Some(7.0));
    }

    #[test]
    fn test_extremum_none_when_too_short() {
        let series = hourly(&[1.0, 2.0]);
        assert!(find_extremum(series.view(), Duration::hours(5), Extremum::Min).is_none());
    }
}
