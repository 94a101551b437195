//! VMC: per-minute dispersion of acceleration magnitude.
//!
//! Buckets follow the wall clock, not the data. The first bucket runs from
//! the anchor to the next `:00` second mark, later buckets are whole clock
//! minutes, and the last one is clipped to the final sample. Each bucket
//! reports the mean absolute deviation of its values from their mean, keyed
//! by the mean timestamp of the samples that produced it. Buckets without
//! data report `None` keyed by their nominal start.
//!
//! Long recordings are processed one local day at a time and, within a day,
//! one hour at a time. Each hour chunk is bucketed independently, so the
//! minute that straddles an hour boundary yields two partial buckets.

use crate::core::days::{mean_instant, next_local_midnight};
use crate::series::{Sample, SeriesView};
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// One clock-aligned bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinuteBucket {
    /// Nominal start boundary
    pub start: DateTime<Utc>,
    /// Nominal end boundary
    pub end: DateTime<Utc>,
    /// Whether `end` itself belongs to the bucket (only for the final one)
    pub closed: bool,
    /// Mean timestamp of the contributing samples
    pub representative: Option<DateTime<Utc>>,
    /// Number of finite samples in the bucket
    pub sample_count: usize,
    /// Mean absolute deviation from the bucket mean
    pub dispersion: Option<f64>,
}

impl MinuteBucket {
    fn from_samples(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        closed: bool,
        samples: SeriesView<'_>,
    ) -> Self {
        let present: Vec<&Sample> = samples.into_iter().filter(|s| !s.is_missing()).collect();
        let timestamps: Vec<DateTime<Utc>> = present.iter().map(|s| s.timestamp).collect();
        let values: Vec<f64> = present.iter().map(|s| s.value).collect();

        Self {
            start,
            end,
            closed,
            representative: mean_instant(&timestamps),
            sample_count: values.len(),
            dispersion: mean_absolute_deviation(&values),
        }
    }

    /// Timestamp this bucket is reported under.
    pub fn key(&self) -> DateTime<Utc> {
        self.representative.unwrap_or(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// Mean of `|v - mean(v)|`, `None` for no values.
pub fn mean_absolute_deviation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().mean();
    Some(values.iter().map(|v| (v - mean).abs()).mean())
}

/// The first wall-clock minute mark strictly after `instant`.
pub fn next_minute_mark(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&tz);
    let into_minute =
        Duration::seconds(local.second() as i64) + Duration::nanoseconds(local.nanosecond() as i64);
    instant - into_minute + Duration::minutes(1)
}

/// Partition `series` into minute buckets starting at `anchor`.
///
/// Samples before `anchor` are ignored. The final bucket is clipped to, and
/// includes, the last sample.
pub fn bucketize(series: SeriesView<'_>, anchor: DateTime<Utc>) -> Vec<MinuteBucket> {
    let Some(last) = series.last() else {
        return Vec::new();
    };
    if anchor > last {
        return Vec::new();
    }

    let tz = series.tz();
    let mut buckets = Vec::new();
    let mut cursor = anchor;
    loop {
        let boundary = next_minute_mark(cursor, tz);
        if boundary >= last {
            let samples = series.between_inclusive(cursor, last);
            buckets.push(MinuteBucket::from_samples(cursor, last, true, samples));
            break;
        }
        let samples = series.between(cursor, boundary);
        buckets.push(MinuteBucket::from_samples(cursor, boundary, false, samples));
        cursor = boundary;
    }

    trace!(
        anchor = %anchor,
        buckets = buckets.len(),
        empty = buckets.iter().filter(|b| b.is_empty()).count(),
        "bucketized chunk"
    );
    buckets
}

/// Ordered VMC values for a recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VmcSeries {
    buckets: Vec<MinuteBucket>,
}

/// Aggregate figures over a [`VmcSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VmcSummary {
    pub buckets: usize,
    pub empty_buckets: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub max: Option<f64>,
}

impl VmcSeries {
    pub fn buckets(&self) -> &[MinuteBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// `(key, value)` pairs in time order.
    pub fn entries(&self) -> impl Iterator<Item = (DateTime<Utc>, Option<f64>)> + '_ {
        self.buckets.iter().map(|b| (b.key(), b.dispersion))
    }

    pub fn to_map(&self) -> BTreeMap<DateTime<Utc>, Option<f64>> {
        self.entries().collect()
    }

    pub fn summary(&self) -> VmcSummary {
        let values: Vec<f64> = self.buckets.iter().filter_map(|b| b.dispersion).collect();
        let (mean, std_dev, max) = if values.is_empty() {
            (None, None, None)
        } else {
            let std_dev = (values.len() > 1).then(|| values.iter().std_dev());
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (Some(values.iter().mean()), std_dev, Some(max))
        };
        VmcSummary {
            buckets: self.buckets.len(),
            empty_buckets: self.buckets.len() - values.len(),
            mean,
            std_dev,
            max,
        }
    }

    fn extend(&mut self, buckets: Vec<MinuteBucket>) {
        self.buckets.extend(buckets);
    }
}

/// VMC from `anchor` to the end of the series, day by day and hour by hour.
pub fn compute_vmc(series: SeriesView<'_>, anchor: DateTime<Utc>) -> VmcSeries {
    let mut vmc = VmcSeries::default();
    let Some(last) = series.last() else {
        return vmc;
    };
    if anchor > last {
        return vmc;
    }

    let mut day_start = anchor;
    loop {
        let day_end = next_local_midnight(day_start, series.tz()).min(last);
        vmc.extend(hourly_buckets(series, day_start, day_end));
        if day_end >= last {
            break;
        }
        day_start = day_end;
    }
    vmc
}

/// VMC restricted to the given days.
///
/// Each day runs from its start to the next local midnight, or to
/// `recording_end` if that comes first.
pub fn compute_vmc_for_days(
    series: SeriesView<'_>,
    day_starts: &[DateTime<Utc>],
    recording_end: DateTime<Utc>,
) -> VmcSeries {
    let mut days = day_starts.to_vec();
    days.sort();
    days.dedup();

    let mut vmc = VmcSeries::default();
    for day_start in days {
        let day_end = next_local_midnight(day_start, series.tz()).min(recording_end);
        if day_start >= day_end {
            continue;
        }
        vmc.extend(hourly_buckets(series, day_start, day_end));
    }
    vmc
}

/// VMC over `[start, end]` as one continuous run of buckets.
pub fn compute_vmc_range(
    series: SeriesView<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> VmcSeries {
    VmcSeries {
        buckets: bucketize(series.between_inclusive(start, end), start),
    }
}

fn hourly_buckets(
    series: SeriesView<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<MinuteBucket> {
    let series_end = series.last();
    let mut buckets = Vec::new();
    let mut hour_start = start;
    loop {
        let hour_end = (hour_start + Duration::hours(1)).min(end);
        let chunk = if Some(hour_end) >= series_end {
            series.between_inclusive(hour_start, hour_end)
        } else {
            series.between(hour_start, hour_end)
        };

        if chunk.is_empty() {
            debug!(from = %hour_start, to = %hour_end, "no samples in hour; skipped");
        } else {
            buckets.extend(bucketize(chunk, hour_start));
        }

        if hour_end >= end {
            break;
        }
        hour_start = hour_end;
    }
    buckets
}
