//! Time series types shared by every biomarker computation.
//!
//! A [`TimeSeries`] owns its samples and the IANA zone that gives them
//! wall-clock meaning. Algorithms never take ownership: they borrow a
//! [`SeriesView`], a zero-copy sub-range that day segments and hour chunks
//! are carved from.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single timestamped measurement.
///
/// Non-finite values mark missing acquisitions and are skipped by every
/// aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Instant the measurement was taken
    pub timestamp: DateTime<Utc>,
    /// Measured value
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Whether this sample carries no usable value.
    pub fn is_missing(&self) -> bool {
        !self.value.is_finite()
    }
}

/// Errors raised while building a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamps must be strictly increasing: sample {index} ({current}) does not follow {previous}")]
    NotIncreasing {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// An ordered, validated sequence of samples in a given time zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    tz: Tz,
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Build a series, rejecting out-of-order or duplicated timestamps.
    pub fn new(samples: Vec<Sample>, tz: Tz) -> Result<Self, SeriesError> {
        if let Some(index) = samples
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SeriesError::NotIncreasing {
                index: index + 1,
                previous: samples[index].timestamp,
                current: samples[index + 1].timestamp,
            });
        }
        Ok(Self { tz, samples })
    }

    /// Build a series from `(timestamp, value)` pairs.
    pub fn from_pairs<I>(pairs: I, tz: Tz) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let samples = pairs
            .into_iter()
            .map(|(timestamp, value)| Sample::new(timestamp, value))
            .collect();
        Self::new(samples, tz)
    }

    /// An empty series in the given zone.
    pub fn empty(tz: Tz) -> Self {
        Self {
            tz,
            samples: Vec::new(),
        }
    }

    /// Borrow the whole series.
    pub fn view(&self) -> SeriesView<'_> {
        SeriesView {
            samples: &self.samples,
            tz: self.tz,
        }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A borrowed, contiguous range of a [`TimeSeries`].
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    samples: &'a [Sample],
    tz: Tz,
}

impl<'a> SeriesView<'a> {
    pub fn samples(&self) -> &'a [Sample] {
        self.samples
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Time between the first and last sample (zero for fewer than two).
    pub fn span(&self) -> Duration {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last - first,
            _ => Duration::zero(),
        }
    }

    /// Samples with timestamps in `[start, end)`.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SeriesView<'a> {
        let from = self.samples.partition_point(|s| s.timestamp < start);
        let to = self.samples.partition_point(|s| s.timestamp < end).max(from);
        self.slice(from, to)
    }

    /// Samples with timestamps in `[start, end]`.
    pub fn between_inclusive(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SeriesView<'a> {
        let from = self.samples.partition_point(|s| s.timestamp < start);
        let to = self.samples.partition_point(|s| s.timestamp <= end).max(from);
        self.slice(from, to)
    }

    fn slice(&self, from: usize, to: usize) -> SeriesView<'a> {
        SeriesView {
            samples: &self.samples[from..to],
            tz: self.tz,
        }
    }
}

impl<'a> IntoIterator for SeriesView<'a> {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap()
    }

    #[test]
    fn test_rejects_unordered_samples() {
        let err = TimeSeries::from_pairs([(at(2), 1.0), (at(1), 1.0)], Tz::UTC).unwrap_err();
        assert_eq!(
            err,
            SeriesError::NotIncreasing {
                index: 1,
                previous: at(2),
                current: at(1),
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        assert!(TimeSeries::from_pairs([(at(1), 1.0), (at(1), 2.0)], Tz::UTC).is_err());
    }

    #[test]
    fn test_between_is_half_open() {
        let series =
            TimeSeries::from_pairs((0..5).map(|m| (at(m), m as f64)), Tz::UTC).unwrap();
        let view = series.view();

        assert_eq!(view.between(at(1), at(3)).len(), 2);
        assert_eq!(view.between_inclusive(at(1), at(3)).len(), 3);
        assert!(view.between(at(3), at(1)).is_empty());
        assert_eq!(view.span(), Duration::minutes(4));
    }

    #[test]
    fn test_missing_values() {
        assert!(Sample::new(at(0), f64::NAN).is_missing());
        assert!(!Sample::new(at(0), 0.0).is_missing());
    }
}
