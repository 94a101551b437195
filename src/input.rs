//! Recording files.
//!
//! A recording is one participant's JSON file: triaxial acceleration and
//! heart rate as lists of `{ "timestamp", "value" }` samples, plus the zone
//! and the recording period. A `null` value is a missing acquisition.
//!
//! ```json
//! {
//!   "participant": "P001",
//!   "timezone": "Europe/Berlin",
//!   "period": { "start": "...", "end": "...", "saturdays": ["2024-01-06"], "sundays": [] },
//!   "acceleration": { "lateral": [...], "longitudinal": [...], "vertical": [...] },
//!   "heart_rate": [...]
//! }
//! ```

use crate::core::days::next_local_midnight;
use crate::core::{magnitude, BiomarkerError, RecordingPeriod};
use crate::series::{Sample, SeriesError, TimeSeries};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading a recording.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {channel} channel: {source}")]
    Series {
        channel: &'static str,
        #[source]
        source: SeriesError,
    },

    #[error(transparent)]
    Biomarker(#[from] BiomarkerError),

    #[error("recording {0} has no samples")]
    Empty(String),

    #[error("recording {participant} has a period ending at {end}, not after its start {start}")]
    InvalidPeriod {
        participant: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A sample as stored on disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// The three acceleration axes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelSet {
    pub lateral: Vec<RawSample>,
    pub longitudinal: Vec<RawSample>,
    pub vertical: Vec<RawSample>,
}

/// On-disk layout of a recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingFile {
    pub participant: String,
    #[serde(default)]
    pub timezone: Option<Tz>,
    #[serde(default)]
    pub period: Option<RecordingPeriod>,
    #[serde(default)]
    pub acceleration: Option<ChannelSet>,
    #[serde(default)]
    pub heart_rate: Vec<RawSample>,
}

/// A validated recording ready for analysis.
#[derive(Debug, Clone)]
pub struct Recording {
    pub participant: String,
    pub tz: Tz,
    pub period: RecordingPeriod,
    /// Acceleration magnitude
    pub magnitude: TimeSeries,
    pub heart_rate: TimeSeries,
}

impl Recording {
    /// Number of samples across all channels.
    pub fn sample_count(&self) -> usize {
        self.magnitude.len() + self.heart_rate.len()
    }
}

impl RecordingFile {
    /// Validate channels and build a [`Recording`].
    ///
    /// Without a period the recording runs from its first sample to the local
    /// midnight after its last, so the last sample's date is a full day of
    /// the recording. Without listed weekend dates, Saturdays and Sundays come
    /// from the calendar.
    pub fn into_recording(self, default_tz: Tz) -> Result<Recording, InputError> {
        let tz = self.timezone.unwrap_or(default_tz);

        let magnitude = match self.acceleration {
            Some(channels) => {
                let lateral = to_series(channels.lateral, tz, "lateral")?;
                let longitudinal = to_series(channels.longitudinal, tz, "longitudinal")?;
                let vertical = to_series(channels.vertical, tz, "vertical")?;
                magnitude(lateral.view(), longitudinal.view(), vertical.view())?
            }
            None => TimeSeries::empty(tz),
        };
        let heart_rate = to_series(self.heart_rate, tz, "heart_rate")?;

        let bounds = [magnitude.view(), heart_rate.view()];
        let first = bounds.iter().filter_map(|view| view.first()).min();
        let last = bounds.iter().filter_map(|view| view.last()).max();
        let (Some(first), Some(last)) = (first, last) else {
            return Err(InputError::Empty(self.participant));
        };

        let period = match self.period {
            Some(period) if !period.saturdays.is_empty() || !period.sundays.is_empty() => period,
            Some(period) => period.with_calendar_weekends(tz),
            None => RecordingPeriod::new(first, next_local_midnight(last, tz))
                .with_calendar_weekends(tz),
        };
        if period.end <= period.start {
            return Err(InputError::InvalidPeriod {
                participant: self.participant,
                start: period.start,
                end: period.end,
            });
        }

        debug!(
            participant = %self.participant,
            %tz,
            magnitude = magnitude.len(),
            heart_rate = heart_rate.len(),
            "recording loaded"
        );

        Ok(Recording {
            participant: self.participant,
            tz,
            period,
            magnitude,
            heart_rate,
        })
    }
}

fn to_series(
    mut raw: Vec<RawSample>,
    tz: Tz,
    channel: &'static str,
) -> Result<TimeSeries, InputError> {
    raw.sort_by_key(|sample| sample.timestamp);
    let samples = raw
        .into_iter()
        .map(|sample| Sample::new(sample.timestamp, sample.value.unwrap_or(f64::NAN)))
        .collect();
    TimeSeries::new(samples, tz).map_err(|source| InputError::Series { channel, source })
}

/// Read and validate a recording file.
pub fn load_recording(path: &Path, default_tz: Tz) -> Result<Recording, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: RecordingFile =
        serde_json::from_str(&content).map_err(|source| InputError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    file.into_recording(default_tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn raw(minutes: &[i64], value: Option<f64>) -> Vec<RawSample> {
        let start = Utc.with_ymd_and_hms(2024, 1, 6, 10, 0, 0).unwrap();
        minutes
            .iter()
            .map(|m| RawSample {
                timestamp: start + Duration::minutes(*m),
                value,
            })
            .collect()
    }

    #[test]
    fn test_magnitude_from_channels() {
        let file = RecordingFile {
            participant: "P1".to_string(),
            timezone: None,
            period: None,
            acceleration: Some(ChannelSet {
                lateral: raw(&[0, 1], Some(3.0)),
                longitudinal: raw(&[0, 1], Some(4.0)),
                vertical: raw(&[0, 1], Some(0.0)),
            }),
            heart_rate: Vec::new(),
        };

        let recording = file.into_recording(Tz::UTC).unwrap();
        assert_eq!(recording.magnitude.len(), 2);
        assert!(recording.magnitude.samples().iter().all(|s| s.value == 5.0));
        assert!(recording.heart_rate.is_empty());
        // 2024-01-06 is a Saturday
        assert_eq!(
            recording.period.saturdays,
            vec![NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()]
        );
    }

    #[test]
    fn test_unsorted_samples_are_ordered() {
        let file = RecordingFile {
            participant: "P2".to_string(),
            timezone: Some(chrono_tz::Europe::Berlin),
            period: None,
            acceleration: None,
            heart_rate: raw(&[2, 0, 1], Some(60.0)),
        };

        let recording = file.into_recording(Tz::UTC).unwrap();
        assert_eq!(recording.tz, chrono_tz::Europe::Berlin);
        let times: Vec<_> = recording.heart_rate.samples().iter().map(|s| s.timestamp).collect();
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_null_values_are_missing() {
        let file = RecordingFile {
            participant: "P3".to_string(),
            timezone: None,
            period: None,
            acceleration: None,
            heart_rate: raw(&[0], None),
        };
        let recording = file.into_recording(Tz::UTC).unwrap();
        assert!(recording.heart_rate.samples()[0].is_missing());
    }

    #[test]
    fn test_duplicate_timestamps_rejected() {
        let file = RecordingFile {
            participant: "P4".to_string(),
            timezone: None,
            period: None,
            acceleration: None,
            heart_rate: raw(&[0, 0], Some(60.0)),
        };
        assert!(matches!(
            file.into_recording(Tz::UTC),
            Err(InputError::Series { channel: "heart_rate", .. })
        ));
    }

    #[test]
    fn test_misaligned_channels_rejected() {
        let file = RecordingFile {
            participant: "P5".to_string(),
            timezone: None,
            period: None,
            acceleration: Some(ChannelSet {
                lateral: raw(&[0, 1], Some(1.0)),
                longitudinal: raw(&[0, 2], Some(1.0)),
                vertical: raw(&[0, 1], Some(1.0)),
            }),
            heart_rate: Vec::new(),
        };
        assert!(matches!(
            file.into_recording(Tz::UTC),
            Err(InputError::Biomarker(BiomarkerError::MisalignedChannels { index: 1, .. }))
        ));
    }

    #[test]
    fn test_derived_period_covers_last_date() {
        let file = RecordingFile {
            participant: "P7".to_string(),
            timezone: None,
            period: None,
            acceleration: None,
            heart_rate: raw(&[0, 24 * 60], Some(60.0)),
        };
        let recording = file.into_recording(Tz::UTC).unwrap();
        assert_eq!(
            recording.period.end,
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()
        );
        assert_eq!(
            recording.period.sundays,
            vec![NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()]
        );
    }

    #[test]
    fn test_period_ending_before_start_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let file = RecordingFile {
            participant: "P8".to_string(),
            timezone: None,
            period: Some(RecordingPeriod::new(start, start - Duration::days(2))),
            acceleration: None,
            heart_rate: raw(&[0, 1], Some(60.0)),
        };
        match file.into_recording(Tz::UTC) {
            Err(InputError::InvalidPeriod { participant, end, .. }) => {
                assert_eq!(participant, "P8");
                assert_eq!(end, start - Duration::days(2));
            }
            other => panic!("expected InvalidPeriod, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_recording() {
        let file: RecordingFile = serde_json::from_str(r#"{ "participant": "P6" }"#).unwrap();
        assert!(matches!(
            file.into_recording(Tz::UTC),
            Err(InputError::Empty(participant)) if participant == "P6"
        ));
    }
}
