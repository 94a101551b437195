//! Per-participant biomarker reports.
//!
//! A report carries L5 and M10 for activity and heart rate, the VMC series
//! over the selected days and a few figures describing the recording. Each
//! marker that could not be computed keeps its error text instead of a time,
//! so one short recording never hides the markers that did work.

use crate::core::{
    compute_vmc_for_days, extremum_time, select_days, BiomarkerError, CircadianConfig,
    DaySelection, Extremum, ExtremumTime, VmcSeries, VmcSummary,
};
use crate::input::Recording;
use crate::series::SeriesView;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "circadian-biomarkers";

/// Which marker a reading holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    L5,
    M10,
}

/// Which signal a marker was computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Acceleration magnitude over the whole recording
    Activity,
    /// Heart rate over the selected days
    HeartRate,
}

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique instance identifier
    pub instance_id: Uuid,
}

/// One L5 or M10 result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtremumReading {
    pub marker: Marker,
    pub signal: Signal,
    /// Averaged midpoint in the recording's zone (RFC3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Wall-clock time of the midpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_time: Option<NaiveTime>,
    /// Number of days that contributed to the average
    pub days_averaged: usize,
    pub window_hours: i64,
    /// Why the marker is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtremumReading {
    fn new(
        marker: Marker,
        signal: Signal,
        window: Duration,
        tz: Tz,
        result: Result<ExtremumTime, BiomarkerError>,
    ) -> Self {
        let mut reading = Self {
            marker,
            signal,
            timestamp: None,
            local_time: None,
            days_averaged: 0,
            window_hours: window.num_hours(),
            error: None,
        };
        match result {
            Ok(found) => {
                reading.timestamp = Some(found.local(tz).to_rfc3339());
                reading.local_time = Some(found.time_of_day(tz));
                reading.days_averaged = found.days;
            }
            Err(e) => reading.error = Some(e.to_string()),
        }
        reading
    }

    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// One VMC bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmcEntry {
    /// Representative timestamp, or bucket start when empty (RFC3339, local)
    pub timestamp: String,
    pub value: Option<f64>,
}

/// VMC series with its summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmcReport {
    pub summary: VmcSummary,
    pub entries: Vec<VmcEntry>,
}

impl VmcReport {
    fn new(vmc: &VmcSeries, tz: Tz) -> Self {
        Self {
            summary: vmc.summary(),
            entries: vmc
                .entries()
                .map(|(key, value)| VmcEntry {
                    timestamp: key.with_timezone(&tz).to_rfc3339(),
                    value,
                })
                .collect(),
        }
    }
}

/// Figures describing the analyzed recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub timezone: Tz,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub magnitude_samples: usize,
    pub heart_rate_samples: usize,
    pub weekdays: usize,
    pub weekend_days: usize,
    pub selection: DaySelection,
}

/// Biomarker report for one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomarkerReport {
    /// Report format version
    pub report_version: String,
    pub participant: String,
    /// When this report was computed (RFC3339)
    pub computed_at_utc: String,
    pub producer: Producer,
    pub recording: RecordingSummary,
    /// L5 and M10 for each signal
    pub readings: Vec<ExtremumReading>,
    /// VMC over the selected days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmc: Option<VmcReport>,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, serde_json::Value>>,
}

impl BiomarkerReport {
    pub fn reading(&self, marker: Marker, signal: Signal) -> Option<&ExtremumReading> {
        self.readings
            .iter()
            .find(|r| r.marker == marker && r.signal == signal)
    }
}

/// Builder for biomarker reports.
pub struct ReportBuilder {
    instance_id: Uuid,
    config: CircadianConfig,
    selection: DaySelection,
}

impl ReportBuilder {
    /// Create a new builder with a unique instance ID.
    pub fn new(config: CircadianConfig) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            config,
            selection: DaySelection::default(),
        }
    }

    /// Set which days feed VMC and the heart-rate markers.
    pub fn with_days(mut self, selection: DaySelection) -> Self {
        self.selection = selection;
        self
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Compute every marker for `recording`.
    ///
    /// Only an empty day selection fails the whole report; per-marker
    /// failures are recorded on the reading.
    pub fn build(&self, recording: &Recording) -> Result<BiomarkerReport, BiomarkerError> {
        let tz = recording.tz;
        let period = &recording.period;
        let partition = period.partition(tz);
        let days = partition.select(self.selection)?;

        let activity = recording.magnitude.view();
        let mut readings = self.readings_for(activity, Signal::Activity);

        match select_days(recording.heart_rate.view(), &days, period.end) {
            Ok(heart_rate) => {
                readings.extend(self.readings_for(heart_rate.view(), Signal::HeartRate))
            }
            Err(e) => {
                warn!(participant = %recording.participant, "heart rate day selection failed: {e}");
                let error = BiomarkerError::from(e);
                for (marker, window) in self.markers() {
                    readings.push(ExtremumReading::new(
                        marker,
                        Signal::HeartRate,
                        window,
                        tz,
                        Err(error.clone()),
                    ));
                }
            }
        }

        let vmc = if activity.is_empty() {
            None
        } else {
            let series = compute_vmc_for_days(activity, &days, period.end);
            Some(VmcReport::new(&series, tz))
        };

        let mut meta = HashMap::new();
        meta.insert(
            "selected_days".to_string(),
            serde_json::json!(days.len()),
        );
        meta.insert(
            "l5_window_hours".to_string(),
            serde_json::json!(self.config.l5_window.num_hours()),
        );
        meta.insert(
            "m10_window_hours".to_string(),
            serde_json::json!(self.config.m10_window.num_hours()),
        );

        Ok(BiomarkerReport {
            report_version: REPORT_VERSION.to_string(),
            participant: recording.participant.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: self.instance_id,
            },
            recording: RecordingSummary {
                timezone: tz,
                start: period.start,
                end: period.end,
                magnitude_samples: recording.magnitude.len(),
                heart_rate_samples: recording.heart_rate.len(),
                weekdays: partition.weekdays.len(),
                weekend_days: partition.weekends.len(),
                selection: self.selection,
            },
            readings,
            vmc,
            meta: Some(meta),
        })
    }

    /// Build and serialize a report to JSON.
    pub fn build_json(&self, recording: &Recording) -> Result<String, BiomarkerError> {
        let report = self.build(recording)?;
        Ok(serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string()))
    }

    fn markers(&self) -> [(Marker, Duration); 2] {
        [
            (Marker::L5, self.config.l5_window),
            (Marker::M10, self.config.m10_window),
        ]
    }

    fn readings_for(&self, series: SeriesView<'_>, signal: Signal) -> Vec<ExtremumReading> {
        self.markers()
            .into_iter()
            .map(|(marker, window)| {
                let extremum = match marker {
                    Marker::L5 => Extremum::Min,
                    Marker::M10 => Extremum::Max,
                };
                ExtremumReading::new(
                    marker,
                    signal,
                    window,
                    series.tz(),
                    extremum_time(series, window, extremum),
                )
            })
            .collect()
    }
}

/// File name for a participant's report.
///
/// Only ASCII letters, digits, `-` and `_` survive; anything else becomes
/// `_`, so the name never leaves the export directory.
pub fn report_file_name(participant: &str) -> String {
    let stem: String = participant
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.trim_matches('_').is_empty() {
        "recording".to_string()
    } else {
        stem
    };
    format!("{stem}_biomarkers.json")
}

/// Report file names handed out during one batch.
///
/// A participant seen twice gets `_2`, `_3`, ... appended instead of
/// overwriting the earlier report.
#[derive(Debug, Default)]
pub struct ReportNames {
    taken: Mutex<HashSet<String>>,
}

impl ReportNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a file name for `participant`.
    pub fn claim(&self, participant: &str) -> String {
        let base = report_file_name(participant);
        let mut taken = match self.taken.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if taken.insert(base.clone()) {
            return base;
        }

        let stem = base.trim_end_matches(".json");
        let mut n = 2;
        loop {
            let candidate = format!("{stem}_{n}.json");
            if taken.insert(candidate.clone()) {
                warn!(participant, file = %candidate, "participant already reported in this run");
                return candidate;
            }
            n += 1;
        }
    }
}
